//! Handler errors, rendered as `{"error": "<message>"}` with a matching
//! status code.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Everything a handler can fail with. Core errors convert via `From`.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("unauthorized")]
  Unauthorized,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<campus_core::Error> for ApiError {
  fn from(err: campus_core::Error) -> Self {
    use campus_core::Error as E;
    match err {
      E::NotFound(target) => ApiError::NotFound(format!("{target} not found")),
      E::InvalidInput(m) => ApiError::BadRequest(m),
      E::Conflict(m) => ApiError::Conflict(m),
      E::Storage(e) => ApiError::Store(e),
      contention @ E::Contention(_) => ApiError::Store(Box::new(contention)),
    }
  }
}

impl ApiError {
  /// Convert a content-store error, keeping its not-found / conflict meaning.
  pub fn content<E: Into<campus_core::Error>>(err: E) -> Self {
    ApiError::from(err.into())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Unauthorized => {
        (StatusCode::UNAUTHORIZED, "authentication required".to_owned())
      }
      ApiError::Store(e) => {
        // Internals stay in the log; the caller learns nothing about whether
        // the write happened.
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, "server error".to_owned())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
