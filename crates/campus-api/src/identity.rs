//! Caller identity extractors.
//!
//! Authentication happens upstream; by the time a request reaches this router
//! an authenticating proxy has put the verified user id into a header
//! (`x-user-id` unless configured otherwise).

use axum::{
  extract::FromRequestParts,
  http::{HeaderName, request::Parts},
};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

pub const DEFAULT_IDENTITY_HEADER: &str = "x-user-id";

/// The verified caller. Rejects with 401 when the header is missing or is not
/// a UUID.
pub struct CurrentUser(pub Uuid);

/// The caller if identified, otherwise anonymous. A malformed header counts
/// as anonymous.
pub struct MaybeUser(pub Option<Uuid>);

fn read_identity(parts: &Parts, header: &HeaderName) -> Option<Uuid> {
  parts
    .headers
    .get(header)
    .and_then(|v| v.to_str().ok())
    .and_then(|s| Uuid::parse_str(s.trim()).ok())
}

impl<S> FromRequestParts<ApiState<S>> for CurrentUser
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    read_identity(parts, &state.identity_header)
      .map(CurrentUser)
      .ok_or(ApiError::Unauthorized)
  }
}

impl<S> FromRequestParts<ApiState<S>> for MaybeUser
where
  S: Send + Sync,
{
  type Rejection = std::convert::Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    Ok(MaybeUser(read_identity(parts, &state.identity_header)))
  }
}
