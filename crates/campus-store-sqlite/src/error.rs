//! Error type for `campus-store-sqlite`.

use campus_core::vote::TargetRef;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] campus_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column held a value outside its domain (bad enum text, negative
  /// counter).
  #[error("decode error: {0}")]
  Decode(String),

  #[error("{0} not found")]
  NotFound(TargetRef),

  #[error("conflict: {0}")]
  Conflict(String),
}

impl From<Error> for campus_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::Core(e) => e,
      Error::NotFound(target) => campus_core::Error::NotFound(target),
      Error::Conflict(msg) => campus_core::Error::Conflict(msg),
      other => campus_core::Error::storage(other),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
