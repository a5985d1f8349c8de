//! Error types for `campus-core`.

use thiserror::Error;

use crate::vote::TargetRef;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0} not found")]
  NotFound(TargetRef),

  #[error("invalid input: {0}")]
  InvalidInput(String),

  #[error("conflict: {0}")]
  Conflict(String),

  /// The per-user uniqueness constraint kept rejecting inserts for this
  /// target and the retry budget ran out.
  #[error("gave up after repeated vote conflicts on {0}")]
  Contention(TargetRef),

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn storage<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Storage(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
