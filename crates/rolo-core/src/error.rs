//! Error types for `rolo-core`.
//!
//! Every failure the service reports to a caller is one of the variants
//! below. The [`ErrorKind`] name is stable and forms part of the API
//! contract; the message is human-readable and may change.

use strum::{Display, IntoStaticStr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0}")]
  Conflict(String),

  #[error("{0}")]
  Unauthorized(String),

  #[error("{0}")]
  Forbidden(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  TooManyRequests(String),

  #[error("{0}")]
  Invalid(String),

  #[error("storage unavailable: {0}")]
  Unavailable(String),

  #[error("internal error: {0}")]
  Internal(String),
}

/// The stable classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
  Conflict,
  Unauthorized,
  Forbidden,
  NotFound,
  TooManyRequests,
  Invalid,
  Unavailable,
  Internal,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Conflict(_) => ErrorKind::Conflict,
      Self::Unauthorized(_) => ErrorKind::Unauthorized,
      Self::Forbidden(_) => ErrorKind::Forbidden,
      Self::NotFound(_) => ErrorKind::NotFound,
      Self::TooManyRequests(_) => ErrorKind::TooManyRequests,
      Self::Invalid(_) => ErrorKind::Invalid,
      Self::Unavailable(_) => ErrorKind::Unavailable,
      Self::Internal(_) => ErrorKind::Internal,
    }
  }

  pub fn unauthorized(msg: impl Into<String>) -> Self {
    Self::Unauthorized(msg.into())
  }

  pub fn not_found(msg: impl Into<String>) -> Self { Self::NotFound(msg.into()) }

  pub fn invalid(msg: impl Into<String>) -> Self { Self::Invalid(msg.into()) }
}

impl From<serde_json::Error> for Error {
  fn from(e: serde_json::Error) -> Self { Self::Internal(format!("json: {e}")) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
