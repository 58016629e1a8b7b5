//! Error type for `rolo-store-sqlite`.

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unrecognised column value: {0}")]
  Decode(String),

  #[error("email already registered: {0}")]
  EmailTaken(String),
}

impl Error {
  /// Whether the failure means the database could not be reached at all, as
  /// opposed to a bad query or bad data.
  pub fn is_unavailable(&self) -> bool {
    match self {
      Self::Database(tokio_rusqlite::Error::ConnectionClosed) => true,
      Self::Database(tokio_rusqlite::Error::Rusqlite(
        rusqlite::Error::SqliteFailure(failure, _),
      )) => matches!(
        failure.code,
        ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::CannotOpen
      ),
      _ => false,
    }
  }
}

impl From<Error> for rolo_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::EmailTaken(_) => Self::Conflict("email already registered".into()),
      e if e.is_unavailable() => Self::Unavailable(e.to_string()),
      e => Self::Internal(e.to_string()),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
