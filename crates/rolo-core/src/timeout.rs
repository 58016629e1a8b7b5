//! Deadline for storage calls.

use std::{future::Future, time::Duration};

use crate::{Error, Result};

/// Default deadline applied to a single storage call.
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Await a storage future, converting its error into [`Error`] and turning an
/// overrun of `limit` into [`Error::Unavailable`].
pub async fn bounded<T, E, F>(limit: Duration, fut: F) -> Result<T>
where
  F: Future<Output = Result<T, E>>,
  E: Into<Error>,
{
  match tokio::time::timeout(limit, fut).await {
    Ok(result) => result.map_err(Into::into),
    Err(_) => Err(overrun(limit)),
  }
}

/// Run `fut` as its own task and wait at most `limit` for it.
///
/// Unlike [`bounded`], an overrun only abandons the wait. The task runs to
/// completion, so work that must not be split (a write and its audit
/// record) either happens entirely or not at all.
pub async fn detached<T, F>(limit: Duration, fut: F) -> Result<T>
where
  F: Future<Output = Result<T>> + Send + 'static,
  T: Send + 'static,
{
  match tokio::time::timeout(limit, tokio::spawn(fut)).await {
    Ok(Ok(result)) => result,
    Ok(Err(e)) => Err(Error::Internal(format!("storage task failed: {e}"))),
    Err(_) => Err(overrun(limit)),
  }
}

fn overrun(limit: Duration) -> Error {
  Error::Unavailable(format!("storage did not respond within {}ms", limit.as_millis()))
}
