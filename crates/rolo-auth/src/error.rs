//! Error types for `rolo-auth`.

use thiserror::Error;

/// Why a token failed verification. Deliberately coarse: callers only ever
/// learn whether the token is past its expiry or unusable for any other
/// reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
  #[error("token expired")]
  Expired,

  #[error("invalid token")]
  Invalid,
}

/// A [`TokenConfig`](crate::token::TokenConfig) that cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
  #[error("{0} token secret must not be empty")]
  EmptySecret(&'static str),

  #[error("access and refresh token secrets must differ")]
  SharedSecret,

  #[error("{0} token lifetime must be at least one second")]
  ZeroTtl(&'static str),
}
