//! Token service: mints and verifies access and refresh tokens.
//!
//! Both kinds are HS256 JWTs. They are signed with different secrets, so a
//! refresh token never verifies as an access token or the other way round.
//! Access tokens are verified statelessly. Refresh tokens are additionally
//! checked against the single digest the credential store keeps per identity.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{
  Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind,
};
use rolo_core::{Error, Result, identity::Role};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{ConfigError, TokenError};

/// Default access-token lifetime: 15 minutes.
pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(15 * 60);

/// Default refresh-token lifetime: 7 days.
pub const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

// ─── Claims ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TokenKind {
  Access,
  Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
  sub:  Uuid,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  role: Option<Role>,
  typ:  TokenKind,
  iat:  i64,
  exp:  i64,
  /// Makes every token unique, even two minted for the same identity within
  /// the same second.
  jti:  Uuid,
}

/// The verified contents of an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessClaim {
  pub subject_id: Uuid,
  pub role:       Role,
  pub issued_at:  DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

/// A freshly minted access/refresh pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
  pub access_token:  String,
  pub refresh_token: String,
}

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct TokenConfig {
  pub access_secret:  String,
  pub refresh_secret: String,
  pub access_ttl:     Duration,
  pub refresh_ttl:    Duration,
}

impl TokenConfig {
  /// A config with the default lifetimes.
  pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
    Self {
      access_secret:  access_secret.into(),
      refresh_secret: refresh_secret.into(),
      access_ttl:     DEFAULT_ACCESS_TTL,
      refresh_ttl:    DEFAULT_REFRESH_TTL,
    }
  }
}

// ─── Service ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
struct Keys {
  encoding: EncodingKey,
  decoding: DecodingKey,
}

impl Keys {
  fn from_secret(secret: &str) -> Self {
    Self {
      encoding: EncodingKey::from_secret(secret.as_bytes()),
      decoding: DecodingKey::from_secret(secret.as_bytes()),
    }
  }
}

#[derive(Clone)]
pub struct TokenService {
  access:      Keys,
  refresh:     Keys,
  access_ttl:  i64,
  refresh_ttl: i64,
  validation:  Validation,
}

impl TokenService {
  pub fn new(config: &TokenConfig) -> Result<Self, ConfigError> {
    if config.access_secret.is_empty() {
      return Err(ConfigError::EmptySecret("access"));
    }
    if config.refresh_secret.is_empty() {
      return Err(ConfigError::EmptySecret("refresh"));
    }
    if config.access_secret == config.refresh_secret {
      return Err(ConfigError::SharedSecret);
    }
    let access_ttl = whole_seconds(config.access_ttl).ok_or(ConfigError::ZeroTtl("access"))?;
    let refresh_ttl =
      whole_seconds(config.refresh_ttl).ok_or(ConfigError::ZeroTtl("refresh"))?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub", "iat"]);

    Ok(Self {
      access: Keys::from_secret(&config.access_secret),
      refresh: Keys::from_secret(&config.refresh_secret),
      access_ttl,
      refresh_ttl,
      validation,
    })
  }

  pub fn issue_access_token(&self, identity_id: Uuid, role: Role) -> Result<String> {
    self.sign(TokenKind::Access, identity_id, Some(role), self.access_ttl)
  }

  pub fn issue_refresh_token(&self, identity_id: Uuid) -> Result<String> {
    self.sign(TokenKind::Refresh, identity_id, None, self.refresh_ttl)
  }

  pub fn issue_pair(&self, identity_id: Uuid, role: Role) -> Result<TokenPair> {
    Ok(TokenPair {
      access_token:  self.issue_access_token(identity_id, role)?,
      refresh_token: self.issue_refresh_token(identity_id)?,
    })
  }

  pub fn verify_access_token(&self, token: &str) -> Result<AccessClaim, TokenError> {
    let claims = self.verify(token, TokenKind::Access)?;
    Ok(AccessClaim {
      subject_id: claims.sub,
      role:       claims.role.ok_or(TokenError::Invalid)?,
      issued_at:  timestamp(claims.iat)?,
      expires_at: timestamp(claims.exp)?,
    })
  }

  /// Verify a refresh token's signature and expiry, returning its subject.
  ///
  /// This does not check the token against the stored digest; that is the
  /// session flow's job.
  pub fn verify_refresh_token(&self, token: &str) -> Result<Uuid, TokenError> {
    Ok(self.verify(token, TokenKind::Refresh)?.sub)
  }

  fn keys(&self, kind: TokenKind) -> &Keys {
    match kind {
      TokenKind::Access => &self.access,
      TokenKind::Refresh => &self.refresh,
    }
  }

  fn sign(&self, kind: TokenKind, sub: Uuid, role: Option<Role>, ttl: i64) -> Result<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
      sub,
      role,
      typ: kind,
      iat: now,
      exp: now + ttl,
      jti: Uuid::new_v4(),
    };
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.keys(kind).encoding)
      .map_err(|e| Error::Internal(format!("token signing failed: {e}")))
  }

  fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
    let data =
      jsonwebtoken::decode::<Claims>(token, &self.keys(kind).decoding, &self.validation)
        .map_err(|e| match e.kind() {
          ErrorKind::ExpiredSignature => TokenError::Expired,
          _ => TokenError::Invalid,
        })?;
    if data.claims.typ != kind {
      return Err(TokenError::Invalid);
    }
    Ok(data.claims)
  }

  /// Mint a refresh token with an arbitrary lifetime, including a negative
  /// one.
  #[cfg(test)]
  pub(crate) fn refresh_token_with_ttl(&self, identity_id: Uuid, ttl_secs: i64) -> String {
    self
      .sign(TokenKind::Refresh, identity_id, None, ttl_secs)
      .expect("signing")
  }
}

/// SHA-256 hex digest of a token, the form refresh tokens are stored in.
pub fn digest(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

fn whole_seconds(ttl: Duration) -> Option<i64> {
  i64::try_from(ttl.as_secs()).ok().filter(|s| *s > 0)
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, TokenError> {
  DateTime::from_timestamp(secs, 0).ok_or(TokenError::Invalid)
}
