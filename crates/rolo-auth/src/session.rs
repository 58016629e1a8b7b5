//! Session flow: signup, login, refresh, logout and bearer authentication.
//!
//! An identity holds at most one live refresh token. Every signup, login and
//! refresh replaces it; logout clears it. The store keeps only the token's
//! digest, and rotation goes through the store's compare-and-set so that two
//! concurrent refreshes presenting the same token cannot both succeed.

use std::{
  sync::{Arc, OnceLock},
  time::Duration,
};

use chrono::Utc;
use rolo_core::{
  Error, Result,
  identity::{Identity, NewIdentity, Role, normalize_email},
  store::CredentialStore,
  timeout::{DEFAULT_STORAGE_TIMEOUT, bounded},
  validate,
};
use serde::Serialize;

use crate::{
  error::TokenError,
  password::{Argon2Scheme, PasswordScheme},
  throttle::{LoginThrottle, ThrottlePolicy},
  token::{TokenPair, TokenService, digest},
};

const BAD_CREDENTIALS: &str = "invalid email or password";
const INVALID_REFRESH: &str = "invalid refresh token";
const DUMMY_PASSWORD: &str = "rolo-no-such-identity";

/// An authenticated identity together with the tokens just issued to it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
  pub identity: Identity,
  #[serde(flatten)]
  pub tokens:   TokenPair,
}

pub struct SessionFlow<S> {
  store:     Arc<S>,
  tokens:    TokenService,
  passwords: Arc<dyn PasswordScheme>,
  throttle:  LoginThrottle,
  timeout:   Duration,
  /// Hash checked against when the login email is unknown, so that both
  /// failure paths pay for one password verification.
  dummy:     OnceLock<String>,
}

impl<S: CredentialStore> SessionFlow<S> {
  pub fn new(store: Arc<S>, tokens: TokenService) -> Self {
    Self {
      store,
      tokens,
      passwords: Arc::new(Argon2Scheme::default()),
      throttle: LoginThrottle::new(ThrottlePolicy::default()),
      timeout: DEFAULT_STORAGE_TIMEOUT,
      dummy: OnceLock::new(),
    }
  }

  pub fn with_passwords(mut self, scheme: impl PasswordScheme + 'static) -> Self {
    self.passwords = Arc::new(scheme);
    self.dummy = OnceLock::new();
    self
  }

  pub fn with_throttle(mut self, policy: ThrottlePolicy) -> Self {
    self.throttle = LoginThrottle::new(policy);
    self
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn tokens(&self) -> &TokenService { &self.tokens }

  /// Register a new identity and open its first session. The role is always
  /// [`Role::User`].
  pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<Session> {
    validate::identity_name(name)?;
    validate::email(email)?;
    validate::password(password)?;
    let email = normalize_email(email);

    let existing =
      bounded(self.timeout, self.store.find_identity_by_email(email.clone())).await?;
    if existing.is_some() {
      return Err(Error::Conflict("email already registered".into()));
    }

    let password_hash = self.passwords.hash(password)?;
    let identity = bounded(
      self.timeout,
      self.store.create_identity(NewIdentity {
        name: name.trim().to_owned(),
        email,
        password_hash,
        role: Role::User,
      }),
    )
    .await?;

    let session = self.open_session(identity).await?;
    tracing::info!(identity_id = %session.identity.id, "identity signed up");
    Ok(session)
  }

  /// Check credentials and open a new session, replacing any previous
  /// refresh token.
  ///
  /// Failures are counted both against `client` (the caller's network
  /// address, when known) and against the email being tried. Either counter
  /// reaching the limit rejects the attempt before the store is consulted.
  pub async fn login(
    &self,
    client: Option<&str>,
    email: &str,
    password: &str,
  ) -> Result<Session> {
    let email = normalize_email(email);
    let keys = throttle_keys(client, &email);
    for key in &keys {
      if let Err(e) = self.throttle.check(key) {
        tracing::warn!(key, "login throttled");
        return Err(e);
      }
    }

    let found = bounded(self.timeout, self.store.find_identity_by_email(email)).await?;

    let verified = match found {
      Some(identity) => self
        .passwords
        .verify(password, &identity.password_hash)
        .then_some(identity),
      None => {
        self.passwords.verify(password, self.dummy_hash());
        None
      }
    };
    let Some(identity) = verified else {
      keys.iter().for_each(|key| self.throttle.record_failure(key));
      return Err(Error::unauthorized(BAD_CREDENTIALS));
    };

    if !identity.is_active {
      keys.iter().for_each(|key| self.throttle.record_failure(key));
      return Err(Error::Forbidden("account deactivated".into()));
    }

    let now = Utc::now();
    bounded(self.timeout, self.store.touch_last_login(identity.id, now)).await?;
    let mut session = self.open_session(identity).await?;
    session.identity.last_login = Some(now);

    tracing::info!(identity_id = %session.identity.id, "identity logged in");
    Ok(session)
  }

  /// Exchange the current refresh token for a new pair.
  ///
  /// The presented token must verify and must be the one currently stored for
  /// its subject; a rotated-out token is rejected like any other invalid one.
  pub async fn refresh(&self, token: Option<&str>) -> Result<TokenPair> {
    let token = token
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .ok_or_else(|| Error::unauthorized("refresh token required"))?;

    let subject = self.tokens.verify_refresh_token(token).map_err(|e| match e {
      TokenError::Expired => Error::unauthorized("refresh token expired, please log in again"),
      TokenError::Invalid => Error::unauthorized(INVALID_REFRESH),
    })?;

    let identity = bounded(self.timeout, self.store.find_identity(subject))
      .await?
      .filter(|i| i.is_active)
      .ok_or_else(|| Error::unauthorized(INVALID_REFRESH))?;

    let presented = digest(token);
    if identity.refresh_token_hash.as_deref() != Some(presented.as_str()) {
      tracing::warn!(identity_id = %identity.id, "stale refresh token presented");
      return Err(Error::unauthorized(INVALID_REFRESH));
    }

    let pair = self.tokens.issue_pair(identity.id, identity.role)?;
    let rotated = bounded(
      self.timeout,
      self
        .store
        .swap_refresh_token(identity.id, presented, digest(&pair.refresh_token)),
    )
    .await?;
    if !rotated {
      tracing::warn!(identity_id = %identity.id, "refresh token rotated concurrently");
      return Err(Error::unauthorized(INVALID_REFRESH));
    }

    Ok(pair)
  }

  /// Revoke the identity's refresh token. Calling it again is harmless.
  pub async fn logout(&self, identity: &Identity) -> Result<()> {
    bounded(self.timeout, self.store.set_refresh_token(identity.id, None)).await?;
    tracing::info!(identity_id = %identity.id, "identity logged out");
    Ok(())
  }

  /// Resolve a bearer access token to a live, active identity.
  ///
  /// The identity is re-read from the store on every call, so deactivation
  /// takes effect immediately even while the token is still unexpired.
  pub async fn authenticate(&self, bearer: Option<&str>) -> Result<Identity> {
    let token = bearer
      .filter(|t| !t.is_empty())
      .ok_or_else(|| Error::unauthorized("access denied, no token provided"))?;

    let claim = self.tokens.verify_access_token(token).map_err(|e| match e {
      TokenError::Expired => Error::unauthorized("token expired, please refresh"),
      TokenError::Invalid => Error::unauthorized("invalid token"),
    })?;

    bounded(self.timeout, self.store.find_identity(claim.subject_id))
      .await?
      .filter(|i| i.is_active)
      .ok_or_else(|| Error::unauthorized("identity not found or deactivated"))
  }

  fn dummy_hash(&self) -> &str {
    self.dummy.get_or_init(|| {
      self.passwords.hash(DUMMY_PASSWORD).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to prepare dummy password hash");
        String::new()
      })
    })
  }

  async fn open_session(&self, mut identity: Identity) -> Result<Session> {
    let tokens = self.tokens.issue_pair(identity.id, identity.role)?;
    let token_hash = digest(&tokens.refresh_token);
    bounded(
      self.timeout,
      self.store.set_refresh_token(identity.id, Some(token_hash.clone())),
    )
    .await?;
    identity.refresh_token_hash = Some(token_hash);
    Ok(Session { identity, tokens })
  }
}

fn throttle_keys(client: Option<&str>, email: &str) -> Vec<String> {
  client
    .map(|c| format!("client:{c}"))
    .into_iter()
    .chain(std::iter::once(format!("email:{email}")))
    .collect()
}
