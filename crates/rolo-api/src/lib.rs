//! JSON REST API for Rolo.
//!
//! Exposes an axum [`Router`] backed by any store implementing the Rolo
//! storage traits. Every protected handler receives the authenticated
//! identity through the [`auth::Authenticated`] extractor and passes it
//! explicitly to the service it calls.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;

use std::{net::IpAddr, sync::Arc, time::Duration};

use axum::{
  Router,
  extract::{FromRequest, FromRequestParts},
  routing::{get, post, put},
};
use rolo_auth::{ConfigError, IdentityAdmin, SessionFlow, TokenService};
use rolo_core::{
  contacts::ContactService,
  store::{ActivityStore, ContactStore, CredentialStore},
};
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use error::ApiError;

/// Everything a store must implement to back the API.
pub trait RoloStore: CredentialStore + ContactStore + ActivityStore + 'static {}

impl<T> RoloStore for T where T: CredentialStore + ContactStore + ActivityStore + 'static {}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub sessions:        Arc<SessionFlow<S>>,
  pub contacts:        ContactService<S>,
  pub admin:           Arc<IdentityAdmin<S>>,
  /// Proxies allowed to report the client address in forwarding headers.
  pub trusted_proxies: Arc<[IpAddr]>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      sessions:        self.sessions.clone(),
      contacts:        self.contacts.clone(),
      admin:           self.admin.clone(),
      trusted_proxies: self.trusted_proxies.clone(),
    }
  }
}

impl<S: RoloStore> AppState<S> {
  pub fn new(store: Arc<S>, sessions: SessionFlow<S>, timeout: Duration) -> Self {
    Self {
      sessions:        Arc::new(sessions.with_timeout(timeout)),
      contacts:        ContactService::new(store.clone()).with_timeout(timeout),
      admin:           Arc::new(IdentityAdmin::new(store).with_timeout(timeout)),
      trusted_proxies: Arc::from([]),
    }
  }

  pub fn with_trusted_proxies(mut self, proxies: impl IntoIterator<Item = IpAddr>) -> Self {
    self.trusted_proxies = proxies.into_iter().collect();
    self
  }

  /// Build the state from server configuration, validating the token
  /// secrets.
  pub fn from_config(store: Arc<S>, config: &ServerConfig) -> Result<Self, ConfigError> {
    let tokens = TokenService::new(&config.token_config())?;
    let sessions =
      SessionFlow::new(store.clone(), tokens).with_throttle(config.throttle_policy());
    Ok(
      Self::new(store, sessions, config.storage_timeout())
        .with_trusted_proxies(config.trusted_proxies.iter().copied()),
    )
  }
}

// ─── Extractors ───────────────────────────────────────────────────────────────

/// `axum::Json` whose rejection is an [`ApiError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// `axum::extract::Query` whose rejection is an [`ApiError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

/// `axum::extract::Path` whose rejection is an [`ApiError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParam<T>(pub T);

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router.
pub fn router<S: RoloStore>(state: AppState<S>) -> Router {
  use handlers::{activities, admin, auth, contacts, health};

  Router::new()
    .route("/health", get(health::handler))
    // Session
    .route("/auth/signup",  post(auth::signup::<S>))
    .route("/auth/login",   post(auth::login::<S>))
    .route("/auth/refresh", post(auth::refresh::<S>))
    .route("/auth/logout",  post(auth::logout::<S>))
    .route("/auth/me",      get(auth::me))
    // Contacts
    .route("/contacts", get(contacts::list::<S>).post(contacts::create::<S>))
    .route(
      "/contacts/{id}",
      get(contacts::get_one::<S>)
        .put(contacts::update::<S>)
        .delete(contacts::delete_one::<S>),
    )
    // Activity log
    .route("/activities", get(activities::list::<S>))
    // Administration
    .route("/admin/identities/{id}/role",       put(admin::set_role::<S>))
    .route("/admin/identities/{id}/deactivate", post(admin::deactivate::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests;
