//! Handlers for `/auth` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/signup`  | Body: `{"name","email","password"}`; returns 201 + session |
//! | `POST` | `/auth/login`   | Body: `{"email","password"}`; throttled per client and per email |
//! | `POST` | `/auth/refresh` | Body: `{"refreshToken"}`; returns a new token pair |
//! | `POST` | `/auth/logout`  | Bearer; revokes the refresh token |
//! | `GET`  | `/auth/me`      | Bearer; returns `{"identity"}` |

use axum::{Json, extract::State, http::{HeaderMap, StatusCode}, response::IntoResponse};
use rolo_auth::{Session, TokenPair};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  AppState, JsonBody, RoloStore,
  auth::{Authenticated, PeerAddr, client_key},
  error::ApiError,
};

// ─── Signup ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignupBody {
  pub name:     String,
  pub email:    String,
  pub password: String,
}

/// `POST /auth/signup`. Any client-supplied role is ignored.
pub async fn signup<S: RoloStore>(
  State(state): State<AppState<S>>,
  JsonBody(body): JsonBody<SignupBody>,
) -> Result<impl IntoResponse, ApiError> {
  let session = state
    .sessions
    .signup(&body.name, &body.email, &body.password)
    .await?;
  Ok((StatusCode::CREATED, Json(session)))
}

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

/// `POST /auth/login`
pub async fn login<S: RoloStore>(
  State(state): State<AppState<S>>,
  PeerAddr(peer): PeerAddr,
  headers: HeaderMap,
  JsonBody(body): JsonBody<LoginBody>,
) -> Result<Json<Session>, ApiError> {
  let client = client_key(peer, &headers, &state.trusted_proxies);
  let session = state
    .sessions
    .login(client.as_deref(), &body.email, &body.password)
    .await?;
  Ok(Json(session))
}

// ─── Refresh ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshBody {
  pub refresh_token: Option<String>,
}

/// `POST /auth/refresh`
pub async fn refresh<S: RoloStore>(
  State(state): State<AppState<S>>,
  JsonBody(body): JsonBody<RefreshBody>,
) -> Result<Json<TokenPair>, ApiError> {
  let pair = state.sessions.refresh(body.refresh_token.as_deref()).await?;
  Ok(Json(pair))
}

// ─── Logout / me ──────────────────────────────────────────────────────────────

/// `POST /auth/logout`
pub async fn logout<S: RoloStore>(
  State(state): State<AppState<S>>,
  Authenticated(identity): Authenticated,
) -> Result<Json<Value>, ApiError> {
  state.sessions.logout(&identity).await?;
  Ok(Json(json!({})))
}

/// `GET /auth/me`
pub async fn me(Authenticated(identity): Authenticated) -> Json<Value> {
  Json(json!({ "identity": identity }))
}
