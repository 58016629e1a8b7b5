//! Handlers for `/admin` endpoints. Both require the admin role; the check
//! lives in [`rolo_auth::IdentityAdmin`], not here.

use axum::{Json, extract::State};
use rolo_core::identity::{Identity, Role};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, JsonBody, PathParam, RoloStore, auth::Authenticated, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct RoleBody {
  pub role: Role,
}

/// `PUT /admin/identities/{id}/role`, body `{"role":"admin"}`
pub async fn set_role<S: RoloStore>(
  State(state): State<AppState<S>>,
  Authenticated(actor): Authenticated,
  PathParam(id): PathParam<Uuid>,
  JsonBody(body): JsonBody<RoleBody>,
) -> Result<Json<Identity>, ApiError> {
  Ok(Json(state.admin.set_role(&actor, id, body.role).await?))
}

/// `POST /admin/identities/{id}/deactivate`
pub async fn deactivate<S: RoloStore>(
  State(state): State<AppState<S>>,
  Authenticated(actor): Authenticated,
  PathParam(id): PathParam<Uuid>,
) -> Result<Json<Identity>, ApiError> {
  Ok(Json(state.admin.deactivate(&actor, id).await?))
}
