//! Handlers for `/contacts` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/contacts` | `?page&limit&search&status&sortBy&order` |
//! | `POST`   | `/contacts` | Body: [`NewContact`]; returns 201 + contact |
//! | `GET`    | `/contacts/{id}` | 404 if missing or not visible |
//! | `PUT`    | `/contacts/{id}` | Body: [`ContactPatch`]; partial update |
//! | `DELETE` | `/contacts/{id}` | 204 |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use rolo_core::{
  contact::{Contact, ContactPatch, ContactQuery, ContactStatus, NewContact, SortField, SortOrder},
  contacts::DEFAULT_CONTACT_LIMIT,
  page::Page,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState, JsonBody, PathParam, QueryParams, RoloStore, auth::Authenticated,
  error::ApiError,
};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  pub page:    Option<u32>,
  pub limit:   Option<u32>,
  /// Substring of the name or email.
  pub search:  Option<String>,
  pub status:  Option<ContactStatus>,
  pub sort_by: Option<SortField>,
  pub order:   Option<SortOrder>,
}

impl From<ListParams> for ContactQuery {
  fn from(p: ListParams) -> Self {
    Self {
      owner:  None,
      text:   p.search,
      status: p.status,
      sort:   p.sort_by.unwrap_or_default(),
      order:  p.order.unwrap_or_default(),
      page:   p.page.unwrap_or(1),
      limit:  p.limit.unwrap_or(DEFAULT_CONTACT_LIMIT),
    }
  }
}

/// `GET /contacts`
pub async fn list<S: RoloStore>(
  State(state): State<AppState<S>>,
  Authenticated(identity): Authenticated,
  QueryParams(params): QueryParams<ListParams>,
) -> Result<Json<Page<Contact>>, ApiError> {
  let page = state.contacts.list(&identity, params.into()).await?;
  Ok(Json(page))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /contacts`
pub async fn create<S: RoloStore>(
  State(state): State<AppState<S>>,
  Authenticated(identity): Authenticated,
  JsonBody(body): JsonBody<NewContact>,
) -> Result<impl IntoResponse, ApiError> {
  let contact = state.contacts.create(&identity, body).await?;
  Ok((StatusCode::CREATED, Json(contact)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /contacts/{id}`
pub async fn get_one<S: RoloStore>(
  State(state): State<AppState<S>>,
  Authenticated(identity): Authenticated,
  PathParam(id): PathParam<Uuid>,
) -> Result<Json<Contact>, ApiError> {
  Ok(Json(state.contacts.get(&identity, id).await?))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /contacts/{id}`
pub async fn update<S: RoloStore>(
  State(state): State<AppState<S>>,
  Authenticated(identity): Authenticated,
  PathParam(id): PathParam<Uuid>,
  JsonBody(patch): JsonBody<ContactPatch>,
) -> Result<Json<Contact>, ApiError> {
  Ok(Json(state.contacts.update(&identity, id, patch).await?))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /contacts/{id}`
pub async fn delete_one<S: RoloStore>(
  State(state): State<AppState<S>>,
  Authenticated(identity): Authenticated,
  PathParam(id): PathParam<Uuid>,
) -> Result<StatusCode, ApiError> {
  state.contacts.delete(&identity, id).await?;
  Ok(StatusCode::NO_CONTENT)
}
