//! `GET /activities?page&limit`: the caller's visible slice of the activity
//! log, newest first.

use axum::{Json, extract::State};
use rolo_core::{activity::ActivityRecord, page::Page};
use serde::Deserialize;

use crate::{AppState, QueryParams, RoloStore, auth::Authenticated, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub page:  Option<u32>,
  pub limit: Option<u32>,
}

pub async fn list<S: RoloStore>(
  State(state): State<AppState<S>>,
  Authenticated(identity): Authenticated,
  QueryParams(params): QueryParams<ListParams>,
) -> Result<Json<Page<ActivityRecord>>, ApiError> {
  let page = state
    .contacts
    .audit()
    .list(&identity, params.page, params.limit)
    .await?;
  Ok(Json(page))
}
