//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error body has the shape `{"error": <message>, "kind": <kind>}`.
//! Internal and storage failures are logged in full and answered with a
//! generic message.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use rolo_core::ErrorKind;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] rolo_core::Error),

  /// The request could not be parsed at all.
  #[error("bad request: {0}")]
  BadRequest(String),
}

impl From<JsonRejection> for ApiError {
  fn from(r: JsonRejection) -> Self { Self::BadRequest(r.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(r: QueryRejection) -> Self { Self::BadRequest(r.body_text()) }
}

/// Path segments are resource ids; one that does not parse names nothing.
impl From<PathRejection> for ApiError {
  fn from(r: PathRejection) -> Self {
    tracing::debug!(rejection = %r.body_text(), "unparseable path parameter");
    Self::Core(rolo_core::Error::not_found("resource not found"))
  }
}

fn status_for(kind: ErrorKind) -> StatusCode {
  match kind {
    ErrorKind::Conflict => StatusCode::CONFLICT,
    ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
    ErrorKind::Forbidden => StatusCode::FORBIDDEN,
    ErrorKind::NotFound => StatusCode::NOT_FOUND,
    ErrorKind::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
    ErrorKind::Invalid => StatusCode::UNPROCESSABLE_ENTITY,
    ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, kind, message) = match self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, "bad_request", m),
      ApiError::Core(e) => {
        let kind = e.kind();
        let message = match kind {
          ErrorKind::Internal => {
            tracing::error!(error = %e, "internal error");
            "internal server error".to_string()
          }
          ErrorKind::Unavailable => {
            tracing::error!(error = %e, "storage unavailable");
            "service temporarily unavailable".to_string()
          }
          _ => e.to_string(),
        };
        (status_for(kind), kind.into(), message)
      }
    };
    (status, Json(json!({ "error": message, "kind": kind }))).into_response()
  }
}
