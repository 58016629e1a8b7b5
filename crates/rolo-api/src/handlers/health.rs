//! `GET /health`

use axum::Json;
use chrono::Utc;
use serde_json::{Value, json};

pub async fn handler() -> Json<Value> {
  Json(json!({ "status": "healthy", "timestamp": Utc::now() }))
}
