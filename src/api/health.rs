//! Liveness check.

use super::ApiState;
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

pub(super) fn router() -> Router<ApiState> {
    Router::new().route("/api/health", get(health))
}

/// GET /api/health
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
