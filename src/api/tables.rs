//! Table routes.

use super::ApiState;
use crate::{core::table, entities::dining_table::Model as DiningTable, errors::Result};
use axum::{Json, Router, extract::State, routing::get};

pub(super) fn router() -> Router<ApiState> {
    Router::new().route("/api/tables", get(list))
}

/// GET /api/tables - tables that can take a new order
async fn list(State(state): State<ApiState>) -> Result<Json<Vec<DiningTable>>> {
    Ok(Json(table::list_available_tables(&state.db).await?))
}
