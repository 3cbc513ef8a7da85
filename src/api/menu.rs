//! Menu routes.

use super::ApiState;
use crate::{core::product, entities::product::Model as Product, errors::Result};
use axum::{Json, Router, extract::State, routing::get};

pub(super) fn router() -> Router<ApiState> {
    Router::new().route("/api/menu", get(list))
}

/// GET /api/menu - available products, by category then name
async fn list(State(state): State<ApiState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(product::list_menu(&state.db).await?))
}
