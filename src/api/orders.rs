//! Order routes. Every successful write is published on the event bus.

use super::{
    ApiState,
    extract::{JsonBody, PathParam},
};
use crate::{
    core::{
        events::Action,
        order::{self, NewOrder, OrderLineRequest, OrderWithItems},
    },
    errors::Result,
};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};
use serde::Deserialize;

pub(super) fn router() -> Router<ApiState> {
    Router::new()
        .route("/api/orders", post(create))
        .route("/api/orders/{id}", get(get_by_id).delete(cancel))
        .route("/api/orders/{id}/items", put(update_items))
}

/// Body of `PUT /api/orders/{id}/items`.
#[derive(Debug, Deserialize)]
struct ItemsPayload {
    items: Vec<OrderLineRequest>,
}

/// POST /api/orders
async fn create(
    State(state): State<ApiState>,
    JsonBody(payload): JsonBody<NewOrder>,
) -> Result<(StatusCode, Json<OrderWithItems>)> {
    let placed = order::place_order(&state.db, payload).await?;
    state
        .events
        .publish_order_change(Action::Created, placed.clone(), placed.product_ids(), true);
    Ok((StatusCode::CREATED, Json(placed)))
}

/// GET /api/orders/{id}
async fn get_by_id(
    State(state): State<ApiState>,
    PathParam(id): PathParam<i64>,
) -> Result<Json<OrderWithItems>> {
    Ok(Json(order::get_order_with_items(&state.db, id).await?))
}

/// PUT /api/orders/{id}/items
///
/// Products dropped from the order get their stock back, so they are
/// published along with the new lines.
async fn update_items(
    State(state): State<ApiState>,
    PathParam(id): PathParam<i64>,
    JsonBody(payload): JsonBody<ItemsPayload>,
) -> Result<Json<OrderWithItems>> {
    let previous = order::get_order_with_items(&state.db, id).await?;
    let updated = order::update_order_items(&state.db, id, payload.items).await?;

    let mut products = previous.product_ids();
    products.extend(updated.product_ids());
    state
        .events
        .publish_order_change(Action::Updated, updated.clone(), products, false);
    Ok(Json(updated))
}

/// DELETE /api/orders/{id}
async fn cancel(
    State(state): State<ApiState>,
    PathParam(id): PathParam<i64>,
) -> Result<StatusCode> {
    let cancelled = order::cancel_order(&state.db, id).await?;
    let products = cancelled.product_ids();
    state
        .events
        .publish_order_change(Action::Deleted, cancelled, products, true);
    Ok(StatusCode::NO_CONTENT)
}
