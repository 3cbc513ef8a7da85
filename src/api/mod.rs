//! Customer ordering API.
//!
//! | Path                      | Method | Description                   |
//! |---------------------------|--------|-------------------------------|
//! | `/api/health`             | GET    | Liveness check                |
//! | `/api/menu`               | GET    | Available products            |
//! | `/api/tables`             | GET    | Available tables              |
//! | `/api/orders`             | POST   | Place an order (201)          |
//! | `/api/orders/{id}`        | GET    | Order with lines and status   |
//! | `/api/orders/{id}/items`  | PUT    | Replace the lines of an order |
//! | `/api/orders/{id}`        | DELETE | Cancel an order (204)         |
//! | `/api/events`             | GET    | Server-sent change events     |
//!
//! The API is unauthenticated; staff-only operations live in the bot.

pub mod error;
mod events;
mod extract;
mod health;
mod menu;
mod orders;
mod tables;

use crate::{core::events::EventBus, errors::Result};
use axum::Router;
use sea_orm::DatabaseConnection;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct ApiState {
    /// Database connection pool, shared with the bot
    pub db: Arc<DatabaseConnection>,
    /// Bus that order changes are published to
    pub events: EventBus,
}

impl ApiState {
    /// Bundles the connection and the event bus.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, events: EventBus) -> Self {
        Self { db, events }
    }
}

/// Router with every route registered and no middleware.
pub fn build_router() -> Router<ApiState> {
    Router::new()
        .merge(health::router())
        .merge(menu::router())
        .merge(tables::router())
        .merge(orders::router())
        .merge(events::router())
}

/// Fully configured application, used by the server and by tests.
pub fn build_app(state: ApiState) -> Router {
    build_router()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `addr` and serves the API until the process exits.
pub async fn serve(addr: SocketAddr, state: ApiState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Customer API listening");
    axum::serve(listener, build_app(state)).await?;
    Ok(())
}
