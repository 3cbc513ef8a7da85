//! Server-sent change events.
//!
//! Each [`StoreEvent`] is sent as an SSE message named after its collection
//! with the event as JSON data. Lagging clients skip what they missed.

use super::ApiState;
use crate::core::events::StoreEvent;
use axum::{
    Router,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures::{Stream, stream};
use std::convert::Infallible;
use tokio::sync::broadcast::{Receiver, error::RecvError};
use tracing::warn;

pub(super) fn router() -> Router<ApiState> {
    Router::new().route("/api/events", get(subscribe))
}

fn to_sse(event: &StoreEvent) -> Option<Event> {
    Event::default()
        .event(event.collection.as_str())
        .json_data(event)
        .inspect_err(|e| warn!("Failed to encode event: {e}"))
        .ok()
}

async fn next_event(
    mut rx: Receiver<StoreEvent>,
) -> Option<(Result<Event, Infallible>, Receiver<StoreEvent>)> {
    loop {
        match rx.recv().await {
            Ok(event) => {
                if let Some(sse) = to_sse(&event) {
                    return Some((Ok(sse), rx));
                }
            }
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "SSE client lagged"),
            Err(RecvError::Closed) => return None,
        }
    }
}

/// GET /api/events
async fn subscribe(
    State(state): State<ApiState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.events.subscribe();
    Sse::new(stream::unfold(rx, next_event)).keep_alive(KeepAlive::default())
}
