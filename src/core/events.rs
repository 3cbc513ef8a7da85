//! Change notifications for live listeners.
//!
//! Every successful write made through the bot or the API publishes a
//! [`StoreEvent`]. The kitchen feed and the SSE endpoint subscribe to the same
//! [`EventBus`]. Delivery is best effort: a receiver that falls behind by more
//! than the channel capacity skips the missed events.

use crate::core::order::{FlagChange, OrderWithItems};
use serde::Serialize;
use std::collections::BTreeSet;
use tokio::sync::broadcast;
use tracing::trace;

const DEFAULT_CAPACITY: usize = 256;

/// Which collection changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Menu products
    Products,
    /// Dining tables
    Tables,
    /// Orders and their lines
    Orders,
    /// Staff users
    Users,
}

impl Collection {
    /// Name used in serialized events.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Tables => "tables",
            Self::Orders => "orders",
            Self::Users => "users",
        }
    }
}

/// What happened to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Inserted
    Created,
    /// Changed in place
    Updated,
    /// Removed
    Deleted,
}

/// A single change to one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreEvent {
    /// Collection the document belongs to
    pub collection: Collection,
    /// Document id
    pub id: i64,
    /// Kind of change
    pub action: Action,
    /// Snapshot of the order, for order events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderWithItems>,
}

impl StoreEvent {
    /// Event for a change to a non-order document.
    #[must_use]
    pub const fn new(collection: Collection, id: i64, action: Action) -> Self {
        Self {
            collection,
            id,
            action,
            order: None,
        }
    }

    /// Event carrying an order snapshot.
    #[must_use]
    pub fn order(action: Action, order: OrderWithItems) -> Self {
        Self {
            collection: Collection::Orders,
            id: order.order.id,
            action,
            order: Some(order),
        }
    }
}

/// Clonable handle to the broadcast channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<StoreEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Creates a bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a bus that buffers up to `capacity` events per receiver.
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event. Having no subscribers is not an error.
    pub fn publish(&self, event: StoreEvent) {
        let receivers = self.tx.send(event).unwrap_or(0);
        trace!(receivers, "Event published");
    }

    /// Publishes an order change, then the documents the same write moved.
    ///
    /// `products` lists every product whose stock or availability may have
    /// changed; each id is published once. With `table_changed` the order's
    /// table is published too.
    pub fn publish_order_change(
        &self,
        action: Action,
        order: OrderWithItems,
        products: impl IntoIterator<Item = i64>,
        table_changed: bool,
    ) {
        let table_id = order.order.table_id;
        self.publish(StoreEvent::order(action, order));
        for id in products.into_iter().collect::<BTreeSet<_>>() {
            self.publish(StoreEvent::new(Collection::Products, id, Action::Updated));
        }
        if table_changed {
            self.publish(StoreEvent::new(Collection::Tables, table_id, Action::Updated));
        }
    }

    /// Publishes `order` after a flag operation, unless the flag was already
    /// set. Returns whether anything was published.
    pub fn publish_flag_change(
        &self,
        change: &FlagChange,
        order: OrderWithItems,
        frees_table: bool,
    ) -> bool {
        if change.changed {
            self.publish_order_change(Action::Updated, order, Vec::new(), frees_table);
        }
        change.changed
    }

    /// Returns a receiver for events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
