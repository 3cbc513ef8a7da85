//! Kitchen feed.
//!
//! Relays order events from the [`EventBus`](crate::core::events::EventBus) to
//! a Discord channel: new orders, edits and cancellations for the cooks, and
//! ready notices for the waiters. Other order changes are not posted.

use crate::core::{
    events::{Action, Collection, StoreEvent},
    order::{OrderStatus, OrderWithItems},
};
use poise::serenity_prelude as serenity;
use std::{fmt::Write as _, sync::Arc};
use tokio::sync::broadcast::{Receiver, error::RecvError};
use tracing::{debug, info, warn};

fn ticket(order: &OrderWithItems) -> String {
    let mut text = String::new();
    for item in &order.items {
        let _ = writeln!(text, "• {}× {}", item.quantity, item.name);
    }
    if let Some(notes) = &order.order.notes {
        let _ = writeln!(text, "📝 {notes}");
    }
    text
}

/// Renders the message posted for `event`, or `None` if the kitchen does not care.
#[must_use]
pub fn describe(event: &StoreEvent) -> Option<String> {
    if event.collection != Collection::Orders {
        return None;
    }
    let order = event.order.as_ref()?;
    let header = format!("Order #{} · Table {}", order.order.id, order.order.table_number);

    match (event.action, order.status) {
        (Action::Created, _) => Some(format!("🆕 **{header}**\n{}", ticket(order))),
        (Action::Updated, OrderStatus::Preparing) => {
            Some(format!("✏️ **{header}** changed\n{}", ticket(order)))
        }
        (Action::Updated, OrderStatus::Ready) => Some(format!("✅ **{header}** ready for pickup")),
        (Action::Deleted, _) => Some(format!("🚫 **{header}** cancelled")),
        (Action::Updated, _) => None,
    }
}

/// Posts kitchen-relevant events to `channel` until the bus closes.
pub async fn run_kitchen_feed(
    http: Arc<serenity::Http>,
    channel: serenity::ChannelId,
    mut rx: Receiver<StoreEvent>,
) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                let Some(message) = describe(&event) else {
                    continue;
                };
                debug!(order_id = event.id, "Posting to kitchen feed");
                if let Err(e) = channel.say(&*http, message).await {
                    warn!(%channel, "Failed to post to kitchen feed: {e}");
                }
            }
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Kitchen feed lagged"),
            Err(RecvError::Closed) => break,
        }
    }
    info!("Kitchen feed stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::order::{
            NewOrder, OrderLineRequest, confirm_payment, get_order_with_items, mark_ready,
            place_order,
        },
        entities::PaymentType,
        errors::Result,
        test_utils::*,
    };

    #[tokio::test]
    async fn test_describe_order_lifecycle() -> Result<()> {
        let (db, menu) = setup_with_menu().await?;
        let placed = place_order(
            &db,
            NewOrder {
                table_id: menu.table.id,
                items: vec![OrderLineRequest {
                    product_id: menu.tacos.id,
                    quantity: 3,
                }],
                notes: Some("sin cilantro".to_string()),
            },
        )
        .await?;
        let id = placed.order.id;

        let created = describe(&StoreEvent::order(Action::Created, placed.clone()));
        let created = created.unwrap_or_default();
        assert!(created.contains(&format!("Order #{id} · Table 1")));
        assert!(created.contains("3× Tacos al pastor"));
        assert!(created.contains("sin cilantro"));

        mark_ready(&db, id).await?;
        let ready = get_order_with_items(&db, id).await?;
        let notice = describe(&StoreEvent::order(Action::Updated, ready)).unwrap_or_default();
        assert!(notice.contains("ready for pickup"));

        confirm_payment(&db, id, PaymentType::Cash).await?;
        let paid = get_order_with_items(&db, id).await?;
        assert_eq!(describe(&StoreEvent::order(Action::Updated, paid)), None);

        let cancelled = describe(&StoreEvent::order(Action::Deleted, placed));
        assert!(cancelled.unwrap_or_default().contains("cancelled"));
        Ok(())
    }

    #[test]
    fn test_non_order_events_are_ignored() {
        let event = StoreEvent::new(Collection::Products, 1, Action::Updated);
        assert_eq!(describe(&event), None);
    }
}
