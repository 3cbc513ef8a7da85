//! Order business logic - Placing, editing and progressing customer orders.
//!
//! Placing or editing an order touches several rows at once (the order, its
//! lines, product stock and the table), so those operations run inside a single
//! database transaction and either apply completely or not at all.
//!
//! Progress is recorded with independent flags. Each flag operation is a single
//! write guarded by the precondition the staff screens rely on:
//!
//! | Operation          | Flag                | Requires            |
//! |--------------------|---------------------|---------------------|
//! | [`mark_ready`]     | `ready`             | not `completed`     |
//! | [`mark_picked_up`] | `picked_up`         | `ready`             |
//! | [`confirm_payment`]| `payment_confirmed` | not `completed`     |
//! | [`mark_completed`] | `completed`         | `payment_confirmed` |
//! | [`dispatch_order`] | `dispatched`        | `payment_confirmed` |
//!
//! Setting a flag that is already set writes nothing and reports
//! [`FlagChange::changed`] as false.

use crate::{
    core::{product as product_logic, round_cents, table as table_logic},
    entities::{DiningTable, Order, OrderItem, PaymentType, Product, order, order_item, product},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, instrument};

/// One requested line: a product and how many units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRequest {
    /// Product to order
    pub product_id: i64,
    /// Units, must be positive
    pub quantity: i64,
}

/// A new order as submitted by a customer or waiter.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    /// Table the order is for
    pub table_id: i64,
    /// Requested lines; repeated products are merged
    pub items: Vec<OrderLineRequest>,
    /// Optional notes for the kitchen
    #[serde(default)]
    pub notes: Option<String>,
}

/// Display summary derived from an order's flags, most advanced first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// In the kitchen
    Preparing,
    /// Waiting at the pass
    Ready,
    /// Served to the table
    PickedUp,
    /// Payment received
    Paid,
    /// Closed
    Completed,
    /// Table released
    Dispatched,
}

impl OrderStatus {
    /// Derives the status from the flags of `order`.
    #[must_use]
    pub const fn of(order: &order::Model) -> Self {
        if order.dispatched {
            Self::Dispatched
        } else if order.completed {
            Self::Completed
        } else if order.payment_confirmed {
            Self::Paid
        } else if order.picked_up {
            Self::PickedUp
        } else if order.ready {
            Self::Ready
        } else {
            Self::Preparing
        }
    }

    /// Label shown to staff.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Preparing => "en preparación",
            Self::Ready => "lista",
            Self::PickedUp => "recogida",
            Self::Paid => "pagada",
            Self::Completed => "completada",
            Self::Dispatched => "despachada",
        }
    }
}

/// An order together with its lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderWithItems {
    /// The order row
    #[serde(flatten)]
    pub order: order::Model,
    /// Its lines, in insertion order
    pub items: Vec<order_item::Model>,
    /// Derived display status
    pub status: OrderStatus,
}

impl OrderWithItems {
    /// Bundles an order with its lines and computes the status.
    #[must_use]
    pub fn new(order: order::Model, items: Vec<order_item::Model>) -> Self {
        let status = OrderStatus::of(&order);
        Self {
            order,
            items,
            status,
        }
    }

    /// Total units across all lines.
    #[must_use]
    pub fn unit_count(&self) -> i64 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Ids of the products on the lines.
    #[must_use]
    pub fn product_ids(&self) -> Vec<i64> {
        self.items.iter().map(|item| item.product_id).collect()
    }
}

/// Outcome of a flag operation.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagChange {
    /// The order after the operation
    pub order: order::Model,
    /// False when the flag was already set and nothing was written
    pub changed: bool,
}

impl FlagChange {
    const fn unchanged(order: order::Model) -> Self {
        Self {
            order,
            changed: false,
        }
    }

    const fn written(order: order::Model) -> Self {
        Self {
            order,
            changed: true,
        }
    }
}

/// A line about to be written, with product fields already copied.
struct LineDraft {
    product_id: i64,
    name: String,
    category: String,
    price: f64,
    quantity: i64,
}

impl LineDraft {
    fn from_product(product: &product::Model, quantity: i64) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            category: product.category.clone(),
            price: product.price,
            quantity,
        }
    }

    fn from_line(line: &order_item::Model, quantity: i64) -> Self {
        Self {
            product_id: line.product_id,
            name: line.name.clone(),
            category: line.category.clone(),
            price: line.price,
            quantity,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn line_total(&self) -> f64 {
        round_cents(self.price * self.quantity as f64)
    }
}

fn invalid(id: i64, message: &str) -> Error {
    Error::InvalidOrderState {
        id,
        message: message.to_string(),
    }
}

/// Validates requested lines and merges repeated products.
fn merge_lines(items: &[OrderLineRequest]) -> Result<BTreeMap<i64, i64>> {
    if items.is_empty() {
        return Err(Error::validation("An order needs at least one item"));
    }

    let mut merged = BTreeMap::new();
    for line in items {
        if line.quantity <= 0 {
            return Err(Error::InvalidQuantity {
                quantity: line.quantity,
            });
        }
        let entry = merged.entry(line.product_id).or_insert(0_i64);
        *entry = entry
            .checked_add(line.quantity)
            .ok_or(Error::InvalidQuantity {
                quantity: line.quantity,
            })?;
    }
    Ok(merged)
}

fn total_of(drafts: &[LineDraft]) -> f64 {
    round_cents(drafts.iter().map(LineDraft::line_total).sum())
}

async fn find_order<C>(conn: &C, order_id: i64) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    Order::find_by_id(order_id)
        .one(conn)
        .await?
        .ok_or(Error::OrderNotFound { id: order_id })
}

async fn fetch_product<C>(conn: &C, product_id: i64) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(conn)
        .await?
        .ok_or_else(|| Error::ProductNotFound {
            name: product_id.to_string(),
        })
}

async fn load_items<C>(conn: &C, order_id: i64) -> Result<Vec<order_item::Model>>
where
    C: ConnectionTrait,
{
    OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .order_by_asc(order_item::Column::Id)
        .all(conn)
        .await
        .map_err(Into::into)
}

async fn insert_lines<C>(
    conn: &C,
    order_id: i64,
    drafts: Vec<LineDraft>,
) -> Result<Vec<order_item::Model>>
where
    C: ConnectionTrait,
{
    let mut items = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let line_total = draft.line_total();
        let line = order_item::ActiveModel {
            order_id: Set(order_id),
            product_id: Set(draft.product_id),
            name: Set(draft.name),
            category: Set(draft.category),
            price: Set(draft.price),
            quantity: Set(draft.quantity),
            line_total: Set(line_total),
            ..Default::default()
        };
        items.push(line.insert(conn).await?);
    }
    Ok(items)
}

/// Places a new order on a table.
///
/// In one transaction: occupies the table, reserves stock for every line,
/// writes the order with a server-computed total and copies product fields
/// into the lines. Any failure leaves the database untouched.
///
/// # Errors
/// Returns an error if:
/// - No items are requested or a quantity is not positive
/// - The table does not exist or is not available
/// - A product does not exist, is unavailable, or lacks stock
#[instrument(skip(db, new_order), fields(table_id = new_order.table_id))]
pub async fn place_order(db: &DatabaseConnection, new_order: NewOrder) -> Result<OrderWithItems> {
    let lines = merge_lines(&new_order.items)?;

    let txn = db.begin().await?;

    let table = DiningTable::find_by_id(new_order.table_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::TableNotFound {
            table: new_order.table_id.to_string(),
        })?;
    table_logic::occupy_table(&txn, &table).await?;

    let mut drafts = Vec::with_capacity(lines.len());
    for (product_id, quantity) in lines {
        let product = fetch_product(&txn, product_id).await?;
        product_logic::reserve_stock(&txn, &product, quantity).await?;
        drafts.push(LineDraft::from_product(&product, quantity));
    }

    let now = Utc::now();
    let order = order::ActiveModel {
        table_id: Set(table.id),
        table_number: Set(table.number),
        total: Set(total_of(&drafts)),
        payment_type: Set(None),
        notes: Set(new_order.notes.filter(|n| !n.trim().is_empty())),
        ready: Set(false),
        picked_up: Set(false),
        payment_confirmed: Set(false),
        completed: Set(false),
        dispatched: Set(false),
        ready_at: Set(None),
        picked_up_at: Set(None),
        paid_at: Set(None),
        completed_at: Set(None),
        dispatched_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let items = insert_lines(&txn, order.id, drafts).await?;

    txn.commit().await?;

    info!(
        order_id = order.id,
        table = order.table_number,
        total = order.total,
        "Order placed"
    );
    Ok(OrderWithItems::new(order, items))
}

/// Replaces the lines of an order the kitchen has not finished yet.
///
/// Stock moves by the per-product difference only: extra units are reserved,
/// removed units are returned. Lines that stay keep the price copied when they
/// were first ordered; new lines copy the current product.
///
/// # Errors
/// Returns an error if the order is already ready, paid or dispatched, or if
/// any added units cannot be reserved.
#[instrument(skip(db, items))]
pub async fn update_order_items(
    db: &DatabaseConnection,
    order_id: i64,
    items: Vec<OrderLineRequest>,
) -> Result<OrderWithItems> {
    let requested = merge_lines(&items)?;

    let txn = db.begin().await?;

    let existing = find_order(&txn, order_id).await?;
    if existing.ready || existing.payment_confirmed || existing.dispatched {
        return Err(invalid(
            order_id,
            "items can only change before the order is ready",
        ));
    }

    let old_lines = load_items(&txn, order_id).await?;
    let mut old_quantities: HashMap<i64, i64> = HashMap::new();
    let mut old_copies: HashMap<i64, &order_item::Model> = HashMap::new();
    for line in &old_lines {
        *old_quantities.entry(line.product_id).or_insert(0) += line.quantity;
        old_copies.entry(line.product_id).or_insert(line);
    }

    let mut drafts = Vec::with_capacity(requested.len());
    for (&product_id, &quantity) in &requested {
        let previous = old_quantities.get(&product_id).copied().unwrap_or(0);
        let delta = quantity - previous;

        if delta > 0 {
            let product = fetch_product(&txn, product_id).await?;
            product_logic::reserve_stock(&txn, &product, delta).await?;
        } else if delta < 0 {
            product_logic::release_stock(&txn, product_id, -delta).await?;
        }

        let draft = match old_copies.get(&product_id) {
            Some(line) => LineDraft::from_line(line, quantity),
            None => LineDraft::from_product(&fetch_product(&txn, product_id).await?, quantity),
        };
        drafts.push(draft);
    }

    for (product_id, quantity) in &old_quantities {
        if !requested.contains_key(product_id) {
            product_logic::release_stock(&txn, *product_id, *quantity).await?;
        }
    }

    OrderItem::delete_many()
        .filter(order_item::Column::OrderId.eq(order_id))
        .exec(&txn)
        .await?;

    let total = total_of(&drafts);
    let items = insert_lines(&txn, order_id, drafts).await?;

    let mut order: order::ActiveModel = existing.into();
    order.total = Set(total);
    order.updated_at = Set(Utc::now());
    let order = order.update(&txn).await?;

    txn.commit().await?;

    info!(order_id, total, "Order items updated");
    Ok(OrderWithItems::new(order, items))
}

/// Cancels an unpaid order: returns its stock, frees its table and deletes it.
///
/// Returns the order as it was before deletion.
#[instrument(skip(db))]
pub async fn cancel_order(db: &DatabaseConnection, order_id: i64) -> Result<OrderWithItems> {
    let txn = db.begin().await?;

    let order = find_order(&txn, order_id).await?;
    if order.payment_confirmed {
        return Err(invalid(order_id, "paid orders cannot be cancelled"));
    }

    let items = load_items(&txn, order_id).await?;
    for line in &items {
        product_logic::release_stock(&txn, line.product_id, line.quantity).await?;
    }

    OrderItem::delete_many()
        .filter(order_item::Column::OrderId.eq(order_id))
        .exec(&txn)
        .await?;
    Order::delete_by_id(order_id).exec(&txn).await?;

    if !order.dispatched {
        table_logic::release_table(&txn, order.table_id).await?;
    }

    txn.commit().await?;

    info!(order_id, "Order cancelled");
    Ok(OrderWithItems::new(order, items))
}

#[derive(Debug, Clone, Copy)]
enum Flag {
    Ready,
    PickedUp,
    PaymentConfirmed(PaymentType),
    Completed,
    Dispatched,
}

async fn set_flag<C>(conn: &C, order: order::Model, flag: Flag) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let mut active: order::ActiveModel = order.into();
    match flag {
        Flag::Ready => {
            active.ready = Set(true);
            active.ready_at = Set(Some(now));
        }
        Flag::PickedUp => {
            active.picked_up = Set(true);
            active.picked_up_at = Set(Some(now));
        }
        Flag::PaymentConfirmed(payment_type) => {
            active.payment_confirmed = Set(true);
            active.payment_type = Set(Some(payment_type));
            active.paid_at = Set(Some(now));
        }
        Flag::Completed => {
            active.completed = Set(true);
            active.completed_at = Set(Some(now));
        }
        Flag::Dispatched => {
            active.dispatched = Set(true);
            active.dispatched_at = Set(Some(now));
        }
    }
    active.updated_at = Set(now);

    let updated = active.update(conn).await?;
    info!(order_id = updated.id, ?flag, "Order flag set");
    Ok(updated)
}

/// Kitchen: marks the order ready (lista).
#[instrument(skip(db))]
pub async fn mark_ready(db: &DatabaseConnection, order_id: i64) -> Result<FlagChange> {
    let order = find_order(db, order_id).await?;
    if order.ready {
        return Ok(FlagChange::unchanged(order));
    }
    if order.completed {
        return Err(invalid(order_id, "the order is already completed"));
    }
    set_flag(db, order, Flag::Ready).await.map(FlagChange::written)
}

/// Waiter: records that the order left the kitchen (recogido).
#[instrument(skip(db))]
pub async fn mark_picked_up(db: &DatabaseConnection, order_id: i64) -> Result<FlagChange> {
    let order = find_order(db, order_id).await?;
    if order.picked_up {
        return Ok(FlagChange::unchanged(order));
    }
    if !order.ready {
        return Err(invalid(order_id, "the kitchen has not marked it ready yet"));
    }
    set_flag(db, order, Flag::PickedUp).await.map(FlagChange::written)
}

/// Waiter: confirms payment (confirmarPago) and records how it was paid.
#[instrument(skip(db))]
pub async fn confirm_payment(
    db: &DatabaseConnection,
    order_id: i64,
    payment_type: PaymentType,
) -> Result<FlagChange> {
    let order = find_order(db, order_id).await?;
    if order.payment_confirmed {
        return Ok(FlagChange::unchanged(order));
    }
    if order.completed {
        return Err(invalid(order_id, "the order is already completed"));
    }
    set_flag(db, order, Flag::PaymentConfirmed(payment_type)).await.map(FlagChange::written)
}

/// Waiter: closes a paid order (completado).
#[instrument(skip(db))]
pub async fn mark_completed(db: &DatabaseConnection, order_id: i64) -> Result<FlagChange> {
    let order = find_order(db, order_id).await?;
    if order.completed {
        return Ok(FlagChange::unchanged(order));
    }
    if !order.payment_confirmed {
        return Err(invalid(order_id, "payment has not been confirmed"));
    }
    set_flag(db, order, Flag::Completed).await.map(FlagChange::written)
}

/// Waiter: releases the table of a paid order (pedidoDespachado).
///
/// The flag and the table release are written in one transaction.
#[instrument(skip(db))]
pub async fn dispatch_order(db: &DatabaseConnection, order_id: i64) -> Result<FlagChange> {
    let txn = db.begin().await?;

    let order = find_order(&txn, order_id).await?;
    if order.dispatched {
        return Ok(FlagChange::unchanged(order));
    }
    if !order.payment_confirmed {
        return Err(invalid(order_id, "payment has not been confirmed"));
    }

    let table_id = order.table_id;
    let updated = set_flag(&txn, order, Flag::Dispatched).await?;
    table_logic::release_table(&txn, table_id).await?;

    txn.commit().await?;
    Ok(FlagChange::written(updated))
}

/// Finds an order by ID.
pub async fn get_order(db: &DatabaseConnection, order_id: i64) -> Result<Option<order::Model>> {
    Order::find_by_id(order_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads an order and its lines.
///
/// # Errors
/// Returns [`Error::OrderNotFound`] if the order does not exist.
pub async fn get_order_with_items(
    db: &DatabaseConnection,
    order_id: i64,
) -> Result<OrderWithItems> {
    let order = find_order(db, order_id).await?;
    let items = load_items(db, order_id).await?;
    Ok(OrderWithItems::new(order, items))
}

/// Loads the lines of many orders with one query.
async fn attach_items(
    db: &DatabaseConnection,
    orders: Vec<order::Model>,
) -> Result<Vec<OrderWithItems>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
    let mut grouped: HashMap<i64, Vec<order_item::Model>> = HashMap::new();
    for line in OrderItem::find()
        .filter(order_item::Column::OrderId.is_in(ids))
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await?
    {
        grouped.entry(line.order_id).or_default().push(line);
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let items = grouped.remove(&order.id).unwrap_or_default();
            OrderWithItems::new(order, items)
        })
        .collect())
}

/// Orders whose table has not been released yet, oldest first.
pub async fn list_open_orders(db: &DatabaseConnection) -> Result<Vec<OrderWithItems>> {
    let orders = Order::find()
        .filter(order::Column::Dispatched.eq(false))
        .order_by_asc(order::Column::CreatedAt)
        .order_by_asc(order::Column::Id)
        .all(db)
        .await?;
    attach_items(db, orders).await
}

/// Orders the kitchen still has to prepare, oldest first.
pub async fn list_kitchen_queue(db: &DatabaseConnection) -> Result<Vec<OrderWithItems>> {
    let orders = Order::find()
        .filter(order::Column::Ready.eq(false))
        .filter(order::Column::Dispatched.eq(false))
        .order_by_asc(order::Column::CreatedAt)
        .order_by_asc(order::Column::Id)
        .all(db)
        .await?;
    attach_items(db, orders).await
}

/// All orders ever placed on a table, newest first.
pub async fn list_orders_for_table(
    db: &DatabaseConnection,
    table_id: i64,
) -> Result<Vec<order::Model>> {
    Order::find()
        .filter(order::Column::TableId.eq(table_id))
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Orders placed in `[from, to)`, oldest first, with their lines.
pub async fn list_orders_between(
    db: &DatabaseConnection,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<OrderWithItems>> {
    let orders = Order::find()
        .filter(order::Column::CreatedAt.gte(from))
        .filter(order::Column::CreatedAt.lt(to))
        .order_by_asc(order::Column::CreatedAt)
        .order_by_asc(order::Column::Id)
        .all(db)
        .await?;
    attach_items(db, orders).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::{product::get_product_by_id, table::get_table_by_id};
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn line(product_id: i64, quantity: i64) -> OrderLineRequest {
        OrderLineRequest {
            product_id,
            quantity,
        }
    }

    fn order_for(table_id: i64, items: Vec<OrderLineRequest>) -> NewOrder {
        NewOrder {
            table_id,
            items,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_place_order_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = place_order(&db, order_for(1, vec![])).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = place_order(&db, order_for(1, vec![line(1, 0)])).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidQuantity { quantity: 0 }
        ));

        let result = place_order(&db, order_for(1, vec![line(1, 2), line(2, -1)])).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidQuantity { quantity: -1 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_reserves_stock_and_occupies_table() -> Result<()> {
        let (db, menu) = setup_with_menu().await?;

        let placed = place_order(
            &db,
            NewOrder {
                table_id: menu.table.id,
                items: vec![line(menu.tacos.id, 2), line(menu.drink.id, 3)],
                notes: Some("sin cebolla".to_string()),
            },
        )
        .await?;

        assert_eq!(placed.items.len(), 2);
        assert_eq!(placed.order.total, 2.0 * 85.0 + 3.0 * 30.0);
        assert_eq!(placed.order.table_number, menu.table.number);
        assert_eq!(placed.order.notes.as_deref(), Some("sin cebolla"));
        assert_eq!(placed.status, OrderStatus::Preparing);
        assert_eq!(placed.unit_count(), 5);

        let line_sum: f64 = placed.items.iter().map(|i| i.line_total).sum();
        assert_eq!(placed.order.total, line_sum);

        let tacos = get_product_by_id(&db, menu.tacos.id).await?.unwrap();
        assert_eq!(tacos.stock, Some(3));
        let drink = get_product_by_id(&db, menu.drink.id).await?.unwrap();
        assert_eq!(drink.stock, None);

        let table = get_table_by_id(&db, menu.table.id).await?.unwrap();
        assert!(!table.available);
        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_merges_repeated_products() -> Result<()> {
        let (db, menu) = setup_with_menu().await?;

        let placed = place_order(
            &db,
            order_for(
                menu.table.id,
                vec![line(menu.tacos.id, 1), line(menu.tacos.id, 2)],
            ),
        )
        .await?;

        assert_eq!(placed.items.len(), 1);
        assert_eq!(placed.items[0].quantity, 3);
        assert_eq!(placed.items[0].line_total, 255.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_on_occupied_table() -> Result<()> {
        let (db, menu) = setup_with_menu().await?;
        place_order(&db, order_for(menu.table.id, vec![line(menu.drink.id, 1)])).await?;

        let result = place_order(&db, order_for(menu.table.id, vec![line(menu.drink.id, 1)])).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::TableUnavailable { .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_unknown_table_and_product() -> Result<()> {
        let (db, menu) = setup_with_menu().await?;

        let result = place_order(&db, order_for(999, vec![line(menu.drink.id, 1)])).await;
        assert!(matches!(result.unwrap_err(), Error::TableNotFound { .. }));

        let result = place_order(&db, order_for(menu.table.id, vec![line(999, 1)])).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::ProductNotFound { .. }
        ));

        // The failed attempt must not leave the table occupied
        let table = get_table_by_id(&db, menu.table.id).await?.unwrap();
        assert!(table.available);
        Ok(())
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_everything() -> Result<()> {
        let (db, menu) = setup_with_menu().await?;
        let flan = create_test_product(&db, "Flan", 45.0, Some(10)).await?;

        let result = place_order(
            &db,
            order_for(menu.table.id, vec![line(flan.id, 4), line(menu.tacos.id, 6)]),
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientStock {
                available: 5,
                requested: 6,
                ..
            }
        ));

        assert_eq!(get_product_by_id(&db, flan.id).await?.unwrap().stock, Some(10));
        assert_eq!(
            get_product_by_id(&db, menu.tacos.id).await?.unwrap().stock,
            Some(5)
        );
        assert!(get_table_by_id(&db, menu.table.id).await?.unwrap().available);
        assert!(list_open_orders(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_selling_out_hides_product() -> Result<()> {
        let (db, menu) = setup_with_menu().await?;
        place_order(&db, order_for(menu.table.id, vec![line(menu.tacos.id, 5)])).await?;

        let tacos = get_product_by_id(&db, menu.tacos.id).await?.unwrap();
        assert_eq!(tacos.stock, Some(0));
        assert!(!tacos.available);

        let other_table = create_test_table(&db, 2).await?;
        let result = place_order(&db, order_for(other_table.id, vec![line(menu.tacos.id, 1)])).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::ProductUnavailable { .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_lines_keep_copied_fields() -> Result<()> {
        let (db, menu) = setup_with_menu().await?;
        let placed =
            place_order(&db, order_for(menu.table.id, vec![line(menu.drink.id, 1)])).await?;

        crate::core::product::update_product(
            &db,
            menu.drink.id,
            crate::core::product::ProductChanges {
                price: Some(99.0),
                ..Default::default()
            },
        )
        .await?;
        crate::core::product::delete_product(&db, menu.drink.id).await?;

        let reloaded = get_order_with_items(&db, placed.order.id).await?;
        assert_eq!(reloaded.items[0].name, "Agua de jamaica");
        assert_eq!(reloaded.items[0].price, 30.0);
        assert_eq!(reloaded.order.total, 30.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_items_adjusts_stock_by_difference() -> Result<()> {
        let (db, menu) = setup_with_menu().await?;
        let flan = create_test_product(&db, "Flan", 45.0, Some(4)).await?;
        let placed = place_order(
            &db,
            order_for(menu.table.id, vec![line(menu.tacos.id, 3), line(flan.id, 2)]),
        )
        .await?;
        assert_eq!(
            get_product_by_id(&db, menu.tacos.id).await?.unwrap().stock,
            Some(2)
        );

        // tacos 3 -> 1, flan removed, drink added
        let updated = update_order_items(
            &db,
            placed.order.id,
            vec![line(menu.tacos.id, 1), line(menu.drink.id, 2)],
        )
        .await?;

        assert_eq!(updated.items.len(), 2);
        assert_eq!(updated.order.total, 85.0 + 60.0);
        assert_eq!(
            get_product_by_id(&db, menu.tacos.id).await?.unwrap().stock,
            Some(4)
        );
        assert_eq!(get_product_by_id(&db, flan.id).await?.unwrap().stock, Some(4));

        // tacos 1 -> 5 needs 4 more, exactly what is left
        let updated = update_order_items(&db, placed.order.id, vec![line(menu.tacos.id, 5)]).await?;
        assert_eq!(updated.order.total, 425.0);
        let tacos = get_product_by_id(&db, menu.tacos.id).await?.unwrap();
        assert_eq!(tacos.stock, Some(0));
        assert!(!tacos.available);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_items_keeps_original_price() -> Result<()> {
        let (db, menu) = setup_with_menu().await?;
        let placed =
            place_order(&db, order_for(menu.table.id, vec![line(menu.drink.id, 1)])).await?;

        crate::core::product::update_product(
            &db,
            menu.drink.id,
            crate::core::product::ProductChanges {
                price: Some(40.0),
                ..Default::default()
            },
        )
        .await?;

        let updated = update_order_items(&db, placed.order.id, vec![line(menu.drink.id, 2)]).await?;
        assert_eq!(updated.items[0].price, 30.0);
        assert_eq!(updated.order.total, 60.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_items_failure_leaves_order_intact() -> Result<()> {
        let (db, menu) = setup_with_menu().await?;
        let placed =
            place_order(&db, order_for(menu.table.id, vec![line(menu.tacos.id, 2)])).await?;

        let result = update_order_items(&db, placed.order.id, vec![line(menu.tacos.id, 9)]).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientStock { .. }
        ));

        let reloaded = get_order_with_items(&db, placed.order.id).await?;
        assert_eq!(reloaded.items[0].quantity, 2);
        assert_eq!(
            get_product_by_id(&db, menu.tacos.id).await?.unwrap().stock,
            Some(3)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_update_items_after_ready_refused() -> Result<()> {
        let (db, menu) = setup_with_menu().await?;
        let placed =
            place_order(&db, order_for(menu.table.id, vec![line(menu.drink.id, 1)])).await?;
        mark_ready(&db, placed.order.id).await?;

        let result = update_order_items(&db, placed.order.id, vec![line(menu.drink.id, 2)]).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidOrderState { .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_returns_stock_and_frees_table() -> Result<()> {
        let (db, menu) = setup_with_menu().await?;
        let placed =
            place_order(&db, order_for(menu.table.id, vec![line(menu.tacos.id, 5)])).await?;

        let cancelled = cancel_order(&db, placed.order.id).await?;
        assert_eq!(cancelled.order.id, placed.order.id);

        let tacos = get_product_by_id(&db, menu.tacos.id).await?.unwrap();
        assert_eq!(tacos.stock, Some(5));
        assert!(tacos.available);
        assert!(get_table_by_id(&db, menu.table.id).await?.unwrap().available);
        assert!(get_order(&db, placed.order.id).await?.is_none());

        let result = cancel_order(&db, placed.order.id).await;
        assert!(matches!(result.unwrap_err(), Error::OrderNotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_paid_order_refused() -> Result<()> {
        let (db, menu) = setup_with_menu().await?;
        let placed =
            place_order(&db, order_for(menu.table.id, vec![line(menu.drink.id, 1)])).await?;
        confirm_payment(&db, placed.order.id, PaymentType::Cash).await?;

        let result = cancel_order(&db, placed.order.id).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidOrderState { .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_flag_preconditions() -> Result<()> {
        let (db, menu) = setup_with_menu().await?;
        let placed =
            place_order(&db, order_for(menu.table.id, vec![line(menu.drink.id, 1)])).await?;
        let id = placed.order.id;

        assert!(matches!(
            mark_picked_up(&db, id).await.unwrap_err(),
            Error::InvalidOrderState { .. }
        ));
        assert!(matches!(
            mark_completed(&db, id).await.unwrap_err(),
            Error::InvalidOrderState { .. }
        ));
        assert!(matches!(
            dispatch_order(&db, id).await.unwrap_err(),
            Error::InvalidOrderState { .. }
        ));

        let ready = mark_ready(&db, id).await?;
        assert!(ready.changed);
        assert!(ready.order.ready);
        assert!(ready.order.ready_at.is_some());

        let picked = mark_picked_up(&db, id).await?;
        assert!(picked.order.picked_up);

        let paid = confirm_payment(&db, id, PaymentType::Card).await?;
        assert!(paid.order.payment_confirmed);
        assert_eq!(paid.order.payment_type, Some(PaymentType::Card));

        // Confirming again keeps the first payment type
        let again = confirm_payment(&db, id, PaymentType::Cash).await?;
        assert!(!again.changed);
        assert_eq!(again.order.payment_type, Some(PaymentType::Card));

        let completed = mark_completed(&db, id).await?;
        assert!(completed.order.completed);
        assert_eq!(OrderStatus::of(&completed.order), OrderStatus::Completed);

        assert!(matches!(
            mark_ready(&db, id).await,
            Ok(ref change) if change.order.ready && !change.changed
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_payment_before_ready_is_allowed() -> Result<()> {
        let (db, menu) = setup_with_menu().await?;
        let placed =
            place_order(&db, order_for(menu.table.id, vec![line(menu.drink.id, 1)])).await?;

        let paid = confirm_payment(&db, placed.order.id, PaymentType::Transfer).await?;
        assert!(!paid.order.ready);
        assert_eq!(OrderStatus::of(&paid.order), OrderStatus::Paid);
        Ok(())
    }

    #[tokio::test]
    async fn test_ready_after_completion_refused() -> Result<()> {
        let (db, menu) = setup_with_menu().await?;
        let placed =
            place_order(&db, order_for(menu.table.id, vec![line(menu.drink.id, 1)])).await?;
        confirm_payment(&db, placed.order.id, PaymentType::Cash).await?;
        mark_completed(&db, placed.order.id).await?;

        let result = mark_ready(&db, placed.order.id).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidOrderState { .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_dispatch_frees_table() -> Result<()> {
        let (db, menu) = setup_with_menu().await?;
        let placed =
            place_order(&db, order_for(menu.table.id, vec![line(menu.drink.id, 1)])).await?;
        confirm_payment(&db, placed.order.id, PaymentType::Cash).await?;

        let dispatched = dispatch_order(&db, placed.order.id).await?;
        assert!(dispatched.changed);
        assert!(dispatched.order.dispatched);
        assert!(get_table_by_id(&db, menu.table.id).await?.unwrap().available);
        assert!(list_open_orders(&db).await?.is_empty());

        // The table can take a new order
        place_order(&db, order_for(menu.table.id, vec![line(menu.drink.id, 1)])).await?;
        assert_eq!(list_orders_for_table(&db, menu.table.id).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_kitchen_queue() -> Result<()> {
        let (db, menu) = setup_with_menu().await?;
        let second_table = create_test_table(&db, 2).await?;

        let first =
            place_order(&db, order_for(menu.table.id, vec![line(menu.drink.id, 1)])).await?;
        let second =
            place_order(&db, order_for(second_table.id, vec![line(menu.tacos.id, 1)])).await?;

        let queue = list_kitchen_queue(&db).await?;
        assert_eq!(queue.len(), 2);
        assert_eq!(queue[0].order.id, first.order.id);
        assert_eq!(queue[1].items[0].name, "Tacos al pastor");

        mark_ready(&db, first.order.id).await?;
        let queue = list_kitchen_queue(&db).await?;
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].order.id, second.order.id);

        assert_eq!(list_open_orders(&db).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_orders_between() -> Result<()> {
        let (db, menu) = setup_with_menu().await?;
        place_order(&db, order_for(menu.table.id, vec![line(menu.drink.id, 1)])).await?;

        let now = Utc::now();
        let hour = chrono::Duration::hours(1);
        assert_eq!(list_orders_between(&db, now - hour, now + hour).await?.len(), 1);
        assert!(list_orders_between(&db, now + hour, now + hour * 2).await?.is_empty());
        Ok(())
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(OrderStatus::Preparing.label(), "en preparación");
        assert_eq!(OrderStatus::Dispatched.label(), "despachada");
    }
}
