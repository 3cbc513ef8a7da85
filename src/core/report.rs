//! Sales reporting.
//!
//! Reports are plain data computed from the orders in a time range. The bot
//! formats them for Discord; nothing here knows how they are displayed.
//! Revenue only counts orders whose payment has been confirmed.

use crate::{
    core::{
        order::{self as order_logic, OrderWithItems},
        round_cents,
    },
    entities::PaymentType,
    errors::Result,
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Revenue collected with one payment type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentBreakdown {
    /// How the orders were paid
    pub payment_type: PaymentType,
    /// Number of paid orders
    pub orders: usize,
    /// Sum of their totals
    pub revenue: f64,
}

/// Units sold and revenue for one product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSales {
    /// Product id at the time of sale
    pub product_id: i64,
    /// Product name as copied onto the order line
    pub name: String,
    /// Product category as copied onto the order line
    pub category: String,
    /// Units sold
    pub units: i64,
    /// Revenue from those units
    pub revenue: f64,
}

/// Aggregate figures for a time range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesSummary {
    /// Start of the range, inclusive
    pub from: DateTime<Utc>,
    /// End of the range, exclusive
    pub to: DateTime<Utc>,
    /// Orders placed in the range
    pub order_count: usize,
    /// Orders with confirmed payment
    pub paid_orders: usize,
    /// Orders whose table has not been released
    pub open_orders: usize,
    /// Total of paid orders
    pub revenue: f64,
    /// Revenue divided by paid orders
    pub average_ticket: f64,
    /// Revenue per payment type, largest first
    pub by_payment: Vec<PaymentBreakdown>,
    /// Paid units per product, best sellers first
    pub by_product: Vec<ProductSales>,
}

/// One day of sales.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySales {
    /// Calendar day in UTC
    pub date: NaiveDate,
    /// Orders placed that day
    pub orders: usize,
    /// Paid revenue from those orders
    pub revenue: f64,
}

fn is_paid(order: &OrderWithItems) -> bool {
    order.order.payment_confirmed
}

/// Builds a [`SalesSummary`] from already loaded orders.
#[must_use]
pub fn summarize(from: DateTime<Utc>, to: DateTime<Utc>, orders: &[OrderWithItems]) -> SalesSummary {
    let mut payments: HashMap<PaymentType, (usize, f64)> = HashMap::new();
    let mut products: HashMap<i64, ProductSales> = HashMap::new();
    let mut revenue = 0.0;
    let mut paid_orders = 0;

    for order in orders.iter().filter(|o| is_paid(o)) {
        paid_orders += 1;
        revenue += order.order.total;

        if let Some(payment_type) = order.order.payment_type {
            let entry = payments.entry(payment_type).or_default();
            entry.0 += 1;
            entry.1 += order.order.total;
        }

        for line in &order.items {
            let entry = products
                .entry(line.product_id)
                .or_insert_with(|| ProductSales {
                    product_id: line.product_id,
                    name: line.name.clone(),
                    category: line.category.clone(),
                    units: 0,
                    revenue: 0.0,
                });
            entry.units += line.quantity;
            entry.revenue += line.line_total;
        }
    }

    let mut by_payment: Vec<PaymentBreakdown> = payments
        .into_iter()
        .map(|(payment_type, (orders, revenue))| PaymentBreakdown {
            payment_type,
            orders,
            revenue: round_cents(revenue),
        })
        .collect();
    by_payment.sort_by(|a, b| {
        b.revenue
            .total_cmp(&a.revenue)
            .then_with(|| a.payment_type.label().cmp(b.payment_type.label()))
    });

    let mut by_product: Vec<ProductSales> = products
        .into_values()
        .map(|mut sales| {
            sales.revenue = round_cents(sales.revenue);
            sales
        })
        .collect();
    by_product.sort_by(|a, b| {
        b.revenue
            .total_cmp(&a.revenue)
            .then_with(|| b.units.cmp(&a.units))
            .then_with(|| a.name.cmp(&b.name))
    });

    // Cast safety: order counts are far below 2^52
    #[allow(clippy::cast_precision_loss)]
    let average_ticket = if paid_orders == 0 {
        0.0
    } else {
        round_cents(revenue / paid_orders as f64)
    };

    SalesSummary {
        from,
        to,
        order_count: orders.len(),
        paid_orders,
        open_orders: orders.iter().filter(|o| !o.order.dispatched).count(),
        revenue: round_cents(revenue),
        average_ticket,
        by_payment,
        by_product,
    }
}

/// Groups orders by the UTC day they were placed. Days without orders are omitted.
#[must_use]
pub fn group_by_day(orders: &[OrderWithItems]) -> Vec<DailySales> {
    let mut days: BTreeMap<NaiveDate, (usize, f64)> = BTreeMap::new();
    for order in orders {
        let entry = days.entry(order.order.created_at.date_naive()).or_default();
        entry.0 += 1;
        if is_paid(order) {
            entry.1 += order.order.total;
        }
    }

    days.into_iter()
        .map(|(date, (orders, revenue))| DailySales {
            date,
            orders,
            revenue: round_cents(revenue),
        })
        .collect()
}

/// Sales summary for orders placed in `[from, to)`.
pub async fn sales_summary(
    db: &DatabaseConnection,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<SalesSummary> {
    let orders = order_logic::list_orders_between(db, from, to).await?;
    Ok(summarize(from, to, &orders))
}

/// Per-day sales for orders placed in `[from, to)`, oldest day first.
pub async fn daily_sales(
    db: &DatabaseConnection,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<DailySales>> {
    let orders = order_logic::list_orders_between(db, from, to).await?;
    Ok(group_by_day(&orders))
}

/// Formats an amount as pesos with thousands separators, e.g. `$1,234.50`.
#[must_use]
pub fn format_currency(amount: f64) -> String {
    let cents = format!("{:.2}", amount.abs());
    let (whole, fraction) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && cents != "0.00" { "-" } else { "" };
    format!("{sign}${grouped}.{fraction}")
}
