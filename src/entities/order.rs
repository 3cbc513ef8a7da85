//! Order entity - Represents a customer order (orden) placed on a table.
//!
//! Progress is tracked through independent flags rather than a single status
//! column: `ready` (lista), `picked_up` (recogido), `payment_confirmed`
//! (confirmarPago), `completed` (completado) and `dispatched` (pedidoDespachado).
//! Each flag has a companion timestamp recording when it was set.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How an order was paid
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum PaymentType {
    /// Efectivo
    #[sea_orm(string_value = "efectivo")]
    #[serde(rename = "efectivo")]
    Cash,
    /// Tarjeta
    #[sea_orm(string_value = "tarjeta")]
    #[serde(rename = "tarjeta")]
    Card,
    /// Transferencia
    #[sea_orm(string_value = "transferencia")]
    #[serde(rename = "transferencia")]
    Transfer,
}

impl PaymentType {
    /// Stored label, as shown to staff.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cash => "efectivo",
            Self::Card => "tarjeta",
            Self::Transfer => "transferencia",
        }
    }
}

/// Order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ordenes")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the table the order was placed on
    pub table_id: i64,
    /// Table number at the time the order was placed
    pub table_number: i32,
    /// Sum of all line totals
    pub total: f64,
    /// Set once payment is confirmed
    pub payment_type: Option<PaymentType>,
    /// Free-form notes for the kitchen
    pub notes: Option<String>,
    /// Kitchen finished preparing the order
    pub ready: bool,
    /// Waiter picked the order up from the kitchen
    pub picked_up: bool,
    /// Payment received
    pub payment_confirmed: bool,
    /// Order closed
    pub completed: bool,
    /// Table released
    pub dispatched: bool,
    /// When the kitchen marked the order ready
    pub ready_at: Option<DateTimeUtc>,
    /// When the waiter picked the order up
    pub picked_up_at: Option<DateTimeUtc>,
    /// When payment was confirmed
    pub paid_at: Option<DateTimeUtc>,
    /// When the order was completed
    pub completed_at: Option<DateTimeUtc>,
    /// When the table was released
    pub dispatched_at: Option<DateTimeUtc>,
    /// When the order was placed
    pub created_at: DateTimeUtc,
    /// When the order was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One order has many lines
    #[sea_orm(has_many = "super::order_item::Entity")]
    Items,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
