//! Order line entity - A denormalized copy of a product inside an order.
//!
//! Name, category and price are copied when the line is written so that later
//! menu edits or deletions never rewrite what a customer was charged.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order line database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orden_items")]
pub struct Model {
    /// Unique identifier for the line
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the order this line belongs to
    pub order_id: i64,
    /// ID of the product at order time (may no longer exist)
    pub product_id: i64,
    /// Product name at order time
    pub name: String,
    /// Product category at order time
    pub category: String,
    /// Unit price at order time
    pub price: f64,
    /// Units ordered
    pub quantity: i64,
    /// `price * quantity`
    pub line_total: f64,
}

/// Defines relationships between an order line and its order
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line belongs to one order
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id",
        on_delete = "Cascade"
    )]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
