//! Product entity - Represents a menu item (platillo).
//!
//! Products are listed on the customer menu while `available` is true. Stock is
//! optional: `None` means the kitchen does not track units for this item, while
//! `Some(n)` is decremented whenever an order reserves it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "productos")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Menu name (e.g., "Tacos al pastor"), unique
    #[sea_orm(unique)]
    pub name: String,
    /// Unit price
    pub price: f64,
    /// Menu section (e.g., "bebidas", "postres")
    pub category: String,
    /// Optional menu description
    pub description: Option<String>,
    /// Optional URL of the product picture
    pub image_url: Option<String>,
    /// Whether the product can currently be ordered
    pub available: bool,
    /// Units in stock, `None` when not tracked
    pub stock: Option<i64>,
    /// When the product was created
    pub created_at: DateTimeUtc,
    /// When the product was last modified
    pub updated_at: DateTimeUtc,
}

/// Order lines copy product fields, so products have no stored relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether an order for `quantity` units could be accepted right now.
    #[must_use]
    pub fn can_serve(&self, quantity: i64) -> bool {
        self.available && self.stock.is_none_or(|stock| stock >= quantity)
    }
}
