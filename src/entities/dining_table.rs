//! Dining table entity - Represents a restaurant table (mesa).
//!
//! A table is unavailable from the moment an order is placed on it until that
//! order is dispatched or cancelled. Admins can also toggle availability by hand.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Dining table database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mesas")]
pub struct Model {
    /// Unique identifier for the table
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Number shown on the table, unique
    #[sea_orm(unique)]
    pub number: i32,
    /// Number of seats
    pub capacity: i32,
    /// Free-form location (e.g., "terraza", "salón")
    pub location: String,
    /// Whether customers can be seated and order here
    pub available: bool,
    /// When the table was created
    pub created_at: DateTimeUtc,
    /// When the table was last modified
    pub updated_at: DateTimeUtc,
}

/// Orders keep a copy of the table number, so tables have no stored relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
