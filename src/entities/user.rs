//! User entity - Represents a staff member (usuario).
//!
//! The role string gates what a staff member may do from the bot. Customers do
//! not have user records.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Staff role
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum Role {
    /// Full access, including menu, tables, staff and reports
    #[sea_orm(string_value = "administrador")]
    #[serde(rename = "administrador")]
    Administrator,
    /// Serves tables: payments, pickups, dispatch
    #[sea_orm(string_value = "mesero")]
    #[serde(rename = "mesero")]
    Waiter,
    /// Works the kitchen queue
    #[sea_orm(string_value = "cocinero")]
    #[serde(rename = "cocinero")]
    Cook,
}

impl Role {
    /// Stored label, as shown to staff.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Administrator => "administrador",
            Self::Waiter => "mesero",
            Self::Cook => "cocinero",
        }
    }
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "usuarios")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login email, stored lower-cased, unique
    #[sea_orm(unique)]
    pub email: String,
    /// Display name
    pub name: String,
    /// What the user is allowed to do
    pub role: Role,
    /// Inactive users are refused everywhere
    pub active: bool,
    /// Discord user ID linked to this staff member
    pub discord_id: Option<String>,
    /// When the user was created
    pub created_at: DateTimeUtc,
    /// When the user was last modified
    pub updated_at: DateTimeUtc,
}

/// `User` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
