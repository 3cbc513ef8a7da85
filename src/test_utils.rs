//! Shared test utilities for Comanda.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{product, table, user},
    entities::{self, Role},
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test product in the "platos fuertes" category.
///
/// `stock` of `None` means the product is not stock-tracked.
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    price: f64,
    stock: Option<i64>,
) -> Result<entities::product::Model> {
    product::create_product(
        db,
        product::NewProduct {
            name: name.to_string(),
            price,
            category: "platos fuertes".to_string(),
            description: None,
            image_url: None,
            stock,
        },
    )
    .await
}

/// Creates an available four-seat test table in the "salón".
pub async fn create_test_table(
    db: &DatabaseConnection,
    number: i32,
) -> Result<entities::dining_table::Model> {
    table::create_table(db, number, 4, "salón".to_string()).await
}

/// Creates an active test user named after the local part of `email`.
pub async fn create_test_user(
    db: &DatabaseConnection,
    email: &str,
    role: Role,
    discord_id: Option<&str>,
) -> Result<entities::user::Model> {
    let name = email.split('@').next().unwrap_or(email).to_string();
    user::create_user(db, email, name, role, discord_id.map(str::to_string)).await
}

/// The small menu most order tests run against.
pub struct TestMenu {
    /// Table 1
    pub table: entities::dining_table::Model,
    /// "Tacos al pastor", 85.00, 5 in stock
    pub tacos: entities::product::Model,
    /// "Agua de jamaica", 30.00, not stock-tracked
    pub drink: entities::product::Model,
}

/// Sets up a test database with one table, one tracked dish and one untracked drink.
pub async fn setup_with_menu() -> Result<(DatabaseConnection, TestMenu)> {
    let db = setup_test_db().await?;
    let table = create_test_table(&db, 1).await?;
    let tacos = create_test_product(&db, "Tacos al pastor", 85.0, Some(5)).await?;
    let drink = product::create_product(
        &db,
        product::NewProduct {
            name: "Agua de jamaica".to_string(),
            price: 30.0,
            category: "bebidas".to_string(),
            description: None,
            image_url: None,
            stock: None,
        },
    )
    .await?;

    Ok((db, TestMenu {
        table,
        tacos,
        drink,
    }))
}
