//! Database configuration module for Comanda.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! models without hand-written SQL. Creation is idempotent (`IF NOT EXISTS`).

use crate::entities::{DiningTable, Order, OrderItem, Product, User};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::{debug, info};

/// Local `SQLite` file used when `DATABASE_URL` is unset; created if missing.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/comanda.sqlite?mode=rwc";

/// Establishes a connection to the database at `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database at {database_url}");
    Database::connect(database_url).await.map_err(Into::into)
}

async fn create_table_for<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all necessary database tables from the entity definitions.
///
/// Orders are created before their lines so the line foreign key resolves.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table_for(db, &schema, Product).await?;
    create_table_for(db, &schema, DiningTable).await?;
    create_table_for(db, &schema, Order).await?;
    create_table_for(db, &schema, OrderItem).await?;
    create_table_for(db, &schema, User).await?;

    info!("Database tables ensured");
    Ok(())
}

/// Creates the directory holding a file-backed `SQLite` database.
fn ensure_parent_dir(database_url: &str) -> Result<()> {
    let Some(rest) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let file = rest.split('?').next().unwrap_or(rest);
    if let Some(parent) = Path::new(file)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Connects and makes sure the schema exists.
pub async fn init_db(database_url: &str) -> Result<DatabaseConnection> {
    ensure_parent_dir(database_url)?;
    let db = create_connection(database_url).await?;
    create_tables(&db).await?;
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        DiningTableModel, OrderItemModel, OrderModel, ProductModel, UserModel,
    };
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<ProductModel> = Product::find().limit(1).all(&db).await?;
        let _: Vec<DiningTableModel> = DiningTable::find().limit(1).all(&db).await?;
        let _: Vec<OrderModel> = Order::find().limit(1).all(&db).await?;
        let _: Vec<OrderItemModel> = OrderItem::find().limit(1).all(&db).await?;
        let _: Vec<UserModel> = User::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_init_db_in_memory() -> Result<()> {
        let db = init_db("sqlite::memory:").await?;
        let _: Vec<ProductModel> = Product::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[test]
    fn test_ensure_parent_dir() -> Result<()> {
        let root = std::env::temp_dir().join(format!("comanda-test-{}", std::process::id()));
        let url = format!("sqlite://{}/nested/db.sqlite?mode=rwc", root.display());

        ensure_parent_dir(&url)?;
        assert!(root.join("nested").is_dir());
        std::fs::remove_dir_all(&root)?;

        // Memory and bare file URLs need no directory
        ensure_parent_dir("sqlite::memory:")?;
        ensure_parent_dir("sqlite://local.sqlite")?;
        Ok(())
    }
}
