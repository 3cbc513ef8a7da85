//! Initial data loading from config.toml
//!
//! The restaurant's starting menu, tables and staff are described in a TOML
//! file. On startup every entry that does not exist yet is created; entries that
//! already exist (matched by product name, table number or user email) are left
//! untouched so admin edits made later are never overwritten.

use crate::{
    core::{product, table, user},
    entities::Role,
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// General restaurant settings
    #[serde(default)]
    pub restaurant: RestaurantConfig,
    /// Menu items to seed
    #[serde(default)]
    pub products: Vec<ProductConfig>,
    /// Dining tables to seed
    #[serde(default)]
    pub tables: Vec<TableConfig>,
    /// Staff accounts to seed
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

/// General restaurant settings
#[derive(Debug, Deserialize, Clone)]
pub struct RestaurantConfig {
    /// Name shown in bot replies
    pub name: String,
}

impl Default for RestaurantConfig {
    fn default() -> Self {
        Self {
            name: "Comanda".to_string(),
        }
    }
}

/// Configuration for a single menu item
#[derive(Debug, Deserialize, Clone)]
pub struct ProductConfig {
    /// Menu name
    pub name: String,
    /// Unit price
    pub price: f64,
    /// Menu section
    pub category: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Optional picture URL
    #[serde(default)]
    pub image_url: Option<String>,
    /// Initial stock, omitted when not tracked
    #[serde(default)]
    pub stock: Option<i64>,
}

/// Configuration for a single dining table
#[derive(Debug, Deserialize, Clone)]
pub struct TableConfig {
    /// Table number
    pub number: i32,
    /// Seats
    pub capacity: i32,
    /// Location label
    #[serde(default)]
    pub location: String,
}

/// Configuration for a single staff account
#[derive(Debug, Deserialize, Clone)]
pub struct UserConfig {
    /// Login email
    pub email: String,
    /// Display name
    pub name: String,
    /// `administrador`, `mesero` or `cocinero`
    pub role: Role,
    /// Discord user ID to link
    #[serde(default)]
    pub discord_id: Option<String>,
}

/// Counts of what a seeding run created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Products created
    pub products: usize,
    /// Tables created
    pub tables: usize,
    /// Users created
    pub users: usize,
}

/// Loads the configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    debug!("Loading configuration from {}", path.display());
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path.display()),
    })
}

/// Loads configuration from `path`, or an empty configuration when the file does not exist.
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<Config> {
    if path.as_ref().exists() {
        load_config(path)
    } else {
        info!(
            "No configuration file at {}, starting with an empty restaurant",
            path.as_ref().display()
        );
        Ok(Config::default())
    }
}

/// Creates every configured product, table and user that does not exist yet.
#[instrument(skip_all)]
pub async fn seed_database(db: &DatabaseConnection, config: &Config) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    for entry in &config.products {
        if product::get_product_by_name(db, &entry.name).await?.is_some() {
            continue;
        }
        product::create_product(
            db,
            product::NewProduct {
                name: entry.name.clone(),
                price: entry.price,
                category: entry.category.clone(),
                description: entry.description.clone(),
                image_url: entry.image_url.clone(),
                stock: entry.stock,
            },
        )
        .await?;
        summary.products += 1;
    }

    for entry in &config.tables {
        if table::get_table_by_number(db, entry.number).await?.is_some() {
            continue;
        }
        table::create_table(db, entry.number, entry.capacity, entry.location.clone()).await?;
        summary.tables += 1;
    }

    for entry in &config.users {
        if user::get_user_by_email(db, &entry.email).await?.is_some() {
            continue;
        }
        user::create_user(
            db,
            &entry.email,
            entry.name.clone(),
            entry.role,
            entry.discord_id.clone(),
        )
        .await?;
        summary.users += 1;
    }

    info!(
        products = summary.products,
        tables = summary.tables,
        users = summary.users,
        "Seeding finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::setup_test_db;

    const SAMPLE: &str = r#"
        [restaurant]
        name = "La Cocina"

        [[products]]
        name = "Tacos al pastor"
        price = 85.0
        category = "platos fuertes"
        stock = 40

        [[products]]
        name = "Agua de jamaica"
        price = 30.0
        category = "bebidas"

        [[tables]]
        number = 1
        capacity = 4
        location = "terraza"

        [[users]]
        email = "Admin@LaCocina.mx"
        name = "Ana"
        role = "administrador"
        discord_id = "1234"
    "#;

    #[test]
    fn test_parse_config() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.restaurant.name, "La Cocina");
        assert_eq!(config.products.len(), 2);
        assert_eq!(config.products[0].stock, Some(40));
        assert_eq!(config.products[1].stock, None);
        assert_eq!(config.tables[0].capacity, 4);
        assert_eq!(config.users[0].role, Role::Administrator);
    }

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.restaurant.name, "Comanda");
        assert!(config.products.is_empty());
    }

    #[test]
    fn test_parse_rejects_unknown_role() {
        let result: std::result::Result<Config, _> = toml::from_str(
            r#"
            [[users]]
            email = "x@y.z"
            name = "X"
            role = "gerente"
            "#,
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_seed_database_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let config: Config = toml::from_str(SAMPLE).unwrap();

        let first = seed_database(&db, &config).await?;
        assert_eq!(
            first,
            SeedSummary {
                products: 2,
                tables: 1,
                users: 1
            }
        );

        let second = seed_database(&db, &config).await?;
        assert_eq!(second, SeedSummary::default());

        let admin = user::get_user_by_email(&db, "admin@lacocina.mx").await?.unwrap();
        assert_eq!(admin.discord_id.as_deref(), Some("1234"));
        Ok(())
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let result = load_config("definitely/not/here.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
