//! Product business logic - Handles all menu-item operations.
//!
//! This module provides functions for creating, retrieving, updating and removing
//! products, plus the stock helpers used by order placement. Stock changes are
//! expressed as single conditional `UPDATE` statements so that concurrent orders
//! can never push a tracked stock count below zero.

use crate::{
    entities::{Product, product},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{ConnectionTrait, QueryOrder, Set, prelude::*, sea_query::Expr};
use tracing::{debug, info, instrument};

/// Fields for a new menu item.
#[derive(Debug, Clone)]
pub struct NewProduct {
    /// Menu name, must be unique
    pub name: String,
    /// Unit price
    pub price: f64,
    /// Menu section
    pub category: String,
    /// Optional description
    pub description: Option<String>,
    /// Optional picture URL
    pub image_url: Option<String>,
    /// Initial stock, `None` when not tracked
    pub stock: Option<i64>,
}

/// Partial update for a menu item. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    /// New name
    pub name: Option<String>,
    /// New unit price
    pub price: Option<f64>,
    /// New menu section
    pub category: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New picture URL
    pub image_url: Option<String>,
}

fn validate_text(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(format!("Product {field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

fn validate_price(price: f64) -> Result<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(Error::InvalidAmount { amount: price });
    }
    Ok(())
}

fn validate_stock(stock: Option<i64>) -> Result<()> {
    match stock {
        Some(units) if units < 0 => Err(Error::InvalidQuantity { quantity: units }),
        _ => Ok(()),
    }
}

fn not_found(product_id: i64) -> Error {
    Error::ProductNotFound {
        name: product_id.to_string(),
    }
}

/// Retrieves every product, ordered alphabetically by name.
pub async fn list_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the customer-facing menu: available products grouped by category, then name.
pub async fn list_menu(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .filter(product::Column::Available.eq(true))
        .order_by_asc(product::Column::Category)
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a product by its unique ID.
pub async fn get_product_by_id(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Option<product::Model>> {
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a product by its exact name.
pub async fn get_product_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<product::Model>> {
    Product::find()
        .filter(product::Column::Name.eq(name.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new product after validating its fields.
///
/// New products are available immediately. A product created with zero tracked
/// stock starts out unavailable.
///
/// # Errors
/// Returns an error if:
/// - The name or category is empty or whitespace-only
/// - The price is negative or not finite
/// - The initial stock is negative
/// - A product with the same name already exists
#[instrument(skip(db, new_product), fields(name = %new_product.name))]
pub async fn create_product(
    db: &DatabaseConnection,
    new_product: NewProduct,
) -> Result<product::Model> {
    let name = validate_text(&new_product.name, "name")?;
    let category = validate_text(&new_product.category, "category")?;
    validate_price(new_product.price)?;
    validate_stock(new_product.stock)?;

    if get_product_by_name(db, &name).await?.is_some() {
        return Err(Error::validation(format!(
            "A product named '{name}' already exists"
        )));
    }

    let now = Utc::now();
    let product = product::ActiveModel {
        name: Set(name),
        price: Set(new_product.price),
        category: Set(category),
        description: Set(new_product.description.filter(|d| !d.trim().is_empty())),
        image_url: Set(new_product.image_url.filter(|u| !u.trim().is_empty())),
        available: Set(new_product.stock.is_none_or(|units| units > 0)),
        stock: Set(new_product.stock),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = product.insert(db).await?;
    info!(product_id = created.id, "Product created");
    Ok(created)
}

/// Applies a partial update to an existing product.
///
/// # Errors
/// Returns an error if any provided field fails validation, the new name
/// collides with another product, or the product does not exist.
#[instrument(skip(db, changes))]
pub async fn update_product(
    db: &DatabaseConnection,
    product_id: i64,
    changes: ProductChanges,
) -> Result<product::Model> {
    let name = changes
        .name
        .as_deref()
        .map(|n| validate_text(n, "name"))
        .transpose()?;
    let category = changes
        .category
        .as_deref()
        .map(|c| validate_text(c, "category"))
        .transpose()?;
    if let Some(price) = changes.price {
        validate_price(price)?;
    }

    let existing = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or_else(|| not_found(product_id))?;

    if let Some(ref new_name) = name {
        if let Some(other) = get_product_by_name(db, new_name).await? {
            if other.id != product_id {
                return Err(Error::validation(format!(
                    "A product named '{new_name}' already exists"
                )));
            }
        }
    }

    let mut product: product::ActiveModel = existing.into();
    if let Some(name) = name {
        product.name = Set(name);
    }
    if let Some(category) = category {
        product.category = Set(category);
    }
    if let Some(price) = changes.price {
        product.price = Set(price);
    }
    if let Some(description) = changes.description {
        product.description = Set(Some(description).filter(|d| !d.trim().is_empty()));
    }
    if let Some(image_url) = changes.image_url {
        product.image_url = Set(Some(image_url).filter(|u| !u.trim().is_empty()));
    }
    product.updated_at = Set(Utc::now());

    product.update(db).await.map_err(Into::into)
}

/// Shows or hides a product on the menu.
#[instrument(skip(db))]
pub async fn set_product_availability(
    db: &DatabaseConnection,
    product_id: i64,
    available: bool,
) -> Result<product::Model> {
    let mut product: product::ActiveModel = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or_else(|| not_found(product_id))?
        .into();

    product.available = Set(available);
    product.updated_at = Set(Utc::now());
    product.update(db).await.map_err(Into::into)
}

/// Adds `amount` units to a product's stock and makes it available again.
///
/// Untracked products start tracking with `amount` units.
///
/// # Errors
/// Returns an error if `amount` is not positive or the product does not exist.
#[instrument(skip(db))]
pub async fn restock_product(
    db: &DatabaseConnection,
    product_id: i64,
    amount: i64,
) -> Result<product::Model> {
    if amount <= 0 {
        return Err(Error::InvalidQuantity { quantity: amount });
    }

    let existing = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or_else(|| not_found(product_id))?;

    if existing.stock.is_some() {
        Product::update_many()
            .col_expr(
                product::Column::Stock,
                Expr::col(product::Column::Stock).add(amount),
            )
            .col_expr(product::Column::Available, Expr::value(true))
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(product_id))
            .exec(db)
            .await?;
    } else {
        let mut product: product::ActiveModel = existing.into();
        product.stock = Set(Some(amount));
        product.available = Set(true);
        product.updated_at = Set(Utc::now());
        product.update(db).await?;
    }

    Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or_else(|| not_found(product_id))
}

/// Sets the stock count outright, or stops tracking it with `None`.
///
/// Setting zero tracked units hides the product; any other value leaves
/// availability untouched.
#[instrument(skip(db))]
pub async fn set_stock(
    db: &DatabaseConnection,
    product_id: i64,
    stock: Option<i64>,
) -> Result<product::Model> {
    validate_stock(stock)?;

    let mut product: product::ActiveModel = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or_else(|| not_found(product_id))?
        .into();

    product.stock = Set(stock);
    if stock == Some(0) {
        product.available = Set(false);
    }
    product.updated_at = Set(Utc::now());
    product.update(db).await.map_err(Into::into)
}

/// Deletes a product. Orders that already contain it keep their copied lines.
#[instrument(skip(db))]
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<product::Model> {
    let product = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or_else(|| not_found(product_id))?;

    Product::delete_by_id(product_id).exec(db).await?;
    info!(product_id, "Product deleted");
    Ok(product)
}

/// Reserves `quantity` units of `product` for an order.
///
/// Untracked products only need to be available. Tracked stock is decremented
/// with `stock = stock - quantity WHERE stock >= quantity`, so the check and the
/// write are one statement. A product that reaches zero is hidden from the menu.
///
/// Must be called inside the transaction that writes the order.
pub(crate) async fn reserve_stock<C>(
    conn: &C,
    product: &product::Model,
    quantity: i64,
) -> Result<()>
where
    C: ConnectionTrait,
{
    if !product.available {
        return Err(Error::ProductUnavailable {
            name: product.name.clone(),
        });
    }
    if product.stock.is_none() {
        return Ok(());
    }

    let result = Product::update_many()
        .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).sub(quantity),
        )
        .filter(product::Column::Id.eq(product.id))
        .filter(product::Column::Stock.gte(quantity))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        let available = Product::find_by_id(product.id)
            .one(conn)
            .await?
            .and_then(|p| p.stock)
            .unwrap_or(0);
        return Err(Error::InsufficientStock {
            name: product.name.clone(),
            available,
            requested: quantity,
        });
    }

    Product::update_many()
        .col_expr(product::Column::Available, Expr::value(false))
        .filter(product::Column::Id.eq(product.id))
        .filter(product::Column::Stock.lte(0))
        .exec(conn)
        .await?;

    debug!(product_id = product.id, quantity, "Stock reserved");
    Ok(())
}

/// Returns `quantity` previously reserved units to a product's stock.
///
/// A product that had sold out becomes available again. Deleted or untracked
/// products are left alone.
pub(crate) async fn release_stock<C>(conn: &C, product_id: i64, quantity: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    if quantity <= 0 {
        return Ok(());
    }

    let result = Product::update_many()
        .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).add(quantity),
        )
        .filter(product::Column::Id.eq(product_id))
        .filter(product::Column::Stock.is_not_null())
        .exec(conn)
        .await?;

    if result.rows_affected > 0 {
        // stock <= quantity means it was at or below zero before the release
        Product::update_many()
            .col_expr(product::Column::Available, Expr::value(true))
            .filter(product::Column::Id.eq(product_id))
            .filter(product::Column::Stock.gt(0))
            .filter(product::Column::Stock.lte(quantity))
            .exec(conn)
            .await?;
        debug!(product_id, quantity, "Stock released");
    }
    Ok(())
}
