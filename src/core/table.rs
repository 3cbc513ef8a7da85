//! Dining table business logic.
//!
//! Tables are created and edited by admins. Their availability flag is also
//! flipped by the order flow: placing an order occupies the table and
//! dispatching or cancelling it frees the table again.

use crate::{
    entities::{DiningTable, Order, dining_table, order},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{ConnectionTrait, PaginatorTrait, QueryOrder, Set, prelude::*, sea_query::Expr};
use tracing::{info, instrument};

/// Partial update for a table. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct TableChanges {
    /// New table number
    pub number: Option<i32>,
    /// New seat count
    pub capacity: Option<i32>,
    /// New location label
    pub location: Option<String>,
}

fn not_found(table: impl ToString) -> Error {
    Error::TableNotFound {
        table: table.to_string(),
    }
}

fn validate_number(number: i32) -> Result<()> {
    if number <= 0 {
        return Err(Error::validation("Table number must be greater than zero"));
    }
    Ok(())
}

fn validate_capacity(capacity: i32) -> Result<()> {
    if capacity <= 0 {
        return Err(Error::validation("Table capacity must be greater than zero"));
    }
    Ok(())
}

/// Retrieves every table, ordered by number.
pub async fn list_tables(db: &DatabaseConnection) -> Result<Vec<dining_table::Model>> {
    DiningTable::find()
        .order_by_asc(dining_table::Column::Number)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the tables customers can currently order at.
pub async fn list_available_tables(db: &DatabaseConnection) -> Result<Vec<dining_table::Model>> {
    DiningTable::find()
        .filter(dining_table::Column::Available.eq(true))
        .order_by_asc(dining_table::Column::Number)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a table by its unique ID.
pub async fn get_table_by_id(
    db: &DatabaseConnection,
    table_id: i64,
) -> Result<Option<dining_table::Model>> {
    DiningTable::find_by_id(table_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a table by the number shown on it.
pub async fn get_table_by_number(
    db: &DatabaseConnection,
    number: i32,
) -> Result<Option<dining_table::Model>> {
    DiningTable::find()
        .filter(dining_table::Column::Number.eq(number))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new, available table.
///
/// # Errors
/// Returns an error if the number or capacity is not positive, or if a table
/// with the same number already exists.
#[instrument(skip(db))]
pub async fn create_table(
    db: &DatabaseConnection,
    number: i32,
    capacity: i32,
    location: String,
) -> Result<dining_table::Model> {
    validate_number(number)?;
    validate_capacity(capacity)?;

    if get_table_by_number(db, number).await?.is_some() {
        return Err(Error::DuplicateTable { number });
    }

    let now = Utc::now();
    let table = dining_table::ActiveModel {
        number: Set(number),
        capacity: Set(capacity),
        location: Set(location.trim().to_string()),
        available: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = table.insert(db).await?;
    info!(table_id = created.id, number, "Table created");
    Ok(created)
}

/// Applies a partial update to a table.
#[instrument(skip(db, changes))]
pub async fn update_table(
    db: &DatabaseConnection,
    table_id: i64,
    changes: TableChanges,
) -> Result<dining_table::Model> {
    if let Some(number) = changes.number {
        validate_number(number)?;
    }
    if let Some(capacity) = changes.capacity {
        validate_capacity(capacity)?;
    }

    let existing = DiningTable::find_by_id(table_id)
        .one(db)
        .await?
        .ok_or_else(|| not_found(table_id))?;

    if let Some(number) = changes.number {
        let clash = get_table_by_number(db, number).await?;
        if clash.is_some_and(|other| other.id != table_id) {
            return Err(Error::DuplicateTable { number });
        }
    }

    let mut table: dining_table::ActiveModel = existing.into();
    if let Some(number) = changes.number {
        table.number = Set(number);
    }
    if let Some(capacity) = changes.capacity {
        table.capacity = Set(capacity);
    }
    if let Some(location) = changes.location {
        table.location = Set(location.trim().to_string());
    }
    table.updated_at = Set(Utc::now());

    table.update(db).await.map_err(Into::into)
}

/// Marks a table as available or occupied by hand.
#[instrument(skip(db))]
pub async fn set_table_availability(
    db: &DatabaseConnection,
    table_id: i64,
    available: bool,
) -> Result<dining_table::Model> {
    let mut table: dining_table::ActiveModel = DiningTable::find_by_id(table_id)
        .one(db)
        .await?
        .ok_or_else(|| not_found(table_id))?
        .into();

    table.available = Set(available);
    table.updated_at = Set(Utc::now());
    table.update(db).await.map_err(Into::into)
}

/// Deletes a table that has no open order.
///
/// # Errors
/// Returns [`Error::Validation`] while an undispatched order is still on the table.
#[instrument(skip(db))]
pub async fn delete_table(db: &DatabaseConnection, table_id: i64) -> Result<dining_table::Model> {
    let table = DiningTable::find_by_id(table_id)
        .one(db)
        .await?
        .ok_or_else(|| not_found(table_id))?;

    let open_orders = Order::find()
        .filter(order::Column::TableId.eq(table_id))
        .filter(order::Column::Dispatched.eq(false))
        .count(db)
        .await?;
    if open_orders > 0 {
        return Err(Error::validation(format!(
            "Table {} still has {open_orders} open order(s)",
            table.number
        )));
    }

    DiningTable::delete_by_id(table_id).exec(db).await?;
    info!(table_id, "Table deleted");
    Ok(table)
}

/// Occupies a table for a new order; fails if someone else got there first.
///
/// Must be called inside the transaction that writes the order.
pub(crate) async fn occupy_table<C>(conn: &C, table: &dining_table::Model) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = DiningTable::update_many()
        .col_expr(dining_table::Column::Available, Expr::value(false))
        .col_expr(dining_table::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(dining_table::Column::Id.eq(table.id))
        .filter(dining_table::Column::Available.eq(true))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::TableUnavailable {
            number: table.number,
        });
    }
    Ok(())
}

/// Frees a table. Missing tables are ignored since orders outlive them.
pub(crate) async fn release_table<C>(conn: &C, table_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    DiningTable::update_many()
        .col_expr(dining_table::Column::Available, Expr::value(true))
        .col_expr(dining_table::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(dining_table::Column::Id.eq(table_id))
        .exec(conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_table_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_table(&db, 0, 4, "salón".to_string()).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = create_table(&db, 3, -2, "salón".to_string()).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_and_find_table() -> Result<()> {
        let db = setup_test_db().await?;
        let table = create_table(&db, 7, 6, "  terraza ".to_string()).await?;

        assert_eq!(table.number, 7);
        assert_eq!(table.location, "terraza");
        assert!(table.available);

        let found = get_table_by_number(&db, 7).await?.unwrap();
        assert_eq!(found.id, table.id);
        assert!(get_table_by_number(&db, 8).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_table_number() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_table(&db, 1).await?;

        let result = create_table(&db, 1, 2, String::new()).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::DuplicateTable { number: 1 }
        ));

        let second = create_test_table(&db, 2).await?;
        let result = update_table(
            &db,
            second.id,
            TableChanges {
                number: Some(1),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::DuplicateTable { number: 1 }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_table() -> Result<()> {
        let db = setup_test_db().await?;
        let table = create_test_table(&db, 1).await?;

        let updated = update_table(
            &db,
            table.id,
            TableChanges {
                capacity: Some(8),
                location: Some("patio".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(updated.number, 1);
        assert_eq!(updated.capacity, 8);
        assert_eq!(updated.location, "patio");
        Ok(())
    }

    #[tokio::test]
    async fn test_list_available_tables() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_test_table(&db, 2).await?;
        let second = create_test_table(&db, 1).await?;
        set_table_availability(&db, first.id, false).await?;

        let all = list_tables(&db).await?;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);

        let available = list_available_tables(&db).await?;
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, second.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_occupy_table_twice_fails() -> Result<()> {
        let db = setup_test_db().await?;
        let table = create_test_table(&db, 4).await?;

        occupy_table(&db, &table).await?;
        let result = occupy_table(&db, &table).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::TableUnavailable { number: 4 }
        ));

        release_table(&db, table.id).await?;
        assert!(get_table_by_id(&db, table.id).await?.unwrap().available);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_table_with_open_order_refused() -> Result<()> {
        let (db, menu) = setup_with_menu().await?;
        crate::core::order::place_order(
            &db,
            crate::core::order::NewOrder {
                table_id: menu.table.id,
                items: vec![crate::core::order::OrderLineRequest {
                    product_id: menu.drink.id,
                    quantity: 1,
                }],
                notes: None,
            },
        )
        .await?;

        let result = delete_table(&db, menu.table.id).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let spare = create_test_table(&db, 99).await?;
        delete_table(&db, spare.id).await?;
        assert!(get_table_by_id(&db, spare.id).await?.is_none());
        Ok(())
    }
}
