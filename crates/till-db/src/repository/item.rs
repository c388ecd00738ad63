//! # Item Repository
//!
//! Database operations for the item catalog.
//!
//! ## Key Operations
//! - Lookup by code (every scan goes through here)
//! - CRUD for catalog management
//!
//! The billing engine only ever reads the catalog. Prices changed here do
//! not reach lines that are already in an open cart.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::decode_money;
use crate::repository::settings::SettingsRepository;
use till_core::validation::{validate_item_code, validate_item_name, validate_price};
use till_core::{Item, ItemCatalog, StoreError};

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    item_code: String,
    name: String,
    price: String,
}

impl TryFrom<ItemRow> for Item {
    type Error = DbError;

    fn try_from(row: ItemRow) -> DbResult<Self> {
        Ok(Item {
            unit_price: decode_money("items.price", &row.price)?,
            code: row.item_code,
            name: row.name,
        })
    }
}

/// Repository for catalog database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.items();
///
/// repo.insert(&Item::new("SHIRT01", "Linen Shirt", Money::from_cents(79900))).await?;
/// let item = repo.get_by_code("SHIRT01").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Gets an item by its code.
    ///
    /// ## Returns
    /// * `Ok(Some(Item))` - Item found
    /// * `Ok(None)` - Unknown code
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Item>> {
        let row = sqlx::query_as::<_, ItemRow>(
            "SELECT item_code, name, price FROM items WHERE item_code = ?1",
        )
        .bind(code.trim())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Item::try_from).transpose()
    }

    /// Lists all items ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            "SELECT item_code, name, price FROM items ORDER BY name, item_code",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed items");
        rows.into_iter().map(Item::try_from).collect()
    }

    /// Inserts a new item.
    ///
    /// ## Returns
    /// * `Err(DbError::Validation)` - Bad code or name, or a price the shop
    ///   currency cannot represent
    /// * `Err(DbError::UniqueViolation)` - Code already exists
    pub async fn insert(&self, item: &Item) -> DbResult<()> {
        self.validate(item).await?;
        debug!(code = %item.code, "Inserting item");

        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO items (item_code, name, price, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            "#,
        )
        .bind(item.code.trim())
        .bind(item.name.trim())
        .bind(item.unit_price.to_storage())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, item.code.trim()),
            other => other,
        })?;

        Ok(())
    }

    /// Updates the name and price of an existing item.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Code doesn't exist
    pub async fn update(&self, item: &Item) -> DbResult<()> {
        self.validate(item).await?;
        debug!(code = %item.code, price = %item.unit_price, "Updating item");

        let result = sqlx::query(
            r#"
            UPDATE items SET
                name = ?2,
                price = ?3,
                updated_at = ?4
            WHERE item_code = ?1
            "#,
        )
        .bind(item.code.trim())
        .bind(item.name.trim())
        .bind(item.unit_price.to_storage())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", &item.code));
        }

        Ok(())
    }

    /// Deletes an item.
    ///
    /// Persisted bills keep their own copy of the code, name and price,
    /// so deleting a catalog entry never alters history.
    pub async fn delete(&self, code: &str) -> DbResult<()> {
        debug!(code = %code, "Deleting item");

        let result = sqlx::query("DELETE FROM items WHERE item_code = ?1")
            .bind(code.trim())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", code));
        }

        Ok(())
    }

    /// Counts catalog items (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Checks an item against the field rules and the shop's currency precision.
    async fn validate(&self, item: &Item) -> DbResult<()> {
        validate_item_code(&item.code)?;
        validate_item_name(&item.name)?;

        let precision = SettingsRepository::new(self.pool.clone())
            .get_shop_info()
            .await?
            .currency_precision;
        validate_price(item.unit_price, precision)?;
        Ok(())
    }
}

impl ItemCatalog for ItemRepository {
    async fn lookup(&self, code: &str) -> Result<Option<Item>, StoreError> {
        Ok(self.get_by_code(code).await?)
    }
}

// =============================================================================
// Tests
// =============================================================================
