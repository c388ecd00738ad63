//! # Settings Repository
//!
//! The single shop-info row that feeds the bill header.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use till_core::{ShopInfo, ValidationError};

/// Upper bound on decimal places for the grand total.
pub const MAX_CURRENCY_PRECISION: u32 = 6;

#[derive(Debug, sqlx::FromRow)]
struct ShopInfoRow {
    name: String,
    tagline: String,
    address: String,
    phone: String,
    email: String,
    currency_symbol: String,
    currency_precision: i64,
}

impl TryFrom<ShopInfoRow> for ShopInfo {
    type Error = DbError;

    fn try_from(row: ShopInfoRow) -> DbResult<Self> {
        Ok(ShopInfo {
            currency_precision: u32::try_from(row.currency_precision)
                .map_err(|e| DbError::invalid_data("shop_info.currency_precision", e))?,
            name: row.name,
            tagline: row.tagline,
            address: row.address,
            phone: row.phone,
            email: row.email,
            currency_symbol: row.currency_symbol,
        })
    }
}

/// Repository for shop settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Loads the shop info. The migration seeds the row, so it always exists.
    pub async fn get_shop_info(&self) -> DbResult<ShopInfo> {
        let row = sqlx::query_as::<_, ShopInfoRow>(
            r#"
            SELECT name, tagline, address, phone, email, currency_symbol, currency_precision
            FROM shop_info
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => ShopInfo::try_from(row),
            None => {
                debug!("shop_info row missing, using defaults");
                Ok(ShopInfo::default())
            }
        }
    }

    /// Replaces the shop info.
    pub async fn update_shop_info(&self, shop: &ShopInfo) -> DbResult<()> {
        if shop.name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "name".to_string(),
            }
            .into());
        }
        if shop.currency_precision > MAX_CURRENCY_PRECISION {
            return Err(ValidationError::InvalidFormat {
                field: "currency_precision".to_string(),
                reason: format!("must be at most {}", MAX_CURRENCY_PRECISION),
            }
            .into());
        }

        sqlx::query(
            r#"
            INSERT INTO shop_info (
                id, name, tagline, address, phone, email,
                currency_symbol, currency_precision, updated_at
            ) VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                tagline = excluded.tagline,
                address = excluded.address,
                phone = excluded.phone,
                email = excluded.email,
                currency_symbol = excluded.currency_symbol,
                currency_precision = excluded.currency_precision,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(shop.name.trim())
        .bind(&shop.tagline)
        .bind(&shop.address)
        .bind(&shop.phone)
        .bind(&shop.email)
        .bind(&shop.currency_symbol)
        .bind(i64::from(shop.currency_precision))
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        info!(name = %shop.name, "Shop info updated");
        Ok(())
    }
}
