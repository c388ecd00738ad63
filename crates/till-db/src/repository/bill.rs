//! # Bill Repository
//!
//! Database operations for committed bills.
//!
//! ## Commit Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  next_bill_id()            UPDATE bill_sequence ... RETURNING value     │
//! │       │                    (own autocommit: an id is never handed out   │
//! │       │                     twice, even if the bill below fails)        │
//! │       ▼                                                                 │
//! │  persist_bill(&bill)       BEGIN                                        │
//! │                              INSERT INTO bills ...                      │
//! │                              INSERT INTO bill_items ... (× lines)       │
//! │                            COMMIT   (any error → ROLLBACK, nothing kept)│
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::{decode_money, decode_timestamp, encode_timestamp};
use till_core::{Bill, BillLine, BillStore, BillSummary, Money, PaymentMethod, StoreError};

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct BillRow {
    bill_id: i64,
    bill_number: String,
    created_at: String,
    payment_method: String,
    operator: String,
    total: String,
    line_count: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct BillLineRow {
    bill_id: i64,
    line_no: i64,
    item_code: String,
    name: String,
    quantity: i64,
    unit_price: String,
    line_total: String,
}

impl TryFrom<BillRow> for BillSummary {
    type Error = DbError;

    fn try_from(row: BillRow) -> DbResult<Self> {
        Ok(BillSummary {
            bill_id: row.bill_id,
            created_at: decode_timestamp("bills.created_at", &row.created_at)?,
            payment_method: decode_payment_method(&row.payment_method)?,
            total: decode_money("bills.total", &row.total)?,
            line_count: u32::try_from(row.line_count)
                .map_err(|e| DbError::invalid_data("line_count", e))?,
            bill_number: row.bill_number,
            operator: row.operator,
        })
    }
}

impl TryFrom<BillLineRow> for BillLine {
    type Error = DbError;

    fn try_from(row: BillLineRow) -> DbResult<Self> {
        Ok(BillLine {
            bill_id: row.bill_id,
            line_no: u32::try_from(row.line_no)
                .map_err(|e| DbError::invalid_data("bill_items.line_no", e))?,
            quantity: u32::try_from(row.quantity)
                .map_err(|e| DbError::invalid_data("bill_items.quantity", e))?,
            unit_price: decode_money("bill_items.unit_price", &row.unit_price)?,
            line_total: decode_money("bill_items.line_total", &row.line_total)?,
            item_code: row.item_code,
            name: row.name,
        })
    }
}

fn decode_payment_method(raw: &str) -> DbResult<PaymentMethod> {
    raw.parse()
        .map_err(|e| DbError::invalid_data("bills.payment_method", e))
}

const SUMMARY_COLUMNS: &str = r#"
    SELECT
        b.bill_id,
        b.bill_number,
        b.created_at,
        b.payment_method,
        b.operator,
        b.total,
        (SELECT COUNT(*) FROM bill_items i WHERE i.bill_id = b.bill_id) AS line_count
    FROM bills b
"#;

// =============================================================================
// Daily Summary
// =============================================================================

/// Sales figures for one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub bill_count: u32,
    /// Exact sum of bill totals.
    pub revenue: Money,
    pub cash: Money,
    pub upi: Money,
    pub card: Money,
}

impl DailySummary {
    fn empty(date: NaiveDate) -> Self {
        DailySummary {
            date,
            bill_count: 0,
            revenue: Money::zero(),
            cash: Money::zero(),
            upi: Money::zero(),
            card: Money::zero(),
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for bill database operations.
#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: SqlitePool,
}

impl BillRepository {
    /// Creates a new BillRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BillRepository { pool }
    }

    /// Allocates the next bill id from the durable sequence.
    pub async fn allocate_id(&self) -> DbResult<i64> {
        let id: i64 = sqlx::query_scalar(
            "UPDATE bill_sequence SET value = value + 1 WHERE id = 1 RETURNING value",
        )
        .fetch_one(&self.pool)
        .await?;

        debug!(bill_id = id, "Allocated bill id");
        Ok(id)
    }

    /// Writes the bill header and every line in one transaction.
    ///
    /// ## Returns
    /// * `Ok(())` - Bill and all lines are durable
    /// * `Err(_)` - Nothing was written
    pub async fn insert(&self, bill: &Bill) -> DbResult<()> {
        debug!(
            bill_id = bill.bill_id,
            lines = bill.lines.len(),
            total = %bill.total,
            "Persisting bill"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO bills (bill_id, bill_number, created_at, payment_method, operator, total)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(bill.bill_id)
        .bind(bill.bill_number())
        .bind(encode_timestamp(&bill.created_at))
        .bind(bill.payment_method.as_str())
        .bind(&bill.operator)
        .bind(bill.total.to_storage())
        .execute(&mut *tx)
        .await?;

        for line in &bill.lines {
            sqlx::query(
                r#"
                INSERT INTO bill_items (
                    bill_id, line_no, item_code, name, quantity, unit_price, line_total
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(bill.bill_id)
            .bind(i64::from(line.line_no))
            .bind(&line.item_code)
            .bind(&line.name)
            .bind(i64::from(line.quantity))
            .bind(line.unit_price.to_storage())
            .bind(line.line_total.to_storage())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(bill_id = bill.bill_id, bill_number = %bill.bill_number(), "Bill persisted");
        Ok(())
    }

    /// Loads a bill with all of its lines.
    pub async fn get_by_id(&self, bill_id: i64) -> DbResult<Option<Bill>> {
        let sql = format!("{} WHERE b.bill_id = ?1", SUMMARY_COLUMNS);
        let row = sqlx::query_as::<_, BillRow>(&sql)
            .bind(bill_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let summary = BillSummary::try_from(row)?;
        let lines = self.get_lines(bill_id).await?;

        Ok(Some(Bill {
            bill_id: summary.bill_id,
            created_at: summary.created_at,
            payment_method: summary.payment_method,
            operator: summary.operator,
            total: summary.total,
            lines,
        }))
    }

    /// Lines of a bill in line order.
    pub async fn get_lines(&self, bill_id: i64) -> DbResult<Vec<BillLine>> {
        let rows = sqlx::query_as::<_, BillLineRow>(
            r#"
            SELECT bill_id, line_no, item_code, name, quantity, unit_price, line_total
            FROM bill_items
            WHERE bill_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(bill_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BillLine::try_from).collect()
    }

    /// Bills created on the days `from..=to` (UTC), newest first.
    pub async fn list_by_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<BillSummary>> {
        let start = day_start(from);
        let end = day_start(to) + Duration::days(1);
        debug!(%from, %to, "Listing bills by date range");

        let sql = format!(
            "{} WHERE b.created_at >= ?1 AND b.created_at < ?2 ORDER BY b.created_at DESC, b.bill_id DESC",
            SUMMARY_COLUMNS
        );
        let rows = sqlx::query_as::<_, BillRow>(&sql)
            .bind(encode_timestamp(&start))
            .bind(encode_timestamp(&end))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(BillSummary::try_from).collect()
    }

    /// The most recent bills, newest first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<BillSummary>> {
        let sql = format!(
            "{} ORDER BY b.created_at DESC, b.bill_id DESC LIMIT ?1",
            SUMMARY_COLUMNS
        );
        let rows = sqlx::query_as::<_, BillRow>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(BillSummary::try_from).collect()
    }

    /// Bill count and revenue for one day, split by payment method.
    ///
    /// Totals are summed here rather than with SQL `SUM`, which would
    /// convert the decimal text to floating point.
    pub async fn daily_summary(&self, date: NaiveDate) -> DbResult<DailySummary> {
        let bills = self.list_by_date_range(date, date).await?;

        let mut summary = DailySummary::empty(date);
        for bill in &bills {
            summary.bill_count += 1;
            summary.revenue += bill.total;
            match bill.payment_method {
                PaymentMethod::Cash => summary.cash += bill.total,
                PaymentMethod::Upi => summary.upi += bill.total,
                PaymentMethod::Card => summary.card += bill.total,
            }
        }
        Ok(summary)
    }

    /// Number of persisted bills.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bills")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Deletes every bill and bill line. Administrative only.
    ///
    /// The id sequence is left untouched so purged ids are never reissued.
    pub async fn purge_all(&self) -> DbResult<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query("DELETE FROM bill_items").execute(&mut *tx).await?;
        let deleted = sqlx::query("DELETE FROM bills")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        warn!(deleted, "All bills purged");
        Ok(deleted)
    }
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

impl BillStore for BillRepository {
    async fn next_bill_id(&self) -> Result<i64, StoreError> {
        Ok(self.allocate_id().await?)
    }

    async fn persist_bill(&self, bill: &Bill) -> Result<(), StoreError> {
        Ok(self.insert(bill).await?)
    }

    async fn load_bill(&self, bill_id: i64) -> Result<Option<Bill>, StoreError> {
        Ok(self.get_by_id(bill_id).await?)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::TimeZone;

    async fn repo() -> BillRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().bills()
    }

    fn line(bill_id: i64, line_no: u32, code: &str, qty: u32, price: &str) -> BillLine {
        let unit_price = Money::parse(price).unwrap();
        BillLine {
            bill_id,
            line_no,
            item_code: code.to_string(),
            name: format!("Item {}", code),
            quantity: qty,
            unit_price,
            line_total: unit_price.multiply_quantity(qty),
        }
    }

    fn bill(bill_id: i64, created_at: DateTime<Utc>, method: PaymentMethod) -> Bill {
        let lines = vec![
            line(bill_id, 1, "SHIRT01", 2, "10.00"),
            line(bill_id, 2, "CAP01", 1, "25.00"),
        ];
        Bill {
            bill_id,
            created_at,
            payment_method: method,
            operator: "staff".to_string(),
            total: lines.iter().map(|l| l.line_total).sum(),
            lines,
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_ids_strictly_increase() {
        let repo = repo().await;
        let a = repo.allocate_id().await.unwrap();
        let b = repo.allocate_id().await.unwrap();
        let c = repo.next_bill_id().await.unwrap();
        assert!(a < b && b < c);
        assert_eq!(a, 1);
    }

    #[tokio::test]
    async fn test_persist_and_load_roundtrip() {
        let repo = repo().await;
        let id = repo.allocate_id().await.unwrap();
        let original = bill(id, Utc::now(), PaymentMethod::Upi);

        repo.persist_bill(&original).await.unwrap();
        let loaded = repo.load_bill(id).await.unwrap().unwrap();

        assert_eq!(loaded, original);
        assert_eq!(loaded.lines_total(), loaded.total);
        assert!(repo.load_bill(id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_nothing() {
        let repo = repo().await;
        let id = repo.allocate_id().await.unwrap();
        let mut broken = bill(id, at(15, 10), PaymentMethod::Cash);
        // Duplicate line number violates the primary key on the second insert
        broken.lines[1].line_no = 1;

        let err = repo.persist_bill(&broken).await.unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));

        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(repo.get_lines(id).await.unwrap().is_empty());

        // The failed id is not reused
        assert!(repo.allocate_id().await.unwrap() > id);
    }

    #[tokio::test]
    async fn test_duplicate_bill_id_rejected() {
        let repo = repo().await;
        let original = bill(5, at(15, 10), PaymentMethod::Card);
        repo.insert(&original).await.unwrap();

        assert!(matches!(
            repo.insert(&original).await,
            Err(DbError::UniqueViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_by_date_range_newest_first() {
        let repo = repo().await;
        repo.insert(&bill(1, at(14, 23), PaymentMethod::Cash)).await.unwrap();
        repo.insert(&bill(2, at(15, 9), PaymentMethod::Upi)).await.unwrap();
        repo.insert(&bill(3, at(15, 18), PaymentMethod::Card)).await.unwrap();
        repo.insert(&bill(4, at(16, 0), PaymentMethod::Cash)).await.unwrap();

        let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let bills = repo.list_by_date_range(day, day).await.unwrap();
        let ids: Vec<_> = bills.iter().map(|b| b.bill_id).collect();
        assert_eq!(ids, [3, 2]);
        assert_eq!(bills[0].line_count, 2);
        assert_eq!(bills[0].bill_number, "BILL202403150003");

        let all = repo
            .list_by_date_range(day.pred_opt().unwrap(), day.succ_opt().unwrap())
            .await
            .unwrap();
        assert_eq!(all.len(), 4);

        let recent = repo.list_recent(2).await.unwrap();
        assert_eq!(recent.iter().map(|b| b.bill_id).collect::<Vec<_>>(), [4, 3]);
    }

    #[tokio::test]
    async fn test_daily_summary() {
        let repo = repo().await;
        repo.insert(&bill(1, at(15, 9), PaymentMethod::Cash)).await.unwrap();
        repo.insert(&bill(2, at(15, 12), PaymentMethod::Upi)).await.unwrap();
        repo.insert(&bill(3, at(16, 12), PaymentMethod::Upi)).await.unwrap();

        let summary = repo
            .daily_summary(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
            .await
            .unwrap();
        assert_eq!(summary.bill_count, 2);
        assert_eq!(summary.revenue, Money::from_cents(9000));
        assert_eq!(summary.cash, Money::from_cents(4500));
        assert_eq!(summary.upi, Money::from_cents(4500));
        assert!(summary.card.is_zero());
    }

    #[tokio::test]
    async fn test_purge_keeps_sequence() {
        let repo = repo().await;
        let id = repo.allocate_id().await.unwrap();
        repo.insert(&bill(id, at(15, 9), PaymentMethod::Cash)).await.unwrap();

        assert_eq!(repo.purge_all().await.unwrap(), 1);
        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(repo.get_lines(id).await.unwrap().is_empty());
        assert!(repo.allocate_id().await.unwrap() > id);
    }
}
