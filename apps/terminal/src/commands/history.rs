//! # History Commands
//!
//! Read-only views over committed bills: `history`, `show`, `summary`.

use std::io::Write;

use chrono::{NaiveDate, Utc};
use tracing::debug;

use crate::error::{TerminalError, TerminalResult};
use till_core::{BillDocument, BillSummary, ShopInfo};
use till_db::Database;

/// Lists bills, newest first.
///
/// With neither date given, the most recent `limit` bills are shown. With
/// one date, that bound is paired with today (`to`) or the same day (`from`).
pub async fn list<W: Write>(
    db: &Database,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    limit: u32,
    out: &mut W,
) -> TerminalResult<()> {
    let bills = match (from, to) {
        (None, None) => db.bills().list_recent(limit).await?,
        (from, to) => {
            let to = to.unwrap_or_else(|| Utc::now().date_naive());
            let from = from.unwrap_or(to);
            if from > to {
                return Err(TerminalError::validation(format!(
                    "--from {} is after --to {}",
                    from, to
                )));
            }
            debug!(%from, %to, "Listing bill history");
            db.bills().list_by_date_range(from, to).await?
        }
    };

    let shop = db.settings().get_shop_info().await?;
    print_summaries(&bills, &shop, out)
}

/// Prints one bill as it appears on paper.
pub async fn show<W: Write>(db: &Database, bill_id: i64, out: &mut W) -> TerminalResult<()> {
    let bill = db
        .bills()
        .get_by_id(bill_id)
        .await?
        .ok_or_else(|| TerminalError::not_found("Bill", bill_id))?;
    let shop = db.settings().get_shop_info().await?;

    write!(out, "{}", BillDocument::new(&bill, &shop).render())?;
    Ok(())
}

/// Bill count and revenue for a day (default today, UTC).
pub async fn summary<W: Write>(
    db: &Database,
    date: Option<NaiveDate>,
    out: &mut W,
) -> TerminalResult<()> {
    let date = date.unwrap_or_else(|| Utc::now().date_naive());
    let summary = db.bills().daily_summary(date).await?;
    let shop = db.settings().get_shop_info().await?;

    writeln!(out, "Sales for {}", summary.date.format("%d/%m/%Y"))?;
    writeln!(out, "  Bills:   {}", summary.bill_count)?;
    writeln!(out, "  Revenue: {}", shop.format_money(summary.revenue))?;
    writeln!(out, "    Cash:  {}", shop.format_money(summary.cash))?;
    writeln!(out, "    UPI:   {}", shop.format_money(summary.upi))?;
    writeln!(out, "    Card:  {}", shop.format_money(summary.card))?;
    Ok(())
}

pub fn print_summaries<W: Write>(
    bills: &[BillSummary],
    shop: &ShopInfo,
    out: &mut W,
) -> TerminalResult<()> {
    if bills.is_empty() {
        writeln!(out, "No bills.")?;
        return Ok(());
    }

    for bill in bills {
        writeln!(
            out,
            "{:>6}  {}  {}  {:<5} {:>3} line(s) {:>12}  {}",
            bill.bill_id,
            bill.bill_number,
            bill.created_at.format("%d/%m/%Y %H:%M"),
            bill.payment_method,
            bill.line_count,
            shop.format_money(bill.total),
            bill.operator
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use till_core::{Bill, BillLine, Money, PaymentMethod};
    use till_db::DbConfig;

    async fn db_with_bill() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let bill = Bill {
            bill_id: 7,
            created_at: Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap(),
            payment_method: PaymentMethod::Upi,
            operator: "anu".to_string(),
            total: Money::from_cents(2500),
            lines: vec![BillLine {
                bill_id: 7,
                line_no: 1,
                item_code: "CAP01".to_string(),
                name: "Cap".to_string(),
                quantity: 1,
                unit_price: Money::from_cents(2500),
                line_total: Money::from_cents(2500),
            }],
        };
        db.bills().insert(&bill).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_list_by_range() {
        let db = db_with_bill().await;
        let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let mut out = Vec::new();

        list(&db, Some(day), Some(day), 20, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("BILL202403150007"));
        assert!(text.contains("Rs.25.00"));

        let mut out = Vec::new();
        let err = list(&db, Some(day), day.pred_opt(), 20, &mut out).await.unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_show_and_summary() {
        let db = db_with_bill().await;
        let mut out = Vec::new();

        show(&db, 7, &mut out).await.unwrap();
        summary(&db, NaiveDate::from_ymd_opt(2024, 3, 15), &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("BILL NO: BILL202403150007"));
        assert!(text.contains("Bills:   1"));
        assert!(text.contains("UPI:   Rs.25.00"));

        assert!(show(&db, 8, &mut Vec::new()).await.is_err());
    }
}
