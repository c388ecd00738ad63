//! # Bill Document
//!
//! Renders a persisted bill as fixed-width printable text.
//!
//! ## Layout (48 columns)
//! ```text
//!                       DROP
//!                  DRESS FOR LESS
//!   City center, Naikkanal, Thrissur, Kerala 680001
//! ================================================
//! BILL NO: BILL202403150007                  ID: 7
//! DATE: 15/03/2024                     TIME: 10:30
//! CASHIER: staff
//! ------------------------------------------------
//! ITEM                  QTY      PRICE       TOTAL
//! ------------------------------------------------
//! Linen Shirt             2      10.00       20.00
//!   SHIRT01
//! ------------------------------------------------
//! TOTAL                                   Rs.45.00
//! Payment Method: UPI
//! ================================================
//!          Thank you for shopping with us!
//!                 Visit again soon!
//! ```
//!
//! Rendering reads only the bill and the shop info, never the clock, so the
//! same inputs always produce byte-identical output. Times are printed in UTC.

use crate::money::Money;
use crate::types::{Bill, ShopInfo};

/// Default paper width in characters (80 mm thermal roll).
pub const RECEIPT_WIDTH: usize = 48;

const NAME_COL: usize = 20;
const QTY_COL: usize = 4;
const PRICE_COL: usize = 10;
const TOTAL_COL: usize = 11;

// =============================================================================
// Text Builder
// =============================================================================

struct TextBuilder {
    buf: String,
    width: usize,
}

impl TextBuilder {
    fn new(width: usize) -> Self {
        TextBuilder {
            buf: String::new(),
            width,
        }
    }

    fn write_line(&mut self, s: &str) {
        self.buf.push_str(s.trim_end());
        self.buf.push('\n');
    }

    fn blank(&mut self) {
        self.buf.push('\n');
    }

    fn center(&mut self, s: &str) {
        let w = text_width(s);
        if w >= self.width {
            self.write_line(s);
        } else {
            let pad = (self.width - w) / 2;
            self.write_line(&format!("{}{}", " ".repeat(pad), s));
        }
    }

    /// Left text and right text on one line, padded to the full width.
    fn line_lr(&mut self, left: &str, right: &str) {
        let lw = text_width(left);
        let rw = text_width(right);
        if lw + rw >= self.width {
            self.write_line(&format!("{} {}", left, right));
        } else {
            self.write_line(&format!("{}{}{}", left, " ".repeat(self.width - lw - rw), right));
        }
    }

    fn eq_sep(&mut self) {
        self.write_line(&"=".repeat(self.width));
    }

    fn dash_sep(&mut self) {
        self.write_line(&"-".repeat(self.width));
    }

    fn finish(self) -> String {
        self.buf
    }
}

fn text_width(s: &str) -> usize {
    s.chars().count()
}

fn pad_right(s: &str, width: usize) -> String {
    let truncated: String = s.chars().take(width).collect();
    format!("{:<width$}", truncated, width = width)
}

fn pad_left(s: &str, width: usize) -> String {
    format!("{:>width$}", s, width = width)
}

// =============================================================================
// Bill Document
// =============================================================================

/// Printable rendering of one bill.
pub struct BillDocument<'a> {
    bill: &'a Bill,
    shop: &'a ShopInfo,
    width: usize,
    reprint: bool,
}

impl<'a> BillDocument<'a> {
    pub fn new(bill: &'a Bill, shop: &'a ShopInfo) -> Self {
        BillDocument {
            bill,
            shop,
            width: RECEIPT_WIDTH,
            reprint: false,
        }
    }

    /// Marks the copy as a reprint in the header.
    pub fn reprint(mut self, reprint: bool) -> Self {
        self.reprint = reprint;
        self
    }

    pub fn render(&self) -> String {
        let bill = self.bill;
        let shop = self.shop;
        let precision = shop.currency_precision;
        let mut b = TextBuilder::new(self.width);

        if self.reprint {
            b.center("*** REPRINT ***");
            b.blank();
        }

        // ── Shop header ──
        b.center(&shop.name.to_uppercase());
        if !shop.tagline.is_empty() {
            b.center(&shop.tagline);
        }
        if !shop.address.is_empty() {
            b.center(&shop.address);
        }
        if !shop.phone.is_empty() {
            b.center(&format!("Tel: {}", shop.phone));
        }
        if !shop.email.is_empty() {
            b.center(&format!("Email: {}", shop.email));
        }
        b.eq_sep();

        // ── Bill header ──
        b.line_lr(
            &format!("BILL NO: {}", bill.bill_number()),
            &format!("ID: {}", bill.bill_id),
        );
        b.line_lr(
            &format!("DATE: {}", bill.created_at.format("%d/%m/%Y")),
            &format!("TIME: {}", bill.created_at.format("%H:%M")),
        );
        if !bill.operator.is_empty() {
            b.write_line(&format!("CASHIER: {}", bill.operator));
        }
        b.dash_sep();

        // ── Items ──
        b.write_line(&format!(
            "{} {} {} {}",
            pad_right("ITEM", NAME_COL),
            pad_left("QTY", QTY_COL),
            pad_left("PRICE", PRICE_COL),
            pad_left("TOTAL", TOTAL_COL)
        ));
        b.dash_sep();

        for line in &bill.lines {
            b.write_line(&format!(
                "{} {} {} {}",
                pad_right(&line.name, NAME_COL),
                pad_left(&line.quantity.to_string(), QTY_COL),
                pad_left(&line.unit_price.format(precision), PRICE_COL),
                pad_left(&line.line_total.format(precision), TOTAL_COL)
            ));
            b.write_line(&format!("  {}", line.item_code));
        }
        b.dash_sep();

        // ── Totals ──
        let subtotal = bill.lines_total();
        let rounding = bill.total - subtotal;
        if !rounding.is_zero() {
            b.line_lr(
                "SUBTOTAL",
                &format!("{}{}", shop.currency_symbol, subtotal.to_storage()),
            );
            b.line_lr("ROUNDING", &signed(rounding));
        }
        b.line_lr("TOTAL", &shop.format_money(bill.total));
        b.write_line(&format!("Payment Method: {}", bill.payment_method));
        b.eq_sep();

        // ── Footer ──
        b.center("Thank you for shopping with us!");
        b.center("Visit again soon!");

        b.finish()
    }
}

/// Exact amount with an explicit sign.
fn signed(amount: Money) -> String {
    let text = amount.to_storage();
    if amount.is_negative() {
        text
    } else {
        format!("+{}", text)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BillLine, PaymentMethod};
    use chrono::{TimeZone, Utc};

    fn bill_line(line_no: u32, code: &str, name: &str, qty: u32, price: &str) -> BillLine {
        let unit_price = Money::parse(price).unwrap();
        BillLine {
            bill_id: 7,
            line_no,
            item_code: code.to_string(),
            name: name.to_string(),
            quantity: qty,
            unit_price,
            line_total: unit_price.multiply_quantity(qty),
        }
    }

    fn sample_bill() -> Bill {
        Bill {
            bill_id: 7,
            created_at: Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap(),
            payment_method: PaymentMethod::Upi,
            operator: "staff".to_string(),
            total: Money::from_cents(4500),
            lines: vec![
                bill_line(1, "SHIRT01", "Linen Shirt", 2, "10.00"),
                bill_line(2, "CAP01", "Cap", 1, "25.00"),
            ],
        }
    }

    #[test]
    fn test_render_contains_bill_details() {
        let text = BillDocument::new(&sample_bill(), &ShopInfo::default()).render();

        assert!(text.contains("DROP"));
        assert!(text.contains("DRESS FOR LESS"));
        assert!(text.contains("BILL NO: BILL202403150007"));
        assert!(text.contains("DATE: 15/03/2024"));
        assert!(text.contains("TIME: 10:30"));
        assert!(text.contains("Linen Shirt"));
        assert!(text.contains("SHIRT01"));
        assert!(text.contains("Rs.45.00"));
        assert!(text.contains("Payment Method: UPI"));
        assert!(text.contains("Thank you for shopping with us!"));
        assert!(!text.contains("ROUNDING"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let bill = sample_bill();
        let shop = ShopInfo::default();

        let first = BillDocument::new(&bill, &shop).render();
        let second = BillDocument::new(&bill.clone(), &shop.clone()).render();
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn test_lines_fit_paper_width() {
        let mut bill = sample_bill();
        bill.lines.push(bill_line(
            3,
            "SAREE-KANCHI-001",
            "Kanchipuram Silk Saree With Zari Border",
            12,
            "12999.50",
        ));
        bill.total = bill.lines_total();

        let text = BillDocument::new(&bill, &ShopInfo::default()).render();
        for line in text.lines() {
            assert!(line.chars().count() <= RECEIPT_WIDTH, "too wide: {line:?}");
        }
    }

    #[test]
    fn test_render_shows_rounding() {
        let mut bill = sample_bill();
        bill.lines = vec![bill_line(1, "A", "Socks", 3, "0.335")];
        bill.total = Money::from_cents(101);

        let text = BillDocument::new(&bill, &ShopInfo::default()).render();
        assert!(text.contains("Rs.1.005"));
        assert!(text.contains("+0.005"));
        assert!(text.contains("Rs.1.01"));
    }

    #[test]
    fn test_reprint_marker() {
        let bill = sample_bill();
        let shop = ShopInfo::default();
        let text = BillDocument::new(&bill, &shop).reprint(true).render();
        assert!(text.starts_with(&format!("{}*** REPRINT ***", " ".repeat(16))));
    }
}
