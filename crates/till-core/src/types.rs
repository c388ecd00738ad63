//! # Domain Types
//!
//! Core domain types used throughout Till.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Item       │   │      Bill       │   │    BillLine     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  code           │   │  bill_id (seq)  │   │  bill_id (FK)   │       │
//! │  │  name           │   │  created_at     │   │  line_no        │       │
//! │  │  unit_price     │   │  payment_method │   │  snapshot of    │       │
//! │  └─────────────────┘   │  operator       │   │  the cart line  │       │
//! │                        │  total          │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                              │
//! │  │ PaymentMethod   │   │    ShopInfo     │                              │
//! │  │  Cash/Upi/Card  │   │  receipt header │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A `BillLine` copies code, name and unit price out of the cart. Editing or
//! deleting the catalog item afterwards never changes a persisted bill.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::money::Money;

// =============================================================================
// Item
// =============================================================================

/// A catalog item that can be scanned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Business identifier, printed as the barcode.
    pub code: String,

    /// Display name shown to the operator and on the bill.
    pub name: String,

    /// Current selling price.
    pub unit_price: Money,
}

impl Item {
    pub fn new(code: impl Into<String>, name: impl Into<String>, unit_price: Money) -> Self {
        Item {
            code: code.into(),
            name: name.into(),
            unit_price,
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer paid. A closed set: anything else is rejected at parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Unified Payments Interface (QR / mobile transfer).
    Upi,
    /// Card payment on an external terminal.
    Card,
}

impl PaymentMethod {
    /// Every accepted method, in the order offered to the operator.
    pub const ALL: [PaymentMethod; 3] = [PaymentMethod::Cash, PaymentMethod::Upi, PaymentMethod::Card];

    /// Storage form (`cash`, `upi`, `card`).
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Upi => "upi",
            PaymentMethod::Card => "card",
        }
    }
}

/// Printed form: `CASH`, `UPI`, `CARD`.
impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

impl FromStr for PaymentMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "upi" => Ok(PaymentMethod::Upi),
            "card" => Ok(PaymentMethod::Card),
            _ => Err(CoreError::InvalidPaymentMethod(s.trim().to_string())),
        }
    }
}

// =============================================================================
// Bill
// =============================================================================

/// A committed bill. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    /// Sequential id from the durable bill sequence.
    pub bill_id: i64,
    pub created_at: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    /// Staff member who rang up the bill.
    pub operator: String,
    /// Grand total, rounded to the shop's currency precision.
    pub total: Money,
    pub lines: Vec<BillLine>,
}

impl Bill {
    /// Human-facing bill number: `BILL<YYYYMMDD><id:04>`.
    ///
    /// ## Example
    /// `bill_id = 7` created on 2024-03-15 → `BILL202403150007`
    pub fn bill_number(&self) -> String {
        format!("BILL{}{:04}", self.created_at.format("%Y%m%d"), self.bill_id)
    }

    /// Exact sum of the line totals.
    pub fn lines_total(&self) -> Money {
        self.lines.iter().map(|line| line.line_total).sum()
    }

    /// Total number of units across all lines.
    pub fn total_quantity(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }
}

// =============================================================================
// Bill Line
// =============================================================================

/// A line item in a bill.
/// Uses snapshot pattern to freeze item data at the time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillLine {
    pub bill_id: i64,
    /// 1-based position in the bill, following cart order.
    pub line_no: u32,
    /// Item code at time of sale (frozen).
    pub item_code: String,
    /// Item name at time of sale (frozen).
    pub name: String,
    pub quantity: u32,
    /// Unit price at time of first scan (frozen).
    pub unit_price: Money,
    /// quantity × unit_price, exact.
    pub line_total: Money,
}

// =============================================================================
// Bill Summary
// =============================================================================

/// Bill header without lines, for history listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillSummary {
    pub bill_id: i64,
    pub bill_number: String,
    pub created_at: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    pub operator: String,
    pub total: Money,
    pub line_count: u32,
}

impl From<&Bill> for BillSummary {
    fn from(bill: &Bill) -> Self {
        BillSummary {
            bill_id: bill.bill_id,
            bill_number: bill.bill_number(),
            created_at: bill.created_at,
            payment_method: bill.payment_method,
            operator: bill.operator.clone(),
            total: bill.total,
            line_count: bill.lines.len() as u32,
        }
    }
}

// =============================================================================
// Shop Info
// =============================================================================

/// Shop details printed in the bill header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopInfo {
    pub name: String,
    pub tagline: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    /// Prefix printed before amounts, e.g. `Rs.`
    pub currency_symbol: String,
    /// Decimal places used for the grand total.
    pub currency_precision: u32,
}

impl ShopInfo {
    /// Formats an amount with the shop's symbol and precision.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::{Money, ShopInfo};
    ///
    /// let shop = ShopInfo::default();
    /// assert_eq!(shop.format_money(Money::from_cents(4500)), "Rs.45.00");
    /// ```
    pub fn format_money(&self, amount: Money) -> String {
        format!("{}{}", self.currency_symbol, amount.format(self.currency_precision))
    }
}

impl Default for ShopInfo {
    fn default() -> Self {
        ShopInfo {
            name: "DROP".to_string(),
            tagline: "DRESS FOR LESS".to_string(),
            address: "City center, Naikkanal, Thrissur, Kerala 680001".to_string(),
            phone: String::new(),
            email: String::new(),
            currency_symbol: "Rs.".to_string(),
            currency_precision: crate::DEFAULT_CURRENCY_PRECISION,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_bill() -> Bill {
        let lines = vec![
            BillLine {
                bill_id: 7,
                line_no: 1,
                item_code: "SHIRT01".to_string(),
                name: "Linen Shirt".to_string(),
                quantity: 2,
                unit_price: Money::from_cents(1000),
                line_total: Money::from_cents(2000),
            },
            BillLine {
                bill_id: 7,
                line_no: 2,
                item_code: "CAP01".to_string(),
                name: "Cap".to_string(),
                quantity: 1,
                unit_price: Money::from_cents(2500),
                line_total: Money::from_cents(2500),
            },
        ];
        Bill {
            bill_id: 7,
            created_at: Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap(),
            payment_method: PaymentMethod::Upi,
            operator: "staff".to_string(),
            total: Money::from_cents(4500),
            lines,
        }
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!(" UPI ".parse::<PaymentMethod>().unwrap(), PaymentMethod::Upi);
        assert_eq!("Card".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);

        let err = "cheque".parse::<PaymentMethod>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidPaymentMethod(ref m) if m == "cheque"));
    }

    #[test]
    fn test_payment_method_display() {
        assert_eq!(PaymentMethod::Upi.to_string(), "UPI");
        assert_eq!(PaymentMethod::Cash.as_str(), "cash");
        assert_eq!(serde_json::to_string(&PaymentMethod::Card).unwrap(), "\"card\"");
    }

    #[test]
    fn test_bill_number() {
        assert_eq!(sample_bill().bill_number(), "BILL202403150007");
    }

    #[test]
    fn test_bill_lines_total() {
        let bill = sample_bill();
        assert_eq!(bill.lines_total(), bill.total);
        assert_eq!(bill.total_quantity(), 3);

        let summary = BillSummary::from(&bill);
        assert_eq!(summary.line_count, 2);
        assert_eq!(summary.bill_number, "BILL202403150007");
    }

    #[test]
    fn test_shop_info_defaults() {
        let shop = ShopInfo::default();
        assert_eq!(shop.name, "DROP");
        assert_eq!(shop.tagline, "DRESS FOR LESS");
        assert_eq!(shop.format_money(Money::parse("10.125").unwrap()), "Rs.10.13");
    }
}
