//! # Cart
//!
//! The in-progress bill of one billing session.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Operator Action          Session Call            Cart Change           │
//! │  ───────────────          ────────────            ───────────           │
//! │                                                                         │
//! │  Scan / type code ───────► add_code() ──────────► add_item(&item)       │
//! │                                                   qty += 1 or push      │
//! │                                                                         │
//! │  /qty CODE n ────────────► set_quantity() ──────► lines[i].qty = n      │
//! │                                                   n == 0 → remove       │
//! │                                                                         │
//! │  /remove CODE ───────────► remove_item() ───────► lines.retain(..)      │
//! │                                                                         │
//! │  /cancel, after commit ──► clear() ─────────────► lines.clear()         │
//! │                                                                         │
//! │  /pay ───────────────────► snapshot() ──────────► (read only clone)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - At most one line per item code
//! - Every line has quantity ≥ 1
//! - Line order is first-scan order
//! - A line's unit price is frozen at its first scan
//! - Failed operations leave the cart unchanged

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::totals::CartTotals;
use crate::types::{BillLine, Item};

// =============================================================================
// Cart Line
// =============================================================================

/// A line in the cart.
///
/// `name` and `unit_price` are copied from the catalog when the code is
/// first scanned. Catalog edits made while the bill is open do not reach
/// the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item_code: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl CartLine {
    /// Creates a line with quantity 1 from the catalog item.
    pub fn from_item(item: &Item) -> Self {
        CartLine {
            item_code: item.code.clone(),
            name: item.name.clone(),
            quantity: 1,
            unit_price: item.unit_price,
        }
    }

    /// quantity × unit_price, exact.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Adds one unit of `item`.
    ///
    /// ## Behavior
    /// - Code already in cart: quantity + 1, price snapshot kept
    /// - Code not in cart: new line at the end with quantity 1
    ///
    /// ## Errors
    /// `InvalidQuantity` if the line is already at `u32::MAX`.
    pub fn add_item(&mut self, item: &Item) -> CoreResult<()> {
        if let Some(line) = self.lines.iter_mut().find(|l| l.item_code == item.code) {
            line.quantity = line.quantity.checked_add(1).ok_or_else(|| {
                CoreError::InvalidQuantity(format!("quantity of {} would overflow", item.code))
            })?;
            return Ok(());
        }

        self.lines.push(CartLine::from_item(item));
        Ok(())
    }

    /// Sets the quantity of a line.
    ///
    /// ## Behavior
    /// - `quantity < 0`: `InvalidQuantity`
    /// - code not in cart: `NotInCart`
    /// - `quantity == 0`: the line is removed
    /// - otherwise the line's quantity is replaced
    pub fn set_quantity(&mut self, code: &str, quantity: i64) -> CoreResult<()> {
        if quantity < 0 {
            return Err(CoreError::InvalidQuantity(format!(
                "quantity must not be negative, got {}",
                quantity
            )));
        }

        let quantity = u32::try_from(quantity)
            .map_err(|_| CoreError::InvalidQuantity(format!("quantity {} is too large", quantity)))?;

        let index = self
            .position(code)
            .ok_or_else(|| CoreError::NotInCart(code.to_string()))?;

        if quantity == 0 {
            self.lines.remove(index);
        } else {
            self.lines[index].quantity = quantity;
        }
        Ok(())
    }

    /// Removes the line for `code`. Returns whether a line was removed.
    pub fn remove_item(&mut self, code: &str) -> bool {
        match self.position(code) {
            Some(index) => {
                self.lines.remove(index);
                true
            }
            None => false,
        }
    }

    /// Clears all lines.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Returns an independent copy of the current lines.
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            lines: self.lines.clone(),
        }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, code: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.item_code == code)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Totals recomputed from the current lines.
    pub fn totals(&self, precision: u32) -> CartTotals {
        CartTotals::compute(&self.lines, precision)
    }

    fn position(&self, code: &str) -> Option<usize> {
        self.lines.iter().position(|l| l.item_code == code)
    }
}

// =============================================================================
// Cart Snapshot
// =============================================================================

/// A frozen copy of the cart taken at the start of a commit.
///
/// Later cart mutations do not affect the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    lines: Vec<CartLine>,
}

impl CartSnapshot {
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn totals(&self, precision: u32) -> CartTotals {
        CartTotals::compute(&self.lines, precision)
    }

    /// Converts the snapshot into numbered bill lines (1-based, cart order).
    pub fn to_bill_lines(&self, bill_id: i64) -> Vec<BillLine> {
        self.lines
            .iter()
            .zip(1u32..)
            .map(|(line, line_no)| BillLine {
                bill_id,
                line_no,
                item_code: line.item_code.clone(),
                name: line.name.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                line_total: line.line_total(),
            })
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(code: &str, cents: i64) -> Item {
        Item::new(code, format!("Item {}", code), Money::from_cents(cents))
    }

    #[test]
    fn test_add_item_creates_line() {
        let mut cart = Cart::new();
        cart.add_item(&item("A", 1000)).unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.line("A").unwrap().quantity, 1);
        assert_eq!(cart.line("A").unwrap().unit_price, Money::from_cents(1000));
    }

    #[test]
    fn test_repeat_add_aggregates_with_price_snapshot() {
        let mut cart = Cart::new();
        cart.add_item(&item("A", 1000)).unwrap();

        // Catalog price changes between scans
        let repriced = item("A", 1500);
        cart.add_item(&repriced).unwrap();
        cart.add_item(&repriced).unwrap();

        assert_eq!(cart.lines().len(), 1);
        let line = cart.line("A").unwrap();
        assert_eq!(line.quantity, 3);
        assert_eq!(line.unit_price, Money::from_cents(1000));
        assert_eq!(line.line_total(), Money::from_cents(3000));
    }

    #[test]
    fn test_lines_keep_first_scan_order() {
        let mut cart = Cart::new();
        for code in ["B", "A", "C", "A"] {
            cart.add_item(&item(code, 100)).unwrap();
        }
        let codes: Vec<_> = cart.lines().iter().map(|l| l.item_code.as_str()).collect();
        assert_eq!(codes, ["B", "A", "C"]);
    }

    #[test]
    fn test_set_quantity() {
        let mut cart = Cart::new();
        cart.add_item(&item("A", 1000)).unwrap();

        cart.set_quantity("A", 5).unwrap();
        assert_eq!(cart.line("A").unwrap().quantity, 5);

        cart.set_quantity("A", 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_errors_leave_cart_unchanged() {
        let mut cart = Cart::new();
        cart.add_item(&item("A", 1000)).unwrap();
        let before = cart.clone();

        assert!(matches!(
            cart.set_quantity("A", -1),
            Err(CoreError::InvalidQuantity(_))
        ));
        assert!(matches!(
            cart.set_quantity("A", i64::from(u32::MAX) + 1),
            Err(CoreError::InvalidQuantity(_))
        ));
        assert!(matches!(
            cart.set_quantity("ZZZ", 2),
            Err(CoreError::NotInCart(ref code)) if code == "ZZZ"
        ));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_add_item_overflow() {
        let mut cart = Cart::new();
        cart.add_item(&item("A", 1)).unwrap();
        cart.set_quantity("A", i64::from(u32::MAX)).unwrap();

        assert!(matches!(
            cart.add_item(&item("A", 1)),
            Err(CoreError::InvalidQuantity(_))
        ));
        assert_eq!(cart.line("A").unwrap().quantity, u32::MAX);
    }

    #[test]
    fn test_remove_item_absent_is_noop() {
        let mut cart = Cart::new();
        cart.add_item(&item("A", 1000)).unwrap();

        assert!(!cart.remove_item("B"));
        assert!(cart.remove_item("A"));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut cart = Cart::new();
        cart.add_item(&item("A", 1000)).unwrap();
        let snapshot = cart.snapshot();

        cart.add_item(&item("B", 500)).unwrap();
        cart.clear();

        assert_eq!(snapshot.lines().len(), 1);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_snapshot_to_bill_lines() {
        let mut cart = Cart::new();
        cart.add_item(&item("A", 1000)).unwrap();
        cart.add_item(&item("A", 1000)).unwrap();
        cart.add_item(&item("B", 2500)).unwrap();

        let lines = cart.snapshot().to_bill_lines(42);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line_no, 1);
        assert_eq!(lines[0].bill_id, 42);
        assert_eq!(lines[0].line_total, Money::from_cents(2000));
        assert_eq!(lines[1].line_no, 2);
        assert_eq!(lines[1].item_code, "B");
    }
}
