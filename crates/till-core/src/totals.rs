//! # Totals
//!
//! Pure pricing over cart lines.
//!
//! ```text
//! subtotal = Σ quantity × unit_price          (exact decimal)
//! total    = round_half_up(subtotal, precision)
//! rounding = total − subtotal                 (the only adjustment)
//! ```
//!
//! Nothing here is cached. The cart calls [`CartTotals::compute`] on every
//! read, so a total can never drift from the lines it describes.

use serde::{Deserialize, Serialize};

use crate::cart::CartLine;
use crate::money::Money;

/// Cart totals summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    /// Number of distinct lines.
    pub line_count: usize,
    /// Sum of quantities over all lines.
    pub total_quantity: u64,
    /// Exact sum of line totals.
    pub subtotal: Money,
    /// Rounding adjustment applied to reach `total`.
    pub rounding: Money,
    /// Payable amount at the shop's currency precision.
    pub total: Money,
}

impl CartTotals {
    /// Computes totals for `lines` at `precision` decimal places.
    pub fn compute(lines: &[CartLine], precision: u32) -> Self {
        let subtotal: Money = lines.iter().map(CartLine::line_total).sum();
        let total = subtotal.round_half_up(precision);

        CartTotals {
            line_count: lines.len(),
            total_quantity: lines.iter().map(|l| u64::from(l.quantity)).sum(),
            subtotal,
            rounding: total - subtotal,
            total,
        }
    }

    /// Whether `total` equals the exact sum of the lines.
    pub fn is_exact(&self) -> bool {
        self.rounding.is_zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
