//! # Money Module
//!
//! Provides the `Money` type for handling monetary values exactly.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  After 10,000 scans the drift shows up on the bill.                     │
//! │                                                                         │
//! │  OUR SOLUTION: base-10 Decimal                                          │
//! │    0.1 + 0.2 = 0.3 exactly                                              │
//! │    Rounding happens ONCE, at display/persist, half-up                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use till_core::money::Money;
//!
//! let price = Money::parse("10.00").unwrap();
//! let line = price.multiply_quantity(2);
//! assert_eq!(line, Money::from_cents(2000));
//! assert_eq!(line.format(2), "20.00");
//! ```

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value as an exact decimal in the shop currency.
///
/// ## Design Decisions
/// - **Decimal, not f64**: sums over any number of lines are exact
/// - **No implicit rounding**: arithmetic keeps full precision; callers round
///   with [`Money::round_half_up`] at the display/persist boundary
/// - **Serde as string**: `"45.00"` survives JSON without float conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Wraps a decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a Money value from cents (two decimal places).
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1099).format(2), "10.99");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// Parses a decimal string such as `"25"`, `"25.5"` or `"10.125"`.
    ///
    /// Scientific notation and non-numeric input are rejected.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        Decimal::from_str_exact(input)
            .map(Money)
            .map_err(|e| ValidationError::InvalidFormat {
                field: "amount".to_string(),
                reason: e.to_string(),
            })
    }

    /// Returns the exact decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Number of significant decimal places (`10.50` → 1, `0.335` → 3).
    pub fn decimal_places(&self) -> u32 {
        self.0.normalize().scale()
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3), Money::from_cents(897));
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, qty: u32) -> Self {
        Money(self.0 * Decimal::from(qty))
    }

    /// Rounds to `precision` decimal places using round-half-up.
    ///
    /// ## Round Half Up
    /// ```text
    /// 10.125 → 10.13      10.124 → 10.12      -0.005 → -0.01
    /// ```
    /// Midpoints move away from zero, which is what a shopper expects to see
    /// on a paper bill.
    pub fn round_half_up(&self, precision: u32) -> Self {
        Money(
            self.0
                .round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Formats the amount rounded half-up with exactly `precision` decimals.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// assert_eq!(Money::parse("45").unwrap().format(2), "45.00");
    /// assert_eq!(Money::parse("0.125").unwrap().format(2), "0.13");
    /// ```
    pub fn format(&self, precision: u32) -> String {
        let mut rounded = self.round_half_up(precision).0;
        rounded.rescale(precision);
        rounded.to_string()
    }

    /// Canonical text form used for storage (`"10.5"`, `"45"`).
    ///
    /// Trailing zeros are dropped so the same value always stores the same
    /// way; parsing it back yields an equal `Money`.
    pub fn to_storage(&self) -> String {
        self.0.normalize().to_string()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Displays the amount with two decimals (rounded half-up).
///
/// Shop-specific symbol and precision live in `ShopInfo::format_money`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(crate::DEFAULT_CURRENCY_PRECISION))
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Multiplication by a cart quantity.
impl Mul<u32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: u32) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.amount(), Decimal::new(1099, 2));
        assert_eq!(money.to_string(), "10.99");
    }

    #[test]
    fn test_parse() {
        assert_eq!(Money::parse("25").unwrap(), Money::from_cents(2500));
        assert_eq!(Money::parse(" 10.50 ").unwrap(), Money::from_cents(1050));
        assert!(Money::parse("").is_err());
        assert!(Money::parse("ten").is_err());
        assert!(Money::parse("1e3").is_err());
    }

    #[test]
    fn test_decimal_sum_is_exact() {
        // 0.1 + 0.2 is exactly 0.3, unlike f64
        let sum = Money::parse("0.1").unwrap() + Money::parse("0.2").unwrap();
        assert_eq!(sum, Money::parse("0.3").unwrap());

        let many: Money = std::iter::repeat(Money::parse("0.1").unwrap())
            .take(10_000)
            .sum();
        assert_eq!(many, Money::from_cents(100_000));
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(Money::parse("10.125").unwrap().format(2), "10.13");
        assert_eq!(Money::parse("10.124").unwrap().format(2), "10.12");
        assert_eq!(Money::parse("10.135").unwrap().format(2), "10.14");
        assert_eq!(Money::parse("-0.005").unwrap().format(2), "-0.01");
        assert_eq!(Money::parse("7").unwrap().format(0), "7");
    }

    #[test]
    fn test_decimal_places_ignores_trailing_zeros() {
        assert_eq!(Money::parse("10.50").unwrap().decimal_places(), 1);
        assert_eq!(Money::parse("0.335").unwrap().decimal_places(), 3);
        assert_eq!(Money::parse("1.000").unwrap().decimal_places(), 0);
        assert_eq!(Money::from_cents(1099).decimal_places(), 2);
    }

    #[test]
    fn test_format_pads_trailing_zeros() {
        assert_eq!(Money::parse("45").unwrap().format(2), "45.00");
        assert_eq!(Money::parse("45.5").unwrap().format(3), "45.500");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_storage_form_is_canonical() {
        let a = Money::parse("10.50").unwrap();
        let b = Money::parse("10.5").unwrap();
        assert_eq!(a.to_storage(), "10.5");
        assert_eq!(a.to_storage(), b.to_storage());
        assert_eq!(Money::parse(&a.to_storage()).unwrap(), a);
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!(a + b, Money::from_cents(1500));
        assert_eq!(a - b, Money::from_cents(500));
        assert_eq!(a * 3, Money::from_cents(3000));
        assert!((b - a).is_negative());
        assert!(!Money::zero().is_negative());
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Money::from_cents(4500)).unwrap();
        assert_eq!(json, "\"45.00\"");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Money::from_cents(4500));
    }
}
