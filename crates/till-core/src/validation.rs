//! # Validation Module
//!
//! Input validation utilities for Till.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Terminal input                                               │
//! │  ├── Command parsing ("/qty SHIRT01 3")                                │
//! │  └── THIS MODULE: codes, names, prices, quantities                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Cart / commit (till-core)                                    │
//! │  └── Business rules (NotInCart, EmptyCart, overflow)                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE item_code                                                  │
//! │  └── CHECK payment_method, FK bill_items → bills                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use till_core::validation::{parse_quantity, validate_item_code};
//!
//! validate_item_code("SHIRT01").unwrap();
//! assert_eq!(parse_quantity("3").unwrap(), 3);
//! assert!(parse_quantity("2.5").is_err());
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::MAX_ITEM_CODE_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of an item name.
pub const MAX_ITEM_NAME_LEN: usize = 200;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an item code (barcode payload or typed code).
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most [`MAX_ITEM_CODE_LEN`] characters
/// - No whitespace or control characters inside the code
///
/// ## Example
/// ```rust
/// use till_core::validation::validate_item_code;
///
/// assert!(validate_item_code("8901234567890").is_ok());
/// assert!(validate_item_code("JEANS-32").is_ok());
/// assert!(validate_item_code("").is_err());
/// assert!(validate_item_code("has space").is_err());
/// ```
pub fn validate_item_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "item code".to_string(),
        });
    }

    if code.chars().count() > MAX_ITEM_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "item code".to_string(),
            max: MAX_ITEM_CODE_LEN,
        });
    }

    if code.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::InvalidFormat {
            field: "item code".to_string(),
            reason: "must not contain spaces or control characters".to_string(),
        });
    }

    Ok(())
}

/// Validates an item name.
///
/// ## Rules
/// - Must not be empty
/// - At most [`MAX_ITEM_NAME_LEN`] characters
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_ITEM_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_ITEM_NAME_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a unit price against the shop's currency precision.
///
/// Zero is allowed (free items); negative prices are not. A price must be
/// payable as is: `0.335` is rejected at precision 2, because a bill of such
/// lines could not total to the sum of its lines.
pub fn validate_price(price: Money, precision: u32) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
        });
    }

    if price.decimal_places() > precision {
        return Err(ValidationError::TooPrecise {
            field: "price".to_string(),
            max: precision,
        });
    }

    Ok(())
}

/// Parses a quantity typed by the operator.
///
/// Only whole numbers are accepted. The sign is kept so the cart can report
/// a negative quantity itself; zero means "remove the line".
///
/// ## Example
/// ```rust
/// use till_core::validation::parse_quantity;
///
/// assert_eq!(parse_quantity(" 4 ").unwrap(), 4);
/// assert_eq!(parse_quantity("-1").unwrap(), -1);
/// assert!(parse_quantity("two").is_err());
/// ```
pub fn parse_quantity(input: &str) -> CoreResult<i64> {
    let input = input.trim();
    input
        .parse::<i64>()
        .map_err(|_| CoreError::InvalidQuantity(format!("'{}' is not a whole number", input)))
}

// =============================================================================
// Unit Tests
// =============================================================================
