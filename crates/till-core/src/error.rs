//! # Error Types
//!
//! Domain-specific error types for till-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  till-core errors (this file)                                          │
//! │  ├── CoreError        - Cart, commit and payment failures              │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  till-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  till-terminal errors (app)                                            │
//! │  └── TerminalError    - What the operator sees (code + message)        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → TerminalError → operator message  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Recovery Policy
//! Every variant here is recoverable. A failed cart operation leaves the cart
//! exactly as it was; a failed commit leaves the cart intact for a retry.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core billing errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The catalog has no item with this code.
    ///
    /// ## When This Occurs
    /// - A scanned barcode that was never registered
    /// - A typo during manual entry
    ///
    /// The cart is unchanged and the session continues.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// A quantity change targeted a code that has no cart line.
    #[error("Item {0} is not in the cart")]
    NotInCart(String),

    /// Quantity is negative, not an integer, or would overflow.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Payment method outside Cash / UPI / Card.
    #[error("Invalid payment method: {0}")]
    InvalidPaymentMethod(String),

    /// A commit was requested with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Another commit for this session is already persisting.
    #[error("A bill is already being committed")]
    CommitInProgress,

    /// Writing the bill failed. Nothing was persisted and the cart is intact.
    #[error("Failed to persist bill: {0}")]
    StoragePersistError(String),

    /// The commit state machine was driven out of order.
    #[error("Invalid commit transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when operator or catalog input doesn't meet
/// requirements. Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Amount has more decimal places than the shop currency allows.
    #[error("{field} must have at most {max} decimal places")]
    TooPrecise { field: String, max: u32 },

    /// Invalid format (e.g., a price that is not a decimal number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
