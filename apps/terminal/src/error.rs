//! # Terminal Error Type
//!
//! Unified error type for terminal commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Terminal                           │
//! │                                                                         │
//! │  Operator types "/qty SHIRT01 x"                                        │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command handler                                                 │  │
//! │  │  Result<T, TerminalError>                                        │  │
//! │  │         │                                                        │  │
//! │  │  Database Error? ─── DbError::QueryFailed ──────┐               │  │
//! │  │  Billing Error?  ─── CoreError::InvalidQuantity ─┼─► TerminalError│  │
//! │  │  Store Error?    ─── StoreError::Backend ────────┘               │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  "error: [INVALID_QUANTITY] Invalid quantity: x"   (loop continues)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No error ends the billing loop; only `/quit` and end of input do.

use serde::Serialize;
use thiserror::Error;
use till_core::{CoreError, StoreError, ValidationError};
use till_db::DbError;

/// Error shown to the operator.
///
/// ## Serialization
/// ```json
/// { "code": "ITEM_NOT_FOUND", "message": "Item not found: SHIRT99" }
/// ```
#[derive(Debug, Clone, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("[{}] {message}", .code.as_str())]
pub struct TerminalError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for operator-visible failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Scanned or typed code is not in the catalog
    ItemNotFound,

    /// Quantity change for a code with no cart line
    NotInCart,

    /// Bad quantity input
    InvalidQuantity,

    /// Unknown payment method
    InvalidPaymentMethod,

    /// Commit requested on an empty cart
    EmptyCart,

    /// Another commit is running
    CommitInProgress,

    /// Bill could not be saved; the cart is kept for retry
    StorageError,

    /// Input validation failed
    ValidationError,

    /// Record not found (bill, item)
    NotFound,

    /// Configuration could not be loaded
    ConfigError,

    /// Anything else
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ItemNotFound => "ITEM_NOT_FOUND",
            ErrorCode::NotInCart => "NOT_IN_CART",
            ErrorCode::InvalidQuantity => "INVALID_QUANTITY",
            ErrorCode::InvalidPaymentMethod => "INVALID_PAYMENT_METHOD",
            ErrorCode::EmptyCart => "EMPTY_CART",
            ErrorCode::CommitInProgress => "COMMIT_IN_PROGRESS",
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

impl TerminalError {
    /// Creates a new terminal error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        TerminalError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        TerminalError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        TerminalError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        TerminalError::new(ErrorCode::ConfigError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        TerminalError::new(ErrorCode::Internal, message)
    }
}

/// Converts billing errors to terminal errors.
impl From<CoreError> for TerminalError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::ItemNotFound(_) => ErrorCode::ItemNotFound,
            CoreError::NotInCart(_) => ErrorCode::NotInCart,
            CoreError::InvalidQuantity(_) => ErrorCode::InvalidQuantity,
            CoreError::InvalidPaymentMethod(_) => ErrorCode::InvalidPaymentMethod,
            CoreError::EmptyCart => ErrorCode::EmptyCart,
            CoreError::CommitInProgress => ErrorCode::CommitInProgress,
            CoreError::StoragePersistError(_) => ErrorCode::StorageError,
            CoreError::Validation(_) => ErrorCode::ValidationError,
            CoreError::InvalidTransition { .. } => {
                tracing::error!(error = %err, "Commit state machine misuse");
                ErrorCode::Internal
            }
        };
        TerminalError::new(code, err.to_string())
    }
}

/// Converts database errors to terminal errors.
impl From<DbError> for TerminalError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => TerminalError::not_found(&entity, id),
            DbError::UniqueViolation { field, value } => TerminalError::validation(format!(
                "{} '{}' already exists",
                field, value
            )),
            DbError::Validation(e) => TerminalError::validation(e.to_string()),
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                TerminalError::new(ErrorCode::StorageError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Migration failed: {}", e);
                TerminalError::new(ErrorCode::StorageError, "Database migration failed")
            }
            other => {
                tracing::error!(error = %other, "Database operation failed");
                TerminalError::new(ErrorCode::StorageError, "Database operation failed")
            }
        }
    }
}

/// Converts collaborator errors reached through the store traits.
impl From<StoreError> for TerminalError {
    fn from(err: StoreError) -> Self {
        TerminalError::new(ErrorCode::StorageError, err.to_string())
    }
}

impl From<ValidationError> for TerminalError {
    fn from(err: ValidationError) -> Self {
        TerminalError::validation(err.to_string())
    }
}

impl From<std::io::Error> for TerminalError {
    fn from(err: std::io::Error) -> Self {
        TerminalError::internal(err.to_string())
    }
}

/// Result type for terminal operations.
pub type TerminalResult<T> = Result<T, TerminalError>;
