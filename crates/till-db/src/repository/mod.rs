//! # Repository Module
//!
//! Database repository implementations for Till.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  BillingSession (terminal)                                             │
//! │       │                                                                 │
//! │       │  catalog.lookup("SHIRT01")      via till_core::ItemCatalog     │
//! │       │  store.persist_bill(&bill)      via till_core::BillStore       │
//! │       ▼                                                                 │
//! │  ItemRepository / BillRepository / SettingsRepository                  │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`item::ItemRepository`] - Catalog CRUD and lookup
//! - [`bill::BillRepository`] - Bill id sequence, atomic persist, history
//! - [`settings::SettingsRepository`] - Shop info for the receipt header
//!
//! ## Storage Encodings
//! Amounts are canonical decimal TEXT; timestamps are RFC 3339 UTC with
//! nanoseconds, which sorts lexicographically in time order.

pub mod bill;
pub mod item;
pub mod settings;

use chrono::{DateTime, SecondsFormat, Utc};
use till_core::Money;

use crate::error::{DbError, DbResult};

/// Encodes a timestamp for storage.
pub(crate) fn encode_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Decodes a stored timestamp.
pub(crate) fn decode_timestamp(column: &str, raw: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| DbError::invalid_data(column, e))
}

/// Decodes a stored amount.
pub(crate) fn decode_money(column: &str, raw: &str) -> DbResult<Money> {
    Money::parse(raw).map_err(|e| DbError::invalid_data(column, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_encoding_sorts_in_time_order() {
        let a = Utc.with_ymd_and_hms(2024, 3, 15, 9, 59, 59).unwrap();
        let b = a + chrono::Duration::nanoseconds(1);
        let c = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();

        let (ea, eb, ec) = (encode_timestamp(&a), encode_timestamp(&b), encode_timestamp(&c));
        assert!(ea < eb && eb < ec);
        assert_eq!(decode_timestamp("created_at", &eb).unwrap(), b);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_money("price", "12,50"),
            Err(DbError::InvalidData { .. })
        ));
        assert!(decode_timestamp("created_at", "yesterday").is_err());
    }
}
