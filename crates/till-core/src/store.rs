//! # Storage Seams
//!
//! Interfaces the billing session needs from the outside world. till-core
//! only declares them; till-db implements the catalog and bill store over
//! SQLite, the terminal implements the artifact sink over the file system.
//!
//! ```text
//! ┌──────────────────────┐     ┌──────────────────────┐     ┌───────────────┐
//! │     ItemCatalog      │     │      BillStore       │     │ ArtifactSink  │
//! │  lookup(code)        │     │  next_bill_id()      │     │ store(bill,   │
//! │                      │     │  persist_bill(bill)  │     │   content)    │
//! │                      │     │  load_bill(id)       │     │               │
//! └──────────┬───────────┘     └──────────┬───────────┘     └───────┬───────┘
//!            │ ItemRepository             │ BillRepository          │ FileArtifactSink
//!            ▼                            ▼                         ▼
//!         SQLite                       SQLite                  bills/*.pdf
//! ```
//!
//! The traits use `async fn` directly and are consumed through generics,
//! never as trait objects.
#![allow(async_fn_in_trait)]

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Bill, Item};

// =============================================================================
// Errors
// =============================================================================

/// Failure reported by a storage collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not complete the operation.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A uniqueness or reference rule was violated.
    #[error("storage constraint violated: {0}")]
    Constraint(String),

    /// The printable artifact could not be written.
    #[error("artifact write failed: {0}")]
    Artifact(String),
}

// =============================================================================
// Traits
// =============================================================================

/// Read access to the item catalog.
pub trait ItemCatalog {
    /// Returns the item for `code`, or `None` if the code is unknown.
    async fn lookup(&self, code: &str) -> Result<Option<Item>, StoreError>;
}

/// Durable bill storage.
pub trait BillStore {
    /// Allocates the next bill id.
    ///
    /// Ids are strictly increasing and never reused, even if the bill that
    /// received one is never persisted. Gaps are allowed.
    async fn next_bill_id(&self) -> Result<i64, StoreError>;

    /// Writes the bill header and all of its lines atomically.
    async fn persist_bill(&self, bill: &Bill) -> Result<(), StoreError>;

    async fn load_bill(&self, bill_id: i64) -> Result<Option<Bill>, StoreError>;
}

/// Destination for rendered bill documents.
///
/// `content` is the fixed-width layout from [`crate::BillDocument`]; the
/// sink decides the file format (the terminal writes a PDF).
pub trait ArtifactSink {
    async fn store(&self, bill: &Bill, content: &str) -> Result<ArtifactHandle, StoreError>;
}

/// Where a stored artifact ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactHandle {
    /// Path or URI of the document.
    pub location: String,
    /// Size of the stored content in bytes.
    pub bytes: usize,
}

impl<T: ItemCatalog> ItemCatalog for Arc<T> {
    async fn lookup(&self, code: &str) -> Result<Option<Item>, StoreError> {
        (**self).lookup(code).await
    }
}

impl<T: BillStore> BillStore for Arc<T> {
    async fn next_bill_id(&self) -> Result<i64, StoreError> {
        (**self).next_bill_id().await
    }

    async fn persist_bill(&self, bill: &Bill) -> Result<(), StoreError> {
        (**self).persist_bill(bill).await
    }

    async fn load_bill(&self, bill_id: i64) -> Result<Option<Bill>, StoreError> {
        (**self).load_bill(bill_id).await
    }
}

impl<T: ArtifactSink> ArtifactSink for Arc<T> {
    async fn store(&self, bill: &Bill, content: &str) -> Result<ArtifactHandle, StoreError> {
        (**self).store(bill, content).await
    }
}

// =============================================================================
// In-Memory Catalog
// =============================================================================

/// A catalog held in memory.
///
/// Used by tests and by tools that load a fixed price list.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    items: RwLock<HashMap<String, Item>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        let catalog = Self::new();
        for item in items {
            catalog.upsert(item);
        }
        catalog
    }

    /// Inserts or replaces the item with the same code.
    pub fn upsert(&self, item: Item) {
        let mut items = self.items.write().unwrap_or_else(|e| e.into_inner());
        items.insert(item.code.clone(), item);
    }

    pub fn remove(&self, code: &str) -> Option<Item> {
        let mut items = self.items.write().unwrap_or_else(|e| e.into_inner());
        items.remove(code)
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ItemCatalog for MemoryCatalog {
    async fn lookup(&self, code: &str) -> Result<Option<Item>, StoreError> {
        let items = self.items.read().unwrap_or_else(|e| e.into_inner());
        Ok(items.get(code).cloned())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    #[tokio::test]
    async fn test_memory_catalog_lookup() {
        let catalog = MemoryCatalog::from_items([
            Item::new("SHIRT01", "Linen Shirt", Money::from_cents(1000)),
            Item::new("CAP01", "Cap", Money::from_cents(2500)),
        ]);

        let found = catalog.lookup("CAP01").await.unwrap().unwrap();
        assert_eq!(found.name, "Cap");
        assert!(catalog.lookup("NOPE").await.unwrap().is_none());
        assert_eq!(catalog.len(), 2);
    }

    #[tokio::test]
    async fn test_upsert_replaces_price() {
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.upsert(Item::new("A", "A", Money::from_cents(100)));
        catalog.upsert(Item::new("A", "A", Money::from_cents(150)));

        let item = catalog.lookup("A").await.unwrap().unwrap();
        assert_eq!(item.unit_price, Money::from_cents(150));

        assert!(catalog.remove("A").is_some());
        assert!(catalog.is_empty());
    }
}
