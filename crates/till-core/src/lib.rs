//! # till-core: Pure Billing Logic for Till
//!
//! This crate is the **heart** of the Till billing terminal. It contains the
//! cart/billing engine as pure types and functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Till Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 till-terminal (session + CLI)                   │   │
//! │  │   stdin ──► decoder ──► cart ──► commit ──► bill file           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ till-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │  ┌────────┐ ┌────────┐ ┌────────┐ ┌────────┐ ┌─────────┐       │   │
//! │  │  │  scan  │ │  cart  │ │ totals │ │ commit │ │ receipt │       │   │
//! │  │  │Decoder │ │CartLine│ │ Money  │ │ State  │ │BillDoc  │       │   │
//! │  │  └────────┘ └────────┘ └────────┘ └────────┘ └─────────┘       │   │
//! │  │                                                                 │   │
//! │  │  store: ItemCatalog / BillStore / ArtifactSink (traits only)    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ implemented by                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 till-db (SQLite repositories)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. **Exact money**: every amount is a [`Money`] backed by a decimal
//! 2. **Snapshot pricing**: a cart line freezes the price of its first scan
//! 3. **No ambient state**: the session object owns the cart and decoder
//! 4. **Pure functions**: totals and receipts are recomputed, never cached

pub mod cart;
pub mod commit;
pub mod error;
pub mod money;
pub mod receipt;
pub mod scan;
pub mod store;
pub mod totals;
pub mod types;
pub mod validation;

pub use cart::{Cart, CartLine, CartSnapshot};
pub use commit::{CommitState, CommitTransaction};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use receipt::BillDocument;
pub use scan::{ScanDecoder, ScanEvent, ScannerTimings};
pub use store::{ArtifactHandle, ArtifactSink, BillStore, ItemCatalog, MemoryCatalog, StoreError};
pub use totals::CartTotals;
pub use types::{Bill, BillLine, BillSummary, Item, PaymentMethod, ShopInfo};

/// Decimal places used for currency when the shop does not configure any.
pub const DEFAULT_CURRENCY_PRECISION: u32 = 2;

/// Maximum length of an item code (scanner payloads are short).
pub const MAX_ITEM_CODE_LEN: usize = 64;
