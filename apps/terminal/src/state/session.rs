//! # Billing Session
//!
//! One terminal's open bill: the cart, the scanner decoder and the commit
//! driver, wired to a catalog, a bill store and an artifact sink.
//!
//! ## Locking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Session Locks                                        │
//! │                                                                         │
//! │  decoder      std Mutex, held only while feeding one character          │
//! │  cart         tokio Mutex; commit() holds it from snapshot to clear,    │
//! │               so scans and quantity edits wait for the bill to finish   │
//! │  commit_gate  tokio Mutex, try_lock only: a second commit() while one   │
//! │               is running fails at once with CommitInProgress            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Commit Sequence
//! ```text
//! Idle ─begin─► Validating ─next_bill_id─► Persisting{id} ─persist─►
//!      ArtifactGenerating{id} ─render+store─► Committed{id} (cart cleared)
//!
//! empty cart        → Failed, EmptyCart, no id allocated
//! inexact total     → Failed, Validation, no id allocated
//! id/persist error  → Failed, StoragePersistError, cart untouched
//! artifact error    → still Committed, warning ArtifactGenerationFailed
//! ```

use std::sync::Mutex as SyncMutex;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{ErrorCode, TerminalError, TerminalResult};
use till_core::validation::parse_quantity;
use till_core::{
    ArtifactHandle, ArtifactSink, Bill, BillDocument, BillStore, Cart, CartLine, CartSnapshot,
    CartTotals, CommitTransaction, CoreError, ItemCatalog, PaymentMethod, ScanDecoder, ScanEvent,
    ScannerTimings, ShopInfo, ValidationError,
};

// =============================================================================
// Outcomes
// =============================================================================

/// Result of a complete scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The item was added; the line after the change.
    Added(CartLine),
    /// The catalog does not know the code. The cart is unchanged.
    NotFound(String),
}

/// Non-fatal problem reported with a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitWarning {
    /// The bill is saved but its printable file could not be produced.
    /// `reprint` retries it.
    ArtifactGenerationFailed(String),
}

impl std::fmt::Display for CommitWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommitWarning::ArtifactGenerationFailed(reason) => {
                write!(f, "bill saved but not printed: {}", reason)
            }
        }
    }
}

/// A committed bill.
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    pub bill: Bill,
    pub artifact: Option<ArtifactHandle>,
    pub warning: Option<CommitWarning>,
}

// =============================================================================
// Session
// =============================================================================

/// Billing session for one terminal.
///
/// ## Usage
/// ```rust,ignore
/// let session = BillingSession::new(db.items(), db.bills(), FileArtifactSink::new(dir))
///     .with_shop(db.settings().get_shop_info().await?)
///     .with_operator("anu");
///
/// session.add_code("SHIRT01").await?;
/// let outcome = session.commit(PaymentMethod::Upi).await?;
/// ```
pub struct BillingSession<C, S, A> {
    catalog: C,
    store: S,
    sink: A,
    shop: ShopInfo,
    operator: String,
    cart: Mutex<Cart>,
    commit_gate: Mutex<()>,
    decoder: SyncMutex<ScanDecoder>,
}

impl<C, S, A> BillingSession<C, S, A>
where
    C: ItemCatalog,
    S: BillStore,
    A: ArtifactSink,
{
    /// Creates a session with an empty cart, default shop info and
    /// default scanner timings.
    pub fn new(catalog: C, store: S, sink: A) -> Self {
        BillingSession {
            catalog,
            store,
            sink,
            shop: ShopInfo::default(),
            operator: "staff".to_string(),
            cart: Mutex::new(Cart::new()),
            commit_gate: Mutex::new(()),
            decoder: SyncMutex::new(ScanDecoder::default()),
        }
    }

    pub fn with_shop(mut self, shop: ShopInfo) -> Self {
        self.shop = shop;
        self
    }

    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = operator.into();
        self
    }

    pub fn with_timings(self, timings: ScannerTimings) -> Self {
        self.with_decoder(|d| *d = ScanDecoder::new(timings));
        self
    }

    pub fn shop(&self) -> &ShopInfo {
        &self.shop
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // -------------------------------------------------------------------------
    // Scanner input
    // -------------------------------------------------------------------------

    /// Feeds one input character that arrived at `at`.
    ///
    /// Returns `Some` when the character completed a code.
    pub async fn feed_char(&self, ch: char, at: Instant) -> TerminalResult<Option<ScanOutcome>> {
        let event = self.with_decoder(|d| d.feed(ch, at));
        self.handle_event(event).await
    }

    /// Periodic check that closes an idle scanner burst.
    pub async fn tick(&self, now: Instant) -> TerminalResult<Option<ScanOutcome>> {
        let event = self.with_decoder(|d| d.tick(now));
        self.handle_event(event).await
    }

    /// Operator's explicit "add": accepts the pending text however it was typed.
    pub async fn submit(&self) -> TerminalResult<Option<ScanOutcome>> {
        let event = self.with_decoder(ScanDecoder::submit);
        self.handle_event(event).await
    }

    /// Text typed or scanned but not yet accepted.
    pub fn pending_input(&self) -> String {
        self.with_decoder(|d| d.pending().to_string())
    }

    /// Discards the pending text.
    pub fn clear_input(&self) {
        self.with_decoder(ScanDecoder::clear);
    }

    async fn handle_event(&self, event: Option<ScanEvent>) -> TerminalResult<Option<ScanOutcome>> {
        match event {
            None => Ok(None),
            Some(ScanEvent::CodeScanned(code)) => self.scan(&code).await.map(Some),
        }
    }

    /// Adds `code` and reports an unknown code as an outcome, not an error.
    pub async fn scan(&self, code: &str) -> TerminalResult<ScanOutcome> {
        match self.add_code(code).await {
            Ok(line) => Ok(ScanOutcome::Added(line)),
            Err(e) if e.code == ErrorCode::ItemNotFound => {
                warn!(code = %code.trim(), "Scanned code not in catalog");
                Ok(ScanOutcome::NotFound(code.trim().to_string()))
            }
            Err(e) => Err(e),
        }
    }

    fn with_decoder<R>(&self, f: impl FnOnce(&mut ScanDecoder) -> R) -> R {
        let mut decoder = self.decoder.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut *decoder)
    }

    // -------------------------------------------------------------------------
    // Cart
    // -------------------------------------------------------------------------

    /// Looks `code` up and adds one unit.
    ///
    /// ## Errors
    /// - `ITEM_NOT_FOUND`: unknown code, cart unchanged
    /// - `INVALID_QUANTITY`: the line is already at the maximum quantity
    pub async fn add_code(&self, code: &str) -> TerminalResult<CartLine> {
        let code = code.trim();
        let item = self
            .catalog
            .lookup(code)
            .await?
            .ok_or_else(|| CoreError::ItemNotFound(code.to_string()))?;

        let mut cart = self.cart.lock().await;
        cart.add_item(&item)?;
        let line = cart
            .line(&item.code)
            .cloned()
            .ok_or_else(|| TerminalError::internal(format!("line {} vanished", item.code)))?;

        debug!(code = %line.item_code, quantity = line.quantity, "Item added");
        Ok(line)
    }

    /// Sets the quantity of a line; zero removes it.
    pub async fn set_quantity(&self, code: &str, quantity: i64) -> TerminalResult<()> {
        let mut cart = self.cart.lock().await;
        cart.set_quantity(code.trim(), quantity)?;
        debug!(code = %code.trim(), quantity, "Quantity set");
        Ok(())
    }

    /// [`set_quantity`](Self::set_quantity) from operator text.
    pub async fn set_quantity_str(&self, code: &str, input: &str) -> TerminalResult<()> {
        let quantity = parse_quantity(input)?;
        self.set_quantity(code, quantity).await
    }

    /// Removes a line. Returns `false` if the code was not in the cart.
    pub async fn remove_item(&self, code: &str) -> bool {
        let removed = self.cart.lock().await.remove_item(code.trim());
        debug!(code = %code.trim(), removed, "Remove item");
        removed
    }

    /// Abandons the open bill: empties the cart and the pending input.
    ///
    /// A bill can only be cancelled before it is handed to the store, so
    /// this fails with `COMMIT_IN_PROGRESS` while a commit is running.
    pub async fn cancel(&self) -> TerminalResult<()> {
        let _gate = self
            .commit_gate
            .try_lock()
            .map_err(|_| CoreError::CommitInProgress)?;

        let mut tx = CommitTransaction::new();
        tx.cancel()?;
        let mut cart = self.cart.lock().await;
        let lines = cart.lines().len();
        cart.clear();
        self.clear_input();

        info!(lines, state = tx.state().name(), "Bill cancelled");
        Ok(())
    }

    pub async fn snapshot(&self) -> CartSnapshot {
        self.cart.lock().await.snapshot()
    }

    pub async fn totals(&self) -> CartTotals {
        self.cart.lock().await.totals(self.shop.currency_precision)
    }

    // -------------------------------------------------------------------------
    // Commit
    // -------------------------------------------------------------------------

    /// Turns the cart into a persisted bill.
    ///
    /// ## Errors
    /// - `COMMIT_IN_PROGRESS`: another commit on this session is running
    /// - `EMPTY_CART`: nothing to bill, no id allocated
    /// - `VALIDATION_ERROR`: a line price is finer than the currency, so the
    ///   lines would not sum to the payable total; no id allocated
    /// - `STORAGE_ERROR`: the bill was not saved, the cart is kept for retry
    pub async fn commit(&self, payment_method: PaymentMethod) -> TerminalResult<CommitOutcome> {
        let _gate = self
            .commit_gate
            .try_lock()
            .map_err(|_| CoreError::CommitInProgress)?;
        let mut cart = self.cart.lock().await;

        let snapshot = cart.snapshot();
        let mut tx = CommitTransaction::new();
        tx.begin(&snapshot)?;

        // Stored lines must add up to the stored total
        let totals = snapshot.totals(self.shop.currency_precision);
        if !totals.is_exact() {
            let err = ValidationError::TooPrecise {
                field: "price".to_string(),
                max: self.shop.currency_precision,
            };
            warn!(subtotal = %totals.subtotal, error = %err, "Bill total needs rounding, not committed");
            tx.fail(err.to_string())?;
            return Err(CoreError::Validation(err).into());
        }

        let bill_id = match self.store.next_bill_id().await {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "Bill id allocation failed");
                tx.fail(e.to_string())?;
                return Err(CoreError::StoragePersistError(e.to_string()).into());
            }
        };
        tx.persisting(bill_id)?;

        let bill = Bill {
            bill_id,
            created_at: Utc::now(),
            payment_method,
            operator: self.operator.clone(),
            total: totals.total,
            lines: snapshot.to_bill_lines(bill_id),
        };

        if let Err(e) = self.store.persist_bill(&bill).await {
            warn!(bill_id, error = %e, "Bill not persisted, cart kept");
            tx.fail(e.to_string())?;
            return Err(CoreError::StoragePersistError(e.to_string()).into());
        }
        tx.artifact_generating()?;

        let content = BillDocument::new(&bill, &self.shop).render();
        let (artifact, warning) = match self.sink.store(&bill, &content).await {
            Ok(handle) => (Some(handle), None),
            Err(e) => {
                warn!(bill_id, error = %e, "Bill saved without artifact");
                (None, Some(CommitWarning::ArtifactGenerationFailed(e.to_string())))
            }
        };

        cart.clear();
        tx.committed()?;

        info!(
            bill_id,
            bill_number = %bill.bill_number(),
            total = %bill.total,
            payment = %payment_method,
            lines = bill.lines.len(),
            "Bill committed"
        );
        Ok(CommitOutcome {
            bill,
            artifact,
            warning,
        })
    }

    /// Renders and stores the artifact of a persisted bill again.
    pub async fn reprint(&self, bill_id: i64) -> TerminalResult<ArtifactHandle> {
        let bill = self
            .store
            .load_bill(bill_id)
            .await?
            .ok_or_else(|| TerminalError::not_found("Bill", bill_id))?;

        let content = BillDocument::new(&bill, &self.shop).reprint(true).render();
        let handle = self.sink.store(&bill, &content).await?;

        info!(bill_id, location = %handle.location, "Bill reprinted");
        Ok(handle)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
