//! # Commit State Machine
//!
//! Tracks one attempt to turn the cart into a persisted bill.
//!
//! ## States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Idle ─► Validating ─► Persisting ─► ArtifactGenerating ─► Committed    │
//! │   │          │          {bill_id}        {bill_id}          {bill_id}   │
//! │   │ cancel() │ cancel()     │                                           │
//! │   │ / empty  │ / empty      │ store error                               │
//! │   ▼          ▼              ▼                                           │
//! │  Failed ◄────┴──────────────┘                                           │
//! │                                                                         │
//! │  An artifact failure is a warning on the outcome, not a Failed state.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `Committed` and `Failed` are terminal. Any other move is an
//! [`CoreError::InvalidTransition`]. The driver (the billing session) owns
//! the I/O; this type only decides which step may come next.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cart::CartSnapshot;
use crate::error::{CoreError, CoreResult};

// =============================================================================
// Commit State
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitState {
    Idle,
    Validating,
    Persisting { bill_id: i64 },
    ArtifactGenerating { bill_id: i64 },
    Committed { bill_id: i64 },
    Failed { reason: String },
}

impl CommitState {
    pub const fn name(&self) -> &'static str {
        match self {
            CommitState::Idle => "Idle",
            CommitState::Validating => "Validating",
            CommitState::Persisting { .. } => "Persisting",
            CommitState::ArtifactGenerating { .. } => "ArtifactGenerating",
            CommitState::Committed { .. } => "Committed",
            CommitState::Failed { .. } => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CommitState::Committed { .. } | CommitState::Failed { .. })
    }

    /// The allocated bill id, once persisting has started.
    pub fn bill_id(&self) -> Option<i64> {
        match self {
            CommitState::Persisting { bill_id }
            | CommitState::ArtifactGenerating { bill_id }
            | CommitState::Committed { bill_id } => Some(*bill_id),
            _ => None,
        }
    }

    fn allows(&self, next: &CommitState) -> bool {
        use CommitState::*;
        match (self, next) {
            (_, Failed { .. }) => !self.is_terminal(),
            (Idle, Validating) => true,
            (Validating, Persisting { .. }) => true,
            (Persisting { bill_id: a }, ArtifactGenerating { bill_id: b }) => a == b,
            (ArtifactGenerating { bill_id: a }, Committed { bill_id: b }) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for CommitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitState::Failed { reason } => write!(f, "Failed({})", reason),
            other => match other.bill_id() {
                Some(bill_id) => write!(f, "{}({})", other.name(), bill_id),
                None => f.write_str(other.name()),
            },
        }
    }
}

// =============================================================================
// Commit Transaction
// =============================================================================

/// One commit attempt. Created in `Idle`, discarded after a terminal state.
#[derive(Debug, Clone)]
pub struct CommitTransaction {
    state: CommitState,
}

impl CommitTransaction {
    pub fn new() -> Self {
        CommitTransaction {
            state: CommitState::Idle,
        }
    }

    pub fn state(&self) -> &CommitState {
        &self.state
    }

    /// `Idle → Validating`, then checks the snapshot.
    ///
    /// ## Errors
    /// - `EmptyCart`: the transaction moves to `Failed`, no id is allocated
    pub fn begin(&mut self, snapshot: &CartSnapshot) -> CoreResult<()> {
        self.transition(CommitState::Validating)?;
        if snapshot.is_empty() {
            self.fail(CoreError::EmptyCart.to_string())?;
            return Err(CoreError::EmptyCart);
        }
        Ok(())
    }

    /// `Validating → Persisting{bill_id}` once an id has been allocated.
    pub fn persisting(&mut self, bill_id: i64) -> CoreResult<()> {
        self.transition(CommitState::Persisting { bill_id })
    }

    /// `Persisting → ArtifactGenerating` after the bill is durable.
    pub fn artifact_generating(&mut self) -> CoreResult<()> {
        let bill_id = self.require_bill_id("ArtifactGenerating")?;
        self.transition(CommitState::ArtifactGenerating { bill_id })
    }

    /// `ArtifactGenerating → Committed`.
    pub fn committed(&mut self) -> CoreResult<()> {
        let bill_id = self.require_bill_id("Committed")?;
        self.transition(CommitState::Committed { bill_id })
    }

    /// Any non-terminal state → `Failed`.
    pub fn fail(&mut self, reason: impl Into<String>) -> CoreResult<()> {
        self.transition(CommitState::Failed {
            reason: reason.into(),
        })
    }

    /// Abandons the attempt. Only possible before a bill id is allocated.
    pub fn cancel(&mut self) -> CoreResult<()> {
        match self.state {
            CommitState::Idle | CommitState::Validating => self.fail("cancelled"),
            _ => Err(self.invalid("Failed")),
        }
    }

    fn transition(&mut self, next: CommitState) -> CoreResult<()> {
        if !self.state.allows(&next) {
            return Err(self.invalid(next.name()));
        }
        self.state = next;
        Ok(())
    }

    fn require_bill_id(&self, to: &str) -> CoreResult<i64> {
        self.state.bill_id().ok_or_else(|| self.invalid(to))
    }

    fn invalid(&self, to: &str) -> CoreError {
        CoreError::InvalidTransition {
            from: self.state.name().to_string(),
            to: to.to_string(),
        }
    }
}

impl Default for CommitTransaction {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::Cart;
    use crate::money::Money;
    use crate::types::Item;

    fn filled_snapshot() -> CartSnapshot {
        let mut cart = Cart::new();
        cart.add_item(&Item::new("A", "A", Money::from_cents(100))).unwrap();
        cart.snapshot()
    }

    #[test]
    fn test_happy_path() {
        let mut tx = CommitTransaction::new();
        tx.begin(&filled_snapshot()).unwrap();
        assert_eq!(tx.state(), &CommitState::Validating);

        tx.persisting(12).unwrap();
        tx.artifact_generating().unwrap();
        assert_eq!(tx.state(), &CommitState::ArtifactGenerating { bill_id: 12 });

        tx.committed().unwrap();
        assert_eq!(tx.state(), &CommitState::Committed { bill_id: 12 });
        assert!(tx.state().is_terminal());
    }

    #[test]
    fn test_empty_snapshot_fails() {
        let mut tx = CommitTransaction::new();
        let err = tx.begin(&Cart::new().snapshot()).unwrap_err();

        assert!(matches!(err, CoreError::EmptyCart));
        assert!(matches!(tx.state(), CommitState::Failed { .. }));
        assert_eq!(tx.state().bill_id(), None);
    }

    #[test]
    fn test_illegal_transitions() {
        let mut tx = CommitTransaction::new();
        assert!(matches!(
            tx.committed(),
            Err(CoreError::InvalidTransition { ref from, .. }) if from == "Idle"
        ));
        assert!(tx.persisting(1).is_err());
        assert_eq!(tx.state(), &CommitState::Idle);

        tx.begin(&filled_snapshot()).unwrap();
        assert!(tx.begin(&filled_snapshot()).is_err());
        assert!(tx.artifact_generating().is_err());
    }

    #[test]
    fn test_failed_is_terminal() {
        let mut tx = CommitTransaction::new();
        tx.begin(&filled_snapshot()).unwrap();
        tx.persisting(3).unwrap();
        tx.fail("disk full").unwrap();

        assert_eq!(
            tx.state(),
            &CommitState::Failed {
                reason: "disk full".to_string()
            }
        );
        assert!(tx.fail("again").is_err());
        assert!(tx.artifact_generating().is_err());
    }

    #[test]
    fn test_cancel_only_before_persisting() {
        let mut tx = CommitTransaction::new();
        tx.cancel().unwrap();
        assert!(matches!(tx.state(), CommitState::Failed { .. }));

        let mut tx = CommitTransaction::new();
        tx.begin(&filled_snapshot()).unwrap();
        tx.cancel().unwrap();

        let mut tx = CommitTransaction::new();
        tx.begin(&filled_snapshot()).unwrap();
        tx.persisting(9).unwrap();
        assert!(matches!(
            tx.cancel(),
            Err(CoreError::InvalidTransition { ref from, .. }) if from == "Persisting"
        ));
        assert_eq!(tx.state().bill_id(), Some(9));
    }

    #[test]
    fn test_display() {
        assert_eq!(CommitState::Idle.to_string(), "Idle");
        assert_eq!(CommitState::Persisting { bill_id: 4 }.to_string(), "Persisting(4)");
    }
}
