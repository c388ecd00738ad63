//! # State Module
//!
//! Everything the terminal holds between keystrokes.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────────┐  │
//! │  │ TerminalConfig   │  │ BillingSession   │  │ FileArtifactSink     │  │
//! │  │                  │  │                  │  │                      │  │
//! │  │ db_path          │  │ cart (Mutex)     │  │ bills_dir/           │  │
//! │  │ bills_dir        │  │ decoder          │  │   bill_<number>.pdf  │  │
//! │  │ operator         │  │ commit gate      │  │                      │  │
//! │  │ scanner timings  │  │ shop info        │  │                      │  │
//! │  └──────────────────┘  └──────────────────┘  └──────────────────────┘  │
//! │                                                                         │
//! │  There are no globals: the CLI builds one session and passes it down.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod artifact;
mod config;
mod pdf;
mod session;

pub use artifact::FileArtifactSink;
pub use config::{data_dir, ConfigOverrides, TerminalConfig};
pub use session::{BillingSession, CommitOutcome, CommitWarning, ScanOutcome};
