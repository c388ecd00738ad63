//! # Till Terminal Library
//!
//! The billing terminal: a `BillingSession` driven by a command line loop.
//!
//! ## Module Organization
//! ```text
//! till_terminal/
//! ├── lib.rs          ◄─── You are here (logging + entry point)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── session.rs  ◄─── Cart, scanner decoder, commit driver
//! │   ├── artifact.rs ◄─── Bill files on disk
//! │   └── config.rs   ◄─── TerminalConfig layers
//! ├── commands/
//! │   ├── mod.rs      ◄─── clap definitions and dispatch
//! │   ├── billing.rs  ◄─── Interactive billing loop
//! │   ├── items.rs    ◄─── Catalog management
//! │   ├── history.rs  ◄─── Bill history and day summary
//! │   └── shop.rs     ◄─── Shop details
//! └── error.rs        ◄─── Operator-facing error type
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Terminal Startup                                  │
//! │                                                                         │
//! │  1. Parse the command line (clap)                                       │
//! │  2. Initialize logging to stderr (RUST_LOG, default info)               │
//! │  3. Load TerminalConfig: defaults ← config.json ← TILL_* ← flags        │
//! │  4. Open SQLite (WAL) and run pending migrations                        │
//! │  5. Run the command; `run` builds one BillingSession and reads stdin    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod error;
pub mod state;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use commands::Cli;
use error::TerminalResult;

/// Parses arguments and runs the terminal.
pub async fn run() -> TerminalResult<()> {
    let cli = Cli::parse();
    init_tracing();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Till terminal");
    commands::dispatch(cli).await
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=till=trace` - Show trace for till crates only
/// - Default: `info,till=debug,sqlx=warn`
///
/// Logs go to stderr so command output on stdout stays clean.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,till=debug,sqlx=warn"));

    // try_init: a second call (tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
