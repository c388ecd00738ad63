//! # Till Terminal Entry Point
//!
//! ```text
//! till [--db PATH] [--operator NAME]            start billing
//! till items add SHIRT01 "Linen Shirt" 799      manage the catalog
//! till history --from 2024-03-01 --to 2024-03-31
//! till summary
//! ```
//!
//! The actual setup is in lib.rs so it can be tested.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match till_terminal::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
