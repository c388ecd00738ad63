//! # Billing Loop
//!
//! The interactive `run` command: reads the input channel, feeds it through
//! the session's scanner decoder, and handles `/` commands.
//!
//! ## Input
//! ```text
//! SHIRT01                 a code (scanner burst or typed line)
//! /add [CODE]             add CODE, or accept the pending typed text
//! /qty CODE N             set a quantity (0 removes the line)
//! /remove CODE            remove a line
//! /cancel                 abandon the open bill
//! /total                  show the cart
//! /pay cash|upi|card      commit the bill
//! /history [N]            last N bills
//! /reprint BILL_ID        write a bill file again
//! /help, /quit
//! ```
//!
//! A 50 ms tick runs beside the input so a scanner burst without a
//! terminator is still accepted once the channel goes quiet.

use std::io::Write;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::error::{TerminalError, TerminalResult};
use crate::state::{BillingSession, CommitOutcome, ScanOutcome};
use till_core::{ArtifactSink, BillStore, ItemCatalog, PaymentMethod};
use till_db::BillRepository;

/// Interval of the scanner idle check.
pub const TICK_INTERVAL: Duration = Duration::from_millis(50);

const HELP: &str = "\
Scan or type an item code and press Enter.
  /add [CODE]          add CODE, or the text typed so far
  /qty CODE N          set quantity (0 removes)
  /remove CODE         remove an item
  /cancel              cancel the current bill
  /total               show the current bill
  /pay cash|upi|card   finish the bill
  /history [N]         recent bills
  /reprint BILL_ID     print a bill again
  /quit                leave";

/// A parsed `/` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Add(Option<String>),
    Quantity { code: String, quantity: String },
    Remove(String),
    Cancel,
    Total,
    Pay(PaymentMethod),
    History(u32),
    Reprint(i64),
    Help,
    Quit,
}

/// Parses one `/` command line.
pub fn parse_command(line: &str) -> TerminalResult<Input> {
    let mut words = line.trim().trim_start_matches('/').split_whitespace();
    let name = words.next().unwrap_or("").to_ascii_lowercase();
    let args: Vec<&str> = words.collect();

    let input = match (name.as_str(), args.as_slice()) {
        ("add", []) => Input::Add(None),
        ("add", [code]) => Input::Add(Some(code.to_string())),
        ("qty", [code, quantity]) => Input::Quantity {
            code: code.to_string(),
            quantity: quantity.to_string(),
        },
        ("remove" | "rm", [code]) => Input::Remove(code.to_string()),
        ("cancel" | "clear", []) => Input::Cancel,
        ("total", []) => Input::Total,
        ("pay", [method]) => Input::Pay(method.parse()?),
        ("history", []) => Input::History(10),
        ("history", [n]) => Input::History(
            n.parse()
                .map_err(|_| TerminalError::validation(format!("not a bill count: {}", n)))?,
        ),
        ("reprint", [id]) => Input::Reprint(
            id.parse()
                .map_err(|_| TerminalError::validation(format!("not a bill id: {}", id)))?,
        ),
        ("help" | "?", []) => Input::Help,
        ("quit" | "exit", []) => Input::Quit,
        _ => {
            return Err(TerminalError::validation(format!(
                "unknown command '{}', try /help",
                line.trim()
            )))
        }
    };
    Ok(input)
}

enum Flow {
    Continue,
    Quit,
}

/// Drives one session from an input channel.
pub struct BillingLoop<'a, C, S, A> {
    session: &'a BillingSession<C, S, A>,
    bills: BillRepository,
}

impl<'a, C, S, A> BillingLoop<'a, C, S, A>
where
    C: ItemCatalog,
    S: BillStore,
    A: ArtifactSink,
{
    pub fn new(session: &'a BillingSession<C, S, A>, bills: BillRepository) -> Self {
        BillingLoop { session, bills }
    }

    /// Runs until `/quit` or end of input. Command errors are printed and
    /// the loop goes on; only a failing output stream ends it early.
    pub async fn run<R, W>(&self, input: R, out: &mut W) -> TerminalResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let shop = self.session.shop();
        writeln!(out, "{} - billing as {}. /help for commands.", shop.name, self.session.operator())?;
        info!(operator = %self.session.operator(), "Billing loop started");

        let mut lines = input.lines();
        let mut ticker = tokio::time::interval(TICK_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        debug!("Input closed");
                        break;
                    };
                    match self.handle_line(&line, out).await {
                        Ok(Flow::Continue) => {}
                        Ok(Flow::Quit) => break,
                        Err(e) => writeln!(out, "error: {}", e)?,
                    }
                }
                _ = ticker.tick() => {
                    match self.session.tick(Instant::now()).await {
                        Ok(Some(outcome)) => self.print_scan(&outcome, out)?,
                        Ok(None) => {}
                        Err(e) => writeln!(out, "error: {}", e)?,
                    }
                }
            }
        }

        let open = self.session.snapshot().await;
        if !open.is_empty() {
            writeln!(out, "Leaving with {} unbilled line(s).", open.lines().len())?;
        }
        info!("Billing loop finished");
        Ok(())
    }

    async fn handle_line<W: Write>(&self, line: &str, out: &mut W) -> TerminalResult<Flow> {
        if line.trim_start().starts_with('/') {
            return self.handle_command(parse_command(line)?, out).await;
        }

        // A whole line arrives at once, so it reads as one burst.
        let at = Instant::now();
        for ch in line.chars().chain(std::iter::once('\n')) {
            if let Some(outcome) = self.session.feed_char(ch, at).await? {
                self.print_scan(&outcome, out)?;
            }
        }
        Ok(Flow::Continue)
    }

    async fn handle_command<W: Write>(&self, input: Input, out: &mut W) -> TerminalResult<Flow> {
        match input {
            Input::Add(Some(code)) => {
                let outcome = self.session.scan(&code).await?;
                self.print_scan(&outcome, out)?;
            }
            Input::Add(None) => match self.session.submit().await? {
                Some(outcome) => self.print_scan(&outcome, out)?,
                None => writeln!(out, "Nothing typed.")?,
            },
            Input::Quantity { code, quantity } => {
                self.session.set_quantity_str(&code, &quantity).await?;
                self.print_cart(out).await?;
            }
            Input::Remove(code) => {
                if self.session.remove_item(&code).await {
                    self.print_cart(out).await?;
                } else {
                    writeln!(out, "{} is not in the bill.", code)?;
                }
            }
            Input::Cancel => {
                self.session.cancel().await?;
                writeln!(out, "Bill cancelled.")?;
            }
            Input::Total => self.print_cart(out).await?,
            Input::Pay(method) => {
                let outcome = self.session.commit(method).await?;
                self.print_commit(&outcome, out)?;
            }
            Input::History(limit) => {
                let bills = self.bills.list_recent(limit).await?;
                super::history::print_summaries(&bills, self.session.shop(), out)?;
            }
            Input::Reprint(bill_id) => {
                let handle = self.session.reprint(bill_id).await?;
                writeln!(out, "Reprinted to {}", handle.location)?;
            }
            Input::Help => writeln!(out, "{}", HELP)?,
            Input::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn print_scan<W: Write>(&self, outcome: &ScanOutcome, out: &mut W) -> TerminalResult<()> {
        let shop = self.session.shop();
        match outcome {
            ScanOutcome::Added(line) => writeln!(
                out,
                "+ {} {} x{} = {}",
                line.item_code,
                line.name,
                line.quantity,
                shop.format_money(line.line_total())
            )?,
            ScanOutcome::NotFound(code) => writeln!(out, "? {} not found", code)?,
        }
        Ok(())
    }

    async fn print_cart<W: Write>(&self, out: &mut W) -> TerminalResult<()> {
        let shop = self.session.shop();
        let snapshot = self.session.snapshot().await;
        if snapshot.is_empty() {
            writeln!(out, "Bill is empty.")?;
            return Ok(());
        }

        for line in snapshot.lines() {
            writeln!(
                out,
                "  {:<12} {:<20} {:>4} x {:>10} = {:>11}",
                line.item_code,
                line.name,
                line.quantity,
                shop.format_money(line.unit_price),
                shop.format_money(line.line_total())
            )?;
        }
        let totals = snapshot.totals(shop.currency_precision);
        writeln!(
            out,
            "  {} item(s), TOTAL {}",
            totals.total_quantity,
            shop.format_money(totals.total)
        )?;
        Ok(())
    }

    fn print_commit<W: Write>(&self, outcome: &CommitOutcome, out: &mut W) -> TerminalResult<()> {
        let bill = &outcome.bill;
        writeln!(
            out,
            "Bill {} ({}) paid by {}: {}",
            bill.bill_number(),
            bill.bill_id,
            bill.payment_method,
            self.session.shop().format_money(bill.total)
        )?;
        if let Some(handle) = &outcome.artifact {
            writeln!(out, "Saved to {}", handle.location)?;
        }
        if let Some(warning) = &outcome.warning {
            writeln!(out, "warning: {} (use /reprint {})", warning, bill.bill_id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::FileArtifactSink;
    use till_core::{Item, Money};
    use till_db::{Database, DbConfig, ItemRepository};

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("/pay UPI").unwrap(), Input::Pay(PaymentMethod::Upi));
        assert_eq!(
            parse_command("/qty SHIRT01 3").unwrap(),
            Input::Quantity {
                code: "SHIRT01".into(),
                quantity: "3".into()
            }
        );
        assert_eq!(parse_command("/add").unwrap(), Input::Add(None));
        assert_eq!(parse_command("/history").unwrap(), Input::History(10));
        assert_eq!(parse_command("  /QUIT ").unwrap(), Input::Quit);

        let err = parse_command("/pay bitcoin").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPaymentMethod);
        let err = parse_command("/dance").unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(parse_command("/reprint seven").is_err());
    }

    async fn fixture(
        dir: &tempfile::TempDir,
    ) -> (Database, BillingSession<ItemRepository, BillRepository, FileArtifactSink>) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for (code, name, cents) in [("SHIRT01", "Linen Shirt", 1000), ("CAP01", "Cap", 2500)] {
            db.items()
                .insert(&Item::new(code, name, Money::from_cents(cents)))
                .await
                .unwrap();
        }
        let session = BillingSession::new(
            db.items(),
            db.bills(),
            FileArtifactSink::new(dir.path()),
        );
        (db, session)
    }

    async fn run_script(script: &str) -> (Database, String) {
        let dir = tempfile::tempdir().unwrap();
        let (db, session) = fixture(&dir).await;
        let mut out = Vec::new();

        BillingLoop::new(&session, db.bills())
            .run(script.as_bytes(), &mut out)
            .await
            .unwrap();
        (db, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_scan_and_pay() {
        let (db, out) = run_script("SHIRT01\nSHIRT01\nCAP01\n/total\n/pay upi\n/quit\n").await;

        assert!(out.contains("+ SHIRT01 Linen Shirt x2 = Rs.20.00"));
        assert!(out.contains("TOTAL Rs.45.00"));
        assert!(out.contains("paid by UPI: Rs.45.00"));
        assert_eq!(db.bills().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_errors_do_not_end_the_loop() {
        let (db, out) = run_script("NOPE\n/pay cash\n/pay bitcoin\nCAP01\n/pay cash\n").await;

        assert!(out.contains("? NOPE not found"));
        assert!(out.contains("[EMPTY_CART]"));
        assert!(out.contains("[INVALID_PAYMENT_METHOD]"));
        assert!(out.contains("paid by CASH: Rs.25.00"));
        assert_eq!(db.bills().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_history_and_reprint() {
        let (_db, out) = run_script("CAP01\n/pay card\n/history\n/reprint 1\n/reprint 9\n").await;

        assert!(out.contains("Reprinted to"));
        assert!(out.contains("[NOT_FOUND] Bill not found: 9"));
    }

    #[tokio::test]
    async fn test_cancel_drops_open_bill() {
        let (db, out) = run_script("CAP01\n/cancel\n/total\nSHIRT01\n/pay cash\n").await;

        assert!(out.contains("Bill cancelled."));
        assert!(out.contains("Bill is empty."));
        assert!(out.contains("paid by CASH: Rs.10.00"));
        assert_eq!(db.bills().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_quit_reports_open_bill() {
        let (db, out) = run_script("CAP01\n/quit\nSHIRT01\n").await;

        assert!(out.contains("Leaving with 1 unbilled line(s)."));
        assert!(!out.contains("SHIRT01"));
        assert_eq!(db.bills().count().await.unwrap(), 0);
    }
}
