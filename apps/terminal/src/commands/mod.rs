//! # Commands Module
//!
//! The `till` command line.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (clap definitions, dispatch)
//! ├── billing.rs  ◄─── `till run`: the interactive billing loop
//! ├── items.rs    ◄─── `till items add|update|remove|list`
//! ├── history.rs  ◄─── `till history`, `till show`, `till summary`
//! └── shop.rs     ◄─── `till shop show|set`
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  till --operator anu run                                               │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Cli::parse()  ──►  TerminalConfig::load (file ← env ← flags)          │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Database::new(DbConfig::new(config.db_path))  (migrations run)        │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  dispatch ──► billing / items / history / shop                         │
//! │                 each returns TerminalResult<()>                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod billing;
pub mod history;
pub mod items;
pub mod shop;

use std::io::Write;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tokio::io::BufReader;
use tracing::info;

use crate::error::TerminalResult;
use crate::state::{BillingSession, ConfigOverrides, FileArtifactSink, TerminalConfig};
use billing::BillingLoop;
use shop::ShopChanges;
use till_db::{Database, DbConfig};

/// Till billing terminal.
#[derive(Debug, Parser)]
#[command(name = "till", version, about)]
pub struct Cli {
    /// JSON config file
    #[arg(long, global = true, env = "TILL_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Directory for bill files
    #[arg(long, global = true)]
    pub bills_dir: Option<PathBuf>,

    /// Operator name recorded on bills
    #[arg(long, global = true)]
    pub operator: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start billing (default)
    Run,

    /// Manage the item catalog
    #[command(subcommand)]
    Items(ItemsCommand),

    /// List committed bills, newest first
    History(HistoryArgs),

    /// Print one bill
    Show {
        bill_id: i64,
    },

    /// Bill count and revenue for a day
    Summary {
        /// Day to summarize (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Shop details printed on bills
    #[command(subcommand)]
    Shop(ShopCommand),
}

#[derive(Debug, Subcommand)]
pub enum ItemsCommand {
    /// Add a new item
    Add {
        code: String,
        name: String,
        /// Unit price, e.g. 799.00
        price: String,
    },
    /// Change the name and price of an item
    Update {
        code: String,
        name: String,
        price: String,
    },
    /// Delete an item (bills keep their copy)
    Remove { code: String },
    /// List all items
    List,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// First day (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Bills to show when no dates are given
    #[arg(long, default_value_t = 20)]
    pub limit: u32,
}

#[derive(Debug, Subcommand)]
pub enum ShopCommand {
    /// Show shop details
    Show,
    /// Change shop details
    Set {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        tagline: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        currency_symbol: Option<String>,
        #[arg(long)]
        currency_precision: Option<u32>,
    },
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            db_path: self.db.clone(),
            bills_dir: self.bills_dir.clone(),
            operator: self.operator.clone(),
        }
    }
}

/// Loads configuration, opens the database and runs the chosen command.
pub async fn dispatch(cli: Cli) -> TerminalResult<()> {
    let config = TerminalConfig::load(cli.config.as_deref(), &cli.overrides())?;
    let db = open_database(&config).await?;
    let mut out = std::io::stdout();

    let result = execute(cli.command.unwrap_or(Command::Run), &config, &db, &mut out).await;
    db.close().await;
    result
}

async fn execute<W: Write>(
    command: Command,
    config: &TerminalConfig,
    db: &Database,
    out: &mut W,
) -> TerminalResult<()> {
    match command {
        Command::Run => run_billing(config, db, out).await,
        Command::Items(ItemsCommand::Add { code, name, price }) => {
            items::add(db, &code, &name, &price, out).await
        }
        Command::Items(ItemsCommand::Update { code, name, price }) => {
            items::update(db, &code, &name, &price, out).await
        }
        Command::Items(ItemsCommand::Remove { code }) => items::remove(db, &code, out).await,
        Command::Items(ItemsCommand::List) => items::list(db, out).await,
        Command::History(args) => history::list(db, args.from, args.to, args.limit, out).await,
        Command::Show { bill_id } => history::show(db, bill_id, out).await,
        Command::Summary { date } => history::summary(db, date, out).await,
        Command::Shop(ShopCommand::Show) => shop::show(db, out).await,
        Command::Shop(ShopCommand::Set {
            name,
            tagline,
            address,
            phone,
            email,
            currency_symbol,
            currency_precision,
        }) => {
            let changes = ShopChanges {
                name,
                tagline,
                address,
                phone,
                email,
                currency_symbol,
                currency_precision,
            };
            shop::set(db, changes, out).await
        }
    }
}

async fn run_billing<W: Write>(
    config: &TerminalConfig,
    db: &Database,
    out: &mut W,
) -> TerminalResult<()> {
    let shop = db.settings().get_shop_info().await?;
    let session = BillingSession::new(
        db.items(),
        db.bills(),
        FileArtifactSink::new(&config.bills_dir),
    )
    .with_shop(shop)
    .with_operator(config.operator.clone())
    .with_timings(config.scanner_timings());

    info!(bills_dir = %config.bills_dir.display(), "Bill files directory");
    let stdin = BufReader::new(tokio::io::stdin());
    BillingLoop::new(&session, db.bills()).run(stdin, out).await
}

async fn open_database(config: &TerminalConfig) -> TerminalResult<Database> {
    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(Database::new(DbConfig::new(&config.db_path)).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["till", "history", "--limit", "5", "--db", "/tmp/t.db"]).unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/t.db")));
        match cli.command {
            Some(Command::History(args)) => assert_eq!(args.limit, 5),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_defaults_to_run() {
        let cli = Cli::try_parse_from(["till", "--operator", "anu"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.overrides().operator.as_deref(), Some("anu"));
    }

    #[test]
    fn test_cli_rejects_bad_date() {
        assert!(Cli::try_parse_from(["till", "summary", "--date", "15/03/2024"]).is_err());
    }

    #[tokio::test]
    async fn test_execute_items_against_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = TerminalConfig {
            db_path: dir.path().join("data").join("till.db"),
            bills_dir: dir.path().join("bills"),
            ..TerminalConfig::default()
        };
        let db = open_database(&config).await.unwrap();
        let mut out = Vec::new();

        let add = ItemsCommand::Add {
            code: "CAP01".into(),
            name: "Cap".into(),
            price: "250".into(),
        };
        execute(Command::Items(add), &config, &db, &mut out).await.unwrap();
        execute(Command::Items(ItemsCommand::List), &config, &db, &mut out).await.unwrap();

        assert!(String::from_utf8(out).unwrap().contains("1 item(s)"));
        assert!(config.db_path.exists());
        db.close().await;
    }
}
