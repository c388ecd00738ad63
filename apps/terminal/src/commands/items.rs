//! # Catalog Commands
//!
//! `items add|update|remove|list`. Price edits only affect bills opened
//! after the change.

use std::io::Write;

use tracing::info;

use crate::error::TerminalResult;
use till_core::{Item, Money};
use till_db::Database;

pub async fn add<W: Write>(
    db: &Database,
    code: &str,
    name: &str,
    price: &str,
    out: &mut W,
) -> TerminalResult<()> {
    let item = Item::new(code.trim(), name.trim(), Money::parse(price)?);
    db.items().insert(&item).await?;
    info!(code = %item.code, price = %item.unit_price, "Item added to catalog");
    writeln!(out, "Added {} {} at {}", item.code, item.name, item.unit_price)?;
    Ok(())
}

pub async fn update<W: Write>(
    db: &Database,
    code: &str,
    name: &str,
    price: &str,
    out: &mut W,
) -> TerminalResult<()> {
    let item = Item::new(code.trim(), name.trim(), Money::parse(price)?);
    db.items().update(&item).await?;
    info!(code = %item.code, price = %item.unit_price, "Catalog item updated");
    writeln!(out, "Updated {} {} at {}", item.code, item.name, item.unit_price)?;
    Ok(())
}

pub async fn remove<W: Write>(db: &Database, code: &str, out: &mut W) -> TerminalResult<()> {
    db.items().delete(code).await?;
    info!(code = %code, "Catalog item removed");
    writeln!(out, "Removed {}", code)?;
    Ok(())
}

pub async fn list<W: Write>(db: &Database, out: &mut W) -> TerminalResult<()> {
    let items = db.items().list().await?;
    if items.is_empty() {
        writeln!(out, "Catalog is empty. Add items with `till items add`.")?;
        return Ok(());
    }

    for item in &items {
        writeln!(out, "{:<16} {:<32} {:>12}", item.code, item.name, item.unit_price.to_string())?;
    }
    writeln!(out, "{} item(s)", items.len())?;
    Ok(())
}
