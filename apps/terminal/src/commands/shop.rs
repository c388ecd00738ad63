//! # Shop Commands
//!
//! Shows and edits the shop details printed at the top of every bill.

use std::io::Write;

use tracing::info;

use crate::error::TerminalResult;
use till_core::ShopInfo;
use till_db::Database;

/// Fields to change. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ShopChanges {
    pub name: Option<String>,
    pub tagline: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub currency_symbol: Option<String>,
    pub currency_precision: Option<u32>,
}

impl ShopChanges {
    fn apply(self, shop: &mut ShopInfo) {
        if let Some(name) = self.name {
            shop.name = name;
        }
        if let Some(tagline) = self.tagline {
            shop.tagline = tagline;
        }
        if let Some(address) = self.address {
            shop.address = address;
        }
        if let Some(phone) = self.phone {
            shop.phone = phone;
        }
        if let Some(email) = self.email {
            shop.email = email;
        }
        if let Some(symbol) = self.currency_symbol {
            shop.currency_symbol = symbol;
        }
        if let Some(precision) = self.currency_precision {
            shop.currency_precision = precision;
        }
    }
}

pub async fn show<W: Write>(db: &Database, out: &mut W) -> TerminalResult<()> {
    let shop = db.settings().get_shop_info().await?;
    print_shop(&shop, out)
}

pub async fn set<W: Write>(db: &Database, changes: ShopChanges, out: &mut W) -> TerminalResult<()> {
    let settings = db.settings();
    let mut shop = settings.get_shop_info().await?;
    changes.apply(&mut shop);
    settings.update_shop_info(&shop).await?;

    info!(name = %shop.name, "Shop details changed");
    print_shop(&shop, out)
}

fn print_shop<W: Write>(shop: &ShopInfo, out: &mut W) -> TerminalResult<()> {
    writeln!(out, "Name:      {}", shop.name)?;
    writeln!(out, "Tagline:   {}", shop.tagline)?;
    writeln!(out, "Address:   {}", shop.address)?;
    writeln!(out, "Phone:     {}", shop.phone)?;
    writeln!(out, "Email:     {}", shop.email)?;
    writeln!(
        out,
        "Currency:  {} ({} decimals)",
        shop.currency_symbol, shop.currency_precision
    )?;
    Ok(())
}
