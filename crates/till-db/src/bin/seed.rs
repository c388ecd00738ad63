//! # Catalog Seeder
//!
//! Loads a sample clothing catalog so the terminal has something to scan.
//!
//! ## Usage
//! ```bash
//! cargo run -p till-db --bin seed
//! cargo run -p till-db --bin seed -- --db ./data/till.db
//! ```
//!
//! Codes already in the catalog are left alone, so the seeder can be
//! re-run safely against a live database.

use std::env;
use till_core::{Item, Money};
use till_db::{Database, DbConfig, DbError};

/// `(code, name, price)` for each sample item.
const CATALOG: &[(&str, &str, &str)] = &[
    ("SHIRT01", "Linen Shirt White", "799.00"),
    ("SHIRT02", "Linen Shirt Blue", "799.00"),
    ("SHIRT03", "Oxford Shirt", "1099.00"),
    ("TEE01", "Cotton T-Shirt", "349.00"),
    ("TEE02", "Graphic T-Shirt", "449.00"),
    ("JEANS-30", "Denim Jeans 30", "1499.00"),
    ("JEANS-32", "Denim Jeans 32", "1499.00"),
    ("JEANS-34", "Denim Jeans 34", "1499.00"),
    ("CHINO01", "Cotton Chinos", "1199.00"),
    ("KURTA01", "Cotton Kurta", "899.00"),
    ("KURTA02", "Festive Kurta", "1899.00"),
    ("SAREE01", "Kasavu Saree", "2499.00"),
    ("SAREE02", "Silk Saree", "4999.00"),
    ("MUNDU01", "Kerala Mundu", "599.00"),
    ("DRESS01", "Summer Dress", "1299.00"),
    ("SCARF01", "Printed Scarf", "299.50"),
    ("SOCK01", "Ankle Socks (3 pack)", "199.00"),
    ("BELT01", "Leather Belt", "649.00"),
    ("CAP01", "Baseball Cap", "250.00"),
    ("HANKY01", "Handkerchief", "45.00"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./till_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Till catalog seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./till_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Till catalog seeder");
    println!("Database: {}", db_path);

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let items = db.items();

    let mut added = 0;
    let mut skipped = 0;
    for (code, name, price) in CATALOG {
        let item = Item::new(*code, *name, Money::parse(price)?);
        match items.insert(&item).await {
            Ok(()) => added += 1,
            Err(DbError::UniqueViolation { .. }) => skipped += 1,
            Err(e) => {
                eprintln!("Failed to insert {}: {}", code, e);
            }
        }
    }

    println!("Added {} items, {} already present", added, skipped);
    println!("Catalog now holds {} items", items.count().await?);

    db.close().await;
    Ok(())
}
