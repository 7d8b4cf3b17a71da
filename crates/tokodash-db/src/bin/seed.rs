//! # Seed Data Generator
//!
//! Populates a database with a small back office for development.
//!
//! ## Usage
//! ```bash
//! # Seed with defaults (3 variants per product)
//! cargo run -p tokodash-db --bin seed
//!
//! # More variants per product
//! cargo run -p tokodash-db --bin seed -- --variants 5
//!
//! # Specify database path
//! cargo run -p tokodash-db --bin seed -- --db ./data/tokodash.db
//! ```
//!
//! ## Generated Data
//! - One platform per marketplace, each with a store
//! - Products with size variants, SKU `{CODE}-{SIZE}`
//! - Expense and income categories

use chrono::Utc;
use std::env;
use tokodash_core::{
    Category, CategoryKind, Platform, Product, ProductVariant, Store, DEFAULT_TENANT_ID,
};
use tokodash_db::{repository::generate_id, Database, DbConfig};

/// Marketplaces and the store selling on each
const PLATFORMS: &[(&str, &str)] = &[
    ("Shopee", "Toko Berkah Shopee"),
    ("Tokopedia", "Toko Berkah Tokped"),
    ("TikTok Shop", "Toko Berkah Live"),
];

/// Product code, name, base price in rupiah
const PRODUCTS: &[(&str, &str, i64)] = &[
    ("KMJ", "Kemeja Flanel", 125_000),
    ("KOS", "Kaos Polos", 45_000),
    ("CLN", "Celana Chino", 150_000),
    ("JKT", "Jaket Hoodie", 185_000),
    ("TOP", "Topi Baseball", 35_000),
    ("TAS", "Tas Selempang", 95_000),
];

/// Size name, price addon
const SIZES: &[(&str, i64)] = &[
    ("S", 0),
    ("M", 0),
    ("L", 5_000),
    ("XL", 10_000),
    ("XXL", 15_000),
];

const EXPENSE_CATEGORIES: &[&str] = &["Iklan", "Packaging", "Gaji", "Ongkir", "Sewa"];
const INCOME_CATEGORIES: &[&str] = &["Cashback", "Refund Ongkir"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut variants_per_product: usize = 3;
    let mut db_path = String::from("./tokodash_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--variants" | "-v" => {
                if i + 1 < args.len() {
                    variants_per_product = args[i + 1].parse().unwrap_or(3).clamp(1, SIZES.len());
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("TokoDash Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -v, --variants <N>  Size variants per product, 1-5 (default: 3)");
                println!("  -d, --db <PATH>     Database file path (default: ./tokodash_dev.db)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 TokoDash Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.stores().list_platforms().await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} platforms", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();

    for (platform_name, store_name) in PLATFORMS {
        let platform = Platform {
            id: generate_id(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            name: platform_name.to_string(),
            created_at: now,
        };
        db.stores().insert_platform(&platform).await?;

        let store = Store {
            id: generate_id(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            name: store_name.to_string(),
            platform_id: Some(platform.id.clone()),
            saldo_dashboard: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.stores().insert_store(&store).await?;
    }
    println!("✓ Created {} platforms with stores", PLATFORMS.len());

    let mut generated = 0;
    for (product_idx, (code, name, base_price)) in PRODUCTS.iter().enumerate() {
        let product = Product {
            id: generate_id(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            name: name.to_string(),
            description: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert_product(&product).await?;

        for (size_idx, (size, addon)) in SIZES.iter().take(variants_per_product).enumerate() {
            let variant = generate_variant(&product.id, code, size, base_price + addon, product_idx * 10 + size_idx);

            if let Err(e) = db.products().insert_variant(&variant).await {
                eprintln!("Failed to insert {}: {}", variant.sku, e);
                continue;
            }
            generated += 1;
        }
    }
    println!("✓ Generated {} variants across {} products", generated, PRODUCTS.len());

    let kinds = EXPENSE_CATEGORIES
        .iter()
        .map(|name| (name, CategoryKind::Expense))
        .chain(INCOME_CATEGORIES.iter().map(|name| (name, CategoryKind::Income)));
    for (name, kind) in kinds {
        db.finance()
            .insert_category(&Category {
                id: generate_id(),
                tenant_id: DEFAULT_TENANT_ID.to_string(),
                name: name.to_string(),
                kind,
                created_at: now,
            })
            .await?;
    }
    println!(
        "✓ Created {} categories",
        EXPENSE_CATEGORIES.len() + INCOME_CATEGORIES.len()
    );

    let low = db.products().low_stock(tokodash_core::DEFAULT_LOW_STOCK_THRESHOLD).await?;
    println!("  Low stock variants: {}", low.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates one variant with a deterministic cost and stock level.
fn generate_variant(product_id: &str, code: &str, size: &str, price: i64, seed: usize) -> ProductVariant {
    let now = Utc::now();

    // Cost is 55-74% of price, rounded to the nearest hundred rupiah
    let cost_pct = 55 + (seed % 20) as i64;
    let cost_price = (price * cost_pct / 100) / 100 * 100;

    ProductVariant {
        id: generate_id(),
        tenant_id: DEFAULT_TENANT_ID.to_string(),
        product_id: product_id.to_string(),
        sku: format!("{}-{}", code, size),
        name: size.to_string(),
        price,
        cost_price,
        stock_quantity: ((seed * 7) % 41) as i64,
        min_stock: None,
        created_at: now,
        updated_at: now,
    }
}
