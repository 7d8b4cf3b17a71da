//! # Repository Module
//!
//! One repository per resource, all scoped to a tenant.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Service                                                                │
//! │       │  db.products().low_stock(5)                                     │
//! │       ▼                                                                 │
//! │  ProductRepository { pool, tenant_id }                                  │
//! │  ├── get_variant(&self, id)            ← runs on the pool               │
//! │  └── apply_stock_delta_in(&self, conn) ← runs inside a caller's tx      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WHERE tenant_id = ?)                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`SaleRepository`](sale::SaleRepository) - Sales, items, revenue queries
//! - [`ProductRepository`](product::ProductRepository) - Products, variants, stock deltas
//! - [`StoreRepository`](store::StoreRepository) - Stores, platforms, balance deltas
//! - [`StockMovementRepository`](stock_movement::StockMovementRepository) - Inventory ledger
//! - [`PurchaseRepository`](purchase::PurchaseRepository) - Suppliers, purchases
//! - [`FinanceRepository`](finance::FinanceRepository) - Expenses, incomes, categories, banks, assets
//! - [`SettlementRepository`](settlement::SettlementRepository) - Payouts
//! - [`NotificationRepository`](notification::NotificationRepository) - Dashboard notifications
//! - [`SettingsRepository`](settings::SettingsRepository) - User settings
//! - [`ReferenceRepository`](reference::ReferenceRepository) - Tenant checks on referenced ids

pub mod finance;
pub mod notification;
pub mod product;
pub mod purchase;
pub mod reference;
pub mod sale;
pub mod settings;
pub mod settlement;
pub mod stock_movement;
pub mod store;

use uuid::Uuid;

/// Generates a new entity ID.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Shared rows for repository tests.

    use chrono::{NaiveDate, Utc};
    use tokodash_core::{Platform, Product, ProductVariant, Store};

    use super::generate_id;
    use crate::{Database, DbConfig};

    pub async fn database() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    pub async fn platform(db: &Database, name: &str) -> Platform {
        let platform = Platform {
            id: generate_id(),
            tenant_id: db.tenant_id().to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        db.stores().insert_platform(&platform).await.unwrap();
        platform
    }

    pub async fn store(db: &Database, platform_id: Option<&str>) -> Store {
        let now = Utc::now();
        let store = Store {
            id: generate_id(),
            tenant_id: db.tenant_id().to_string(),
            name: "Toko Berkah".to_string(),
            platform_id: platform_id.map(str::to_string),
            saldo_dashboard: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.stores().insert_store(&store).await.unwrap();
        store
    }

    pub async fn variant(db: &Database, sku: &str, stock: i64) -> ProductVariant {
        let now = Utc::now();
        let product = Product {
            id: generate_id(),
            tenant_id: db.tenant_id().to_string(),
            name: format!("Product {sku}"),
            description: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert_product(&product).await.unwrap();

        let variant = ProductVariant {
            id: generate_id(),
            tenant_id: db.tenant_id().to_string(),
            product_id: product.id.clone(),
            sku: sku.to_string(),
            name: "Default".to_string(),
            price: 50_000,
            cost_price: 30_000,
            stock_quantity: stock,
            min_stock: None,
            created_at: now,
            updated_at: now,
        };
        db.products().insert_variant(&variant).await.unwrap();
        variant
    }
}
