//! # tokodash-db: Database Layer for TokoDash
//!
//! SQLite storage for the back office, accessed with sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        TokoDash Data Flow                               │
//! │                                                                         │
//! │  SaleService::update_status                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   tokodash-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ SaleRepo      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ ProductRepo   │    │ 001_initial  │  │   │
//! │  │   │ tenant scope  │    │ StoreRepo ... │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Transactions
//!
//! Repositories expose two kinds of methods:
//! - `&self` methods run on the pool and are single statements
//! - associated `*_in(conn, ...)` helpers take `&mut SqliteConnection` so
//!   the service layer can chain them inside one `db.begin()` transaction
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tokodash_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("tokodash.db")).await?;
//! let low = db.products().low_stock(5).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::finance::{ExpenseRow, FinanceRepository};
pub use repository::notification::NotificationRepository;
pub use repository::product::{ProductRepository, StockChange};
pub use repository::purchase::PurchaseRepository;
pub use repository::reference::{ReferenceKind, ReferenceRepository};
pub use repository::sale::{DailyRevenue, RevenueRow, SaleRepository, StatusCount};
pub use repository::settings::SettingsRepository;
pub use repository::settlement::SettlementRepository;
pub use repository::stock_movement::StockMovementRepository;
pub use repository::store::{BalanceDebit, StoreRepository};
