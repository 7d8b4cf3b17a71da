//! # tokodash-service: Application Layer for TokoDash
//!
//! The operations a back-office dashboard calls, one service per resource,
//! wired together by [`BackOffice`].
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                             BackOffice                                  │
//! │                                                                         │
//! │  ┌────────────┐ ┌────────────┐ ┌──────────────┐ ┌────────────────────┐  │
//! │  │SaleService │ │StockService│ │PurchaseServ. │ │  FinanceService    │  │
//! │  │status →    │ │adjustments │ │receive/cancel│ │  settlements,      │  │
//! │  │stock+saldo │ │low stock   │ │→ stock in/out│ │  incomes, expenses │  │
//! │  └─────┬──────┘ └─────┬──────┘ └──────┬───────┘ └─────────┬──────────┘  │
//! │        └──────────────┴───────┬───────┴───────────────────┘             │
//! │                               ▼                                         │
//! │                    ledger (one tx per write)                            │
//! │                               │                                         │
//! │  ┌──────────────┐  ┌──────────┴─────────┐  ┌────────────────────────┐   │
//! │  │ReportService │  │  NotificationHub   │  │  DashboardService      │   │
//! │  │profit & loss │  │  table + broadcast │  │  QueryCache (TTL)      │   │
//! │  └──────────────┘  └────────────────────┘  └────────────────────────┘   │
//! │                               │                                         │
//! │                               ▼                                         │
//! │                  tokodash-db::Database (tenant scoped)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`sales`] - Sale lifecycle and the status-driven stock ledger
//! - [`inventory`] - Stock adjustments, movement history, low stock
//! - [`purchasing`] - Suppliers and purchase orders
//! - [`finance`] - Expenses, incomes, settlements, reference data
//! - [`report`] - Profit & loss
//! - [`dashboard`] - Cached sales summary and low-stock widgets
//! - [`cache`] - TTL query cache
//! - [`notify`] - Notifications and user settings
//! - [`config`] - `AppConfig` loading
//! - [`telemetry`] - Tracing subscriber setup
//! - [`error`] - `ApiError`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tokodash_service::{telemetry, AppConfig, BackOffice};
//!
//! let config = AppConfig::load_or_default(None);
//! telemetry::init_tracing(&config.logging);
//!
//! let office = BackOffice::connect(&config).await?;
//! let sale = office.sales().update_status(&sale_id, SaleStatus::Shipped).await?;
//! let report = office.reports().profit_loss(range, None).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cache;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod finance;
pub mod inventory;
pub mod notify;
pub mod purchasing;
pub mod report;
pub mod sales;
pub mod telemetry;

mod ledger;

// =============================================================================
// Re-exports
// =============================================================================

pub use cache::{cache_key, QueryCache};
pub use config::{AppConfig, ConfigError, ConfigResult};
pub use dashboard::{DashboardService, SalesSummary};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use finance::{FinanceService, LedgerEntryInput, NewSettlement};
pub use inventory::{StockAdjustment, StockService};
pub use notify::{NotificationHub, SettingsUpdate};
pub use purchasing::{NewPurchase, NewPurchaseItem, PurchaseService};
pub use report::ReportService;
pub use sales::{NewSale, NewSaleItem, SaleService};

use tokodash_db::Database;
use tracing::info;

// =============================================================================
// BackOffice
// =============================================================================

/// Every service of one tenant over one database handle.
///
/// Cloning shares the notification channel and the dashboard caches.
#[derive(Clone)]
pub struct BackOffice {
    db: Database,
    hub: NotificationHub,
    dashboard: DashboardService,
}

impl BackOffice {
    /// Opens the configured database and scopes it to the configured tenant.
    pub async fn connect(config: &AppConfig) -> ApiResult<Self> {
        config
            .validate()
            .map_err(|e| ApiError::validation(e.to_string()))?;

        let db = Database::new(config.database.to_db_config())
            .await?
            .for_tenant(&config.tenant.id);

        info!(tenant_id = %config.tenant.id, "Back office ready");
        Ok(BackOffice::new(db, config))
    }

    pub fn new(db: Database, config: &AppConfig) -> Self {
        let hub = NotificationHub::new(
            db.clone(),
            config.notifications.channel_capacity,
            config.inventory.low_stock_threshold,
        );
        let dashboard = DashboardService::new(db.clone(), hub.clone(), config.cache.dashboard_ttl());

        BackOffice { db, hub, dashboard }
    }

    /// The same services for another tenant on the same pool. Caches and
    /// the notification channel are not shared with `self`.
    pub fn for_tenant(&self, tenant_id: &str, config: &AppConfig) -> Self {
        BackOffice::new(self.db.for_tenant(tenant_id), config)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn sales(&self) -> SaleService {
        SaleService::new(self.db.clone(), self.hub.clone())
    }

    pub fn stock(&self) -> StockService {
        StockService::new(self.db.clone(), self.hub.clone())
    }

    pub fn purchasing(&self) -> PurchaseService {
        PurchaseService::new(self.db.clone(), self.hub.clone())
    }

    pub fn finance(&self) -> FinanceService {
        FinanceService::new(self.db.clone(), self.hub.clone())
    }

    pub fn reports(&self) -> ReportService {
        ReportService::new(self.db.clone())
    }

    pub fn dashboard(&self) -> DashboardService {
        self.dashboard.clone()
    }

    pub fn notifications(&self) -> NotificationHub {
        self.hub.clone()
    }
}

// =============================================================================
// Test Fixtures
// =============================================================================


// =============================================================================
// Unit Tests
// =============================================================================
