//! # Database Pool Management
//!
//! Connection pool creation, tenant scoping and repository access.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  DbConfig::new(path)                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← pool + migrations                        │
//! │       │                                                                 │
//! │       ├── db.for_tenant("tenant-a") ──► Database { tenant: a }          │
//! │       └── db.for_tenant("tenant-b") ──► Database { tenant: b }          │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │            db.sales(), db.products(), ...                               │
//! │            every query: WHERE tenant_id = <scoped tenant>               │
//! │                                                                         │
//! │  All tenant handles share the same SqlitePool.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! File databases run in WAL mode so dashboard reads never wait on a
//! status change being written.

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::finance::FinanceRepository;
use crate::repository::notification::NotificationRepository;
use crate::repository::product::ProductRepository;
use crate::repository::purchase::PurchaseRepository;
use crate::repository::reference::ReferenceRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::settings::SettingsRepository;
use crate::repository::settlement::SettlementRepository;
use crate::repository::stock_movement::StockMovementRepository;
use crate::repository::store::StoreRepository;
use tokodash_core::DEFAULT_TENANT_ID;

/// Path marker for an in-memory database.
const MEMORY_PATH: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/tokodash.db")
///     .max_connections(8)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection timeout duration.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection. `None` keeps connections
    /// forever (required for in-memory databases).
    /// Default: 10 minutes
    pub idle_timeout: Option<Duration>,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    ///
    /// The file is created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// Each call yields an isolated database. The pool holds exactly one
    /// connection that is never recycled, since closing it drops the data.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(MEMORY_PATH),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: None,
            run_migrations: true,
        }
    }

    /// Whether this config points at an in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == MEMORY_PATH
    }
}

// =============================================================================
// Database
// =============================================================================

/// Tenant-scoped database handle providing repository access.
///
/// Cloning is cheap: the pool is reference counted and the tenant id is
/// shared.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./tokodash.db")).await?
///     .for_tenant("8c1f...");
/// let sale = db.sales().get_by_id(&sale_id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,

    /// Tenant every repository query is scoped to.
    tenant_id: Arc<str>,
}

impl Database {
    /// Creates a new database connection pool scoped to the default tenant.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite: WAL, NORMAL synchronous, foreign keys on
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        let base_options = if config.is_in_memory() {
            // WAL does not apply to in-memory databases
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());
            SqliteConnectOptions::from_str(&connect_url)
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
                .journal_mode(SqliteJournalMode::Wal)
                .create_if_missing(true)
        };

        let connect_options = base_options
            .synchronous(SqliteSynchronous::Normal)
            // SQLite has them disabled by default for backwards compatibility
            .foreign_keys(true);

        debug!("Connection options configured");

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(config.idle_timeout);

        if config.is_in_memory() {
            pool_options = pool_options.max_lifetime(None::<Duration>);
        }

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database {
            pool,
            tenant_id: Arc::from(DEFAULT_TENANT_ID),
        };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Returns a handle on the same pool scoped to another tenant.
    pub fn for_tenant(&self, tenant_id: impl AsRef<str>) -> Self {
        Database {
            pool: self.pool.clone(),
            tenant_id: Arc::from(tenant_id.as_ref()),
        }
    }

    /// The tenant this handle is scoped to.
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Runs database migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    ///
    /// Prefer repository methods when available.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Starts a transaction.
    ///
    /// Dropping the transaction without `commit()` rolls it back.
    ///
    /// ## Note
    /// With an in-memory database the pool has a single connection, so no
    /// other repository call may run until the transaction ends.
    pub async fn begin(&self) -> DbResult<Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))
    }

    /// Returns the sale repository.
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone(), self.tenant_id.clone())
    }

    /// Returns the product and variant repository.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone(), self.tenant_id.clone())
    }

    /// Returns the store and platform repository.
    pub fn stores(&self) -> StoreRepository {
        StoreRepository::new(self.pool.clone(), self.tenant_id.clone())
    }

    /// Returns the stock ledger repository.
    pub fn stock_movements(&self) -> StockMovementRepository {
        StockMovementRepository::new(self.pool.clone(), self.tenant_id.clone())
    }

    /// Returns the purchase and supplier repository.
    pub fn purchases(&self) -> PurchaseRepository {
        PurchaseRepository::new(self.pool.clone(), self.tenant_id.clone())
    }

    /// Returns the expense, income, category, bank and asset repository.
    pub fn finance(&self) -> FinanceRepository {
        FinanceRepository::new(self.pool.clone(), self.tenant_id.clone())
    }

    /// Returns the settlement repository.
    pub fn settlements(&self) -> SettlementRepository {
        SettlementRepository::new(self.pool.clone(), self.tenant_id.clone())
    }

    /// Returns the notification repository.
    pub fn notifications(&self) -> NotificationRepository {
        NotificationRepository::new(self.pool.clone(), self.tenant_id.clone())
    }

    /// Returns the user settings repository.
    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.pool.clone(), self.tenant_id.clone())
    }

    /// Returns the tenant check for referenced ids.
    pub fn references(&self) -> ReferenceRepository {
        ReferenceRepository::new(self.pool.clone(), self.tenant_id.clone())
    }

    /// Closes the database connection pool.
    ///
    /// After calling close, all repository operations will fail.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database can execute queries.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
