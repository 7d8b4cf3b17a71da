//! # Application Configuration
//!
//! Settings for the back office, read once at startup.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TOKODASH_DB_PATH=/var/lib/tokodash/tokodash.db                     │
//! │     TOKODASH_TENANT_ID=8f5c...                                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tokodash/config.toml (Linux)                             │
//! │     ~/Library/Application Support/id.tokodash.tokodash/config.toml     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "./tokodash.db"
//! max_connections = 5
//!
//! [cache]
//! dashboard_ttl_secs = 30
//!
//! [inventory]
//! low_stock_threshold = 5
//!
//! [notifications]
//! channel_capacity = 256
//!
//! [logging]
//! level = "info"
//!
//! [tenant]
//! id = "00000000-0000-0000-0000-000000000001"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use tokodash_core::{DEFAULT_LOW_STOCK_THRESHOLD, DEFAULT_TENANT_ID};
use tokodash_db::DbConfig;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write config file: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("No config path available on this platform")]
    NoConfigPath,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file, or `:memory:`. Defaults to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseSettings {
    /// Resolves the file path, falling back to the platform data directory.
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            directories::ProjectDirs::from("id", "tokodash", "tokodash")
                .map(|dirs| dirs.data_dir().join("tokodash.db"))
                .unwrap_or_else(|| PathBuf::from("./tokodash.db"))
        })
    }

    /// Builds the pool configuration.
    pub fn to_db_config(&self) -> DbConfig {
        let config = DbConfig::new(self.resolved_path());
        if config.is_in_memory() {
            return DbConfig::in_memory();
        }
        config.max_connections(self.max_connections)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// How long dashboard summaries stay fresh.
    #[serde(default = "default_dashboard_ttl")]
    pub dashboard_ttl_secs: u64,
}

fn default_dashboard_ttl() -> u64 {
    30
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            dashboard_ttl_secs: default_dashboard_ttl(),
        }
    }
}

impl CacheSettings {
    pub fn dashboard_ttl(&self) -> Duration {
        Duration::from_secs(self.dashboard_ttl_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventorySettings {
    /// Threshold for variants without their own `min_stock`, unless the
    /// tenant's settings row overrides it.
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i64,
}

fn default_low_stock_threshold() -> i64 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

impl Default for InventorySettings {
    fn default() -> Self {
        InventorySettings {
            low_stock_threshold: default_low_stock_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Buffered messages per subscriber before the slowest one lags.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    256
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings {
            channel_capacity: default_channel_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Filter used when `RUST_LOG` is unset, e.g. `info` or `tokodash=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantSettings {
    #[serde(default = "default_tenant_id")]
    pub id: String,
}

fn default_tenant_id() -> String {
    DEFAULT_TENANT_ID.to_string()
}

impl Default for TenantSettings {
    fn default() -> Self {
        TenantSettings {
            id: default_tenant_id(),
        }
    }
}

// =============================================================================
// AppConfig
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub inventory: InventorySettings,

    #[serde(default)]
    pub notifications: NotificationSettings,

    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default)]
    pub tenant: TenantSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (config.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoConfigPath)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Config saved");
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.tenant.id.trim().is_empty() {
            return Err(ConfigError::Invalid("tenant.id must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.inventory.low_stock_threshold < 0 {
            return Err(ConfigError::Invalid(
                "inventory.low_stock_threshold must not be negative".into(),
            ));
        }

        if self.notifications.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "notifications.channel_capacity must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies `TOKODASH_*` overrides read through `var`.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("TOKODASH_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(max) = var("TOKODASH_DB_MAX_CONNECTIONS") {
            match max.parse() {
                Ok(max) => self.database.max_connections = max,
                Err(_) => warn!(value = %max, "Ignoring invalid TOKODASH_DB_MAX_CONNECTIONS"),
            }
        }

        if let Some(ttl) = var("TOKODASH_CACHE_TTL_SECS") {
            match ttl.parse() {
                Ok(ttl) => self.cache.dashboard_ttl_secs = ttl,
                Err(_) => warn!(value = %ttl, "Ignoring invalid TOKODASH_CACHE_TTL_SECS"),
            }
        }

        if let Some(threshold) = var("TOKODASH_LOW_STOCK_THRESHOLD") {
            match threshold.parse() {
                Ok(threshold) => self.inventory.low_stock_threshold = threshold,
                Err(_) => warn!(value = %threshold, "Ignoring invalid TOKODASH_LOW_STOCK_THRESHOLD"),
            }
        }

        if let Some(level) = var("TOKODASH_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(tenant) = var("TOKODASH_TENANT_ID") {
            debug!(tenant_id = %tenant, "Overriding tenant from environment");
            self.tenant.id = tenant;
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("id", "tokodash", "tokodash")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
