//! # Tracing Setup
//!
//! Installs the global `tracing` subscriber.
//!
//! ## Log Levels
//! - `RUST_LOG=debug` - every repository call
//! - `RUST_LOG=tokodash_service=debug,sqlx=warn` - service detail only
//! - Unset: `[logging] level` from the config file

use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

/// Builds the filter: `RUST_LOG` if set, otherwise the configured level.
pub fn env_filter(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"))
}

/// Initialises tracing once per process; later calls are ignored.
pub fn init_tracing(settings: &LoggingSettings) {
    let result = tracing_subscriber::fmt()
        .with_env_filter(env_filter(settings))
        .try_init();

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let settings = LoggingSettings::default();
        init_tracing(&settings);
        init_tracing(&settings);
    }
}
