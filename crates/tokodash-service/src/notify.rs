//! # Notification Hub
//!
//! Persists dashboard notifications and pushes them to live subscribers.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SaleService / FinanceService  (after commit)                           │
//! │       │ hub.notify(kind, title, message, reference)                     │
//! │       ▼                                                                 │
//! │  user_settings.notifications_enabled? ── no ──► dropped                 │
//! │       │ yes                                                             │
//! │       ▼                                                                 │
//! │  notifications table (INSERT)                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  broadcast::Sender ──► every subscribe() receiver (open dashboards)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Delivery order across sessions is not synchronised with the writes that
//! caused a notification; a subscriber may see it before or after its own
//! refetch.

use chrono::Utc;
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, error};
use ts_rs::TS;

use tokodash_core::{Notification, NotificationKind, UserSettings, DEFAULT_USER_ID};
use tokodash_db::{repository::generate_id, Database};

use crate::error::{ApiError, ApiResult};

/// Changes to the tenant's settings row. `None` keeps the current value.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct SettingsUpdate {
    pub low_stock_threshold: Option<i64>,
    pub notifications_enabled: Option<bool>,
}

#[derive(Clone)]
pub struct NotificationHub {
    db: Database,
    sender: broadcast::Sender<Notification>,
    default_threshold: i64,
}

impl NotificationHub {
    pub fn new(db: Database, channel_capacity: usize, default_threshold: i64) -> Self {
        let (sender, _) = broadcast::channel(channel_capacity);
        NotificationHub {
            db,
            sender,
            default_threshold,
        }
    }

    /// A receiver for notifications emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Stores and broadcasts a notification.
    ///
    /// ## Returns
    /// * `Ok(None)` - notifications are disabled for this tenant
    pub async fn notify(
        &self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        reference_id: Option<&str>,
    ) -> ApiResult<Option<Notification>> {
        let settings = self.db.settings().get(DEFAULT_USER_ID).await?;
        if settings.is_some_and(|s| !s.notifications_enabled) {
            debug!(kind = ?kind, "Notifications disabled, skipping");
            return Ok(None);
        }

        let notification = Notification {
            id: generate_id(),
            tenant_id: self.db.tenant_id().to_string(),
            kind,
            title: title.into(),
            message: message.into(),
            reference_id: reference_id.map(str::to_string),
            is_read: false,
            created_at: Utc::now(),
        };
        self.db.notifications().insert(&notification).await?;

        // No subscribers is fine; the row is already stored
        let _ = self.sender.send(notification.clone());

        Ok(Some(notification))
    }

    /// Like [`notify`](Self::notify) for callers that already committed
    /// their own work: failures are logged, not returned.
    pub async fn notify_logged(
        &self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        reference_id: Option<&str>,
    ) {
        if let Err(e) = self.notify(kind, title, message, reference_id).await {
            error!(kind = ?kind, error = %e, "Failed to emit notification");
        }
    }

    pub async fn list_unread(&self, limit: u32) -> ApiResult<Vec<Notification>> {
        Ok(self.db.notifications().list_unread(limit).await?)
    }

    pub async fn mark_read(&self, id: &str) -> ApiResult<()> {
        Ok(self.db.notifications().mark_read(id).await?)
    }

    pub async fn mark_all_read(&self) -> ApiResult<u64> {
        Ok(self.db.notifications().mark_all_read().await?)
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// The tenant's settings, or defaults when no row exists yet.
    pub async fn settings(&self) -> ApiResult<UserSettings> {
        let stored = self.db.settings().get(DEFAULT_USER_ID).await?;
        Ok(stored.unwrap_or_else(|| UserSettings {
            tenant_id: self.db.tenant_id().to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            low_stock_threshold: self.default_threshold,
            notifications_enabled: true,
            updated_at: Utc::now(),
        }))
    }

    pub async fn update_settings(&self, update: SettingsUpdate) -> ApiResult<UserSettings> {
        let mut settings = self.settings().await?;

        if let Some(threshold) = update.low_stock_threshold {
            if threshold < 0 {
                return Err(ApiError::validation("low_stock_threshold must not be negative"));
            }
            settings.low_stock_threshold = threshold;
        }
        if let Some(enabled) = update.notifications_enabled {
            settings.notifications_enabled = enabled;
        }
        settings.updated_at = Utc::now();

        self.db.settings().upsert(&settings).await?;
        Ok(settings)
    }

    /// Threshold for variants without their own `min_stock`.
    pub async fn low_stock_threshold(&self) -> ApiResult<i64> {
        Ok(self.settings().await?.low_stock_threshold)
    }
}
