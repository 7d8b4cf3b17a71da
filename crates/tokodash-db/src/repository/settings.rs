//! # Settings Repository
//!
//! Per-user preferences. A missing row means "use the defaults".

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use tokodash_core::UserSettings;

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
    tenant_id: Arc<str>,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool, tenant_id: Arc<str>) -> Self {
        SettingsRepository { pool, tenant_id }
    }

    pub async fn get(&self, user_id: &str) -> DbResult<Option<UserSettings>> {
        let settings = sqlx::query_as::<_, UserSettings>(
            r#"
            SELECT tenant_id, user_id, low_stock_threshold, notifications_enabled, updated_at
            FROM user_settings
            WHERE tenant_id = ?1 AND user_id = ?2
            "#,
        )
        .bind(&*self.tenant_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings)
    }

    /// Inserts or replaces the settings row for `settings.user_id`.
    pub async fn upsert(&self, settings: &UserSettings) -> DbResult<()> {
        debug!(
            user_id = %settings.user_id,
            low_stock_threshold = settings.low_stock_threshold,
            "Saving user settings"
        );

        sqlx::query(
            r#"
            INSERT INTO user_settings (
                tenant_id, user_id, low_stock_threshold, notifications_enabled, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(tenant_id, user_id) DO UPDATE SET
                low_stock_threshold = excluded.low_stock_threshold,
                notifications_enabled = excluded.notifications_enabled,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&*self.tenant_id)
        .bind(&settings.user_id)
        .bind(settings.low_stock_threshold)
        .bind(settings.notifications_enabled)
        .bind(settings.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use chrono::Utc;

    #[tokio::test]
    async fn test_upsert_replaces() {
        let db = fixtures::database().await;
        let repo = db.settings();
        assert!(repo.get("default").await.unwrap().is_none());

        let mut settings = UserSettings {
            tenant_id: db.tenant_id().to_string(),
            user_id: "default".to_string(),
            low_stock_threshold: 10,
            notifications_enabled: true,
            updated_at: Utc::now(),
        };
        repo.upsert(&settings).await.unwrap();

        settings.low_stock_threshold = 3;
        settings.notifications_enabled = false;
        repo.upsert(&settings).await.unwrap();

        let loaded = repo.get("default").await.unwrap().unwrap();
        assert_eq!(loaded.low_stock_threshold, 3);
        assert!(!loaded.notifications_enabled);
    }
}
