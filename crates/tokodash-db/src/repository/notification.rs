//! # Notification Repository
//!
//! Dashboard notifications: low stock alerts, settlement receipts and the
//! like. Rows are only ever inserted and marked read.

use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tokodash_core::Notification;

#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: SqlitePool,
    tenant_id: Arc<str>,
}

impl NotificationRepository {
    /// Creates a new NotificationRepository.
    pub fn new(pool: SqlitePool, tenant_id: Arc<str>) -> Self {
        NotificationRepository { pool, tenant_id }
    }

    pub async fn insert(&self, notification: &Notification) -> DbResult<()> {
        debug!(kind = ?notification.kind, title = %notification.title, "Inserting notification");

        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, tenant_id, kind, title, message, reference_id, is_read, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&notification.id)
        .bind(&*self.tenant_id)
        .bind(notification.kind)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.reference_id)
        .bind(notification.is_read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Unread notifications, newest first.
    pub async fn list_unread(&self, limit: u32) -> DbResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, tenant_id, kind, title, message, reference_id, is_read, created_at
            FROM notifications
            WHERE tenant_id = ?1 AND is_read = 0
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )
        .bind(&*self.tenant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    pub async fn mark_read(&self, id: &str) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?1 AND tenant_id = ?2")
                .bind(id)
                .bind(&*self.tenant_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Notification", id));
        }

        Ok(())
    }

    /// Marks everything read and returns how many rows changed.
    pub async fn mark_all_read(&self) -> DbResult<u64> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = 1 WHERE tenant_id = ?1 AND is_read = 0")
                .bind(&*self.tenant_id)
                .execute(&self.pool)
                .await?;

        debug!(count = result.rows_affected(), at = %Utc::now(), "Marked notifications read");
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{fixtures, generate_id};
    use tokodash_core::NotificationKind;

    fn notification(title: &str) -> Notification {
        Notification {
            id: generate_id(),
            tenant_id: String::new(),
            kind: NotificationKind::LowStock,
            title: title.to_string(),
            message: "Stok menipis".to_string(),
            reference_id: None,
            is_read: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_unread_lifecycle() {
        let db = fixtures::database().await;
        let repo = db.notifications();

        let first = notification("SKU-1");
        repo.insert(&first).await.unwrap();
        repo.insert(&notification("SKU-2")).await.unwrap();
        repo.insert(&notification("SKU-3")).await.unwrap();

        assert_eq!(repo.list_unread(2).await.unwrap().len(), 2);

        repo.mark_read(&first.id).await.unwrap();
        assert_eq!(repo.list_unread(10).await.unwrap().len(), 2);

        assert_eq!(repo.mark_all_read().await.unwrap(), 2);
        assert!(repo.list_unread(10).await.unwrap().is_empty());
        assert!(repo.mark_read("missing").await.is_err());
    }

    #[tokio::test]
    async fn test_tenant_isolation() {
        let db = fixtures::database().await;
        db.notifications().insert(&notification("mine")).await.unwrap();

        let other = db.for_tenant("tenant-b");
        assert!(other.notifications().list_unread(10).await.unwrap().is_empty());
        assert_eq!(other.notifications().mark_all_read().await.unwrap(), 0);
    }
}
