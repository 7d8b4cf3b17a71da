//! # Store Repository
//!
//! Stores, sales platforms and the store-level dashboard balance.
//!
//! ## Balance Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  ❌ Read-modify-write (loses updates under concurrency)             │
//! │     balance = SELECT saldo_dashboard; UPDATE ... SET = balance + x  │
//! │                                                                     │
//! │  ✅ Delta update (what this repository does)                        │
//! │     UPDATE stores SET saldo_dashboard = saldo_dashboard + ?         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tokodash_core::{Platform, Store};

const STORE_COLUMNS: &str =
    "id, tenant_id, name, platform_id, saldo_dashboard, is_active, created_at, updated_at";

/// Outcome of a guarded balance debit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceDebit {
    /// Debit applied; carries the new balance.
    Applied { balance: i64 },
    /// Balance too low; nothing changed.
    Insufficient { available: i64 },
}

/// Repository for stores and platforms.
#[derive(Debug, Clone)]
pub struct StoreRepository {
    pool: SqlitePool,
    tenant_id: Arc<str>,
}

impl StoreRepository {
    /// Creates a new StoreRepository.
    pub fn new(pool: SqlitePool, tenant_id: Arc<str>) -> Self {
        StoreRepository { pool, tenant_id }
    }

    // =========================================================================
    // Platforms
    // =========================================================================

    pub async fn insert_platform(&self, platform: &Platform) -> DbResult<()> {
        debug!(name = %platform.name, "Inserting platform");

        sqlx::query(
            r#"
            INSERT INTO platforms (id, tenant_id, name, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&platform.id)
        .bind(&*self.tenant_id)
        .bind(&platform.name)
        .bind(platform.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_platform(&self, id: &str) -> DbResult<Option<Platform>> {
        let platform = sqlx::query_as::<_, Platform>(
            r#"
            SELECT id, tenant_id, name, created_at
            FROM platforms
            WHERE id = ?1 AND tenant_id = ?2
            "#,
        )
        .bind(id)
        .bind(&*self.tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(platform)
    }

    pub async fn list_platforms(&self) -> DbResult<Vec<Platform>> {
        let platforms = sqlx::query_as::<_, Platform>(
            r#"
            SELECT id, tenant_id, name, created_at
            FROM platforms
            WHERE tenant_id = ?1
            ORDER BY name
            "#,
        )
        .bind(&*self.tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(platforms)
    }

    // =========================================================================
    // Stores
    // =========================================================================

    pub async fn insert_store(&self, store: &Store) -> DbResult<()> {
        debug!(name = %store.name, "Inserting store");

        sqlx::query(
            r#"
            INSERT INTO stores (
                id, tenant_id, name, platform_id, saldo_dashboard,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&store.id)
        .bind(&*self.tenant_id)
        .bind(&store.name)
        .bind(&store.platform_id)
        .bind(store.saldo_dashboard)
        .bind(store.is_active)
        .bind(store.created_at)
        .bind(store.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_store(&self, id: &str) -> DbResult<Option<Store>> {
        let store = sqlx::query_as::<_, Store>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE id = ?1 AND tenant_id = ?2"
        ))
        .bind(id)
        .bind(&*self.tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(store)
    }

    /// Same as [`get_store`](Self::get_store) inside a transaction.
    pub async fn get_store_in(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Store>> {
        let store = sqlx::query_as::<_, Store>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE id = ?1 AND tenant_id = ?2"
        ))
        .bind(id)
        .bind(&*self.tenant_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(store)
    }

    /// Lists active stores by name.
    pub async fn list_stores(&self) -> DbResult<Vec<Store>> {
        let stores = sqlx::query_as::<_, Store>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE tenant_id = ?1 AND is_active = 1 ORDER BY name"
        ))
        .bind(&*self.tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(stores)
    }

    // =========================================================================
    // Balance (transaction helpers)
    // =========================================================================

    /// Adds `delta` (negative to subtract) to the store balance.
    ///
    /// ## Returns
    /// The new balance.
    pub async fn adjust_balance_in(
        &self,
        conn: &mut SqliteConnection,
        store_id: &str,
        delta: i64,
    ) -> DbResult<i64> {
        debug!(store_id = %store_id, delta = delta, "Adjusting store balance");

        let balance: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE stores
            SET saldo_dashboard = saldo_dashboard + ?1,
                updated_at = ?2
            WHERE id = ?3 AND tenant_id = ?4
            RETURNING saldo_dashboard
            "#,
        )
        .bind(delta)
        .bind(Utc::now())
        .bind(store_id)
        .bind(&*self.tenant_id)
        .fetch_optional(&mut *conn)
        .await?;

        balance.ok_or_else(|| DbError::not_found("Store", store_id))
    }

    /// Subtracts `amount` only if the balance covers it.
    pub async fn debit_balance_in(
        &self,
        conn: &mut SqliteConnection,
        store_id: &str,
        amount: i64,
    ) -> DbResult<BalanceDebit> {
        debug!(store_id = %store_id, amount = amount, "Debiting store balance");

        let balance: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE stores
            SET saldo_dashboard = saldo_dashboard - ?1,
                updated_at = ?2
            WHERE id = ?3 AND tenant_id = ?4 AND saldo_dashboard >= ?1
            RETURNING saldo_dashboard
            "#,
        )
        .bind(amount)
        .bind(Utc::now())
        .bind(store_id)
        .bind(&*self.tenant_id)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(balance) = balance {
            return Ok(BalanceDebit::Applied { balance });
        }

        match self.get_store_in(conn, store_id).await? {
            Some(store) => Ok(BalanceDebit::Insufficient {
                available: store.saldo_dashboard,
            }),
            None => Err(DbError::not_found("Store", store_id)),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
