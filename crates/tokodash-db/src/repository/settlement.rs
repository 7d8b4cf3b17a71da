//! # Settlement Repository
//!
//! Payouts from a store's platform balance to a bank account. The balance
//! debit itself lives in [`StoreRepository`](super::store::StoreRepository);
//! both are written in the caller's transaction.

use std::sync::Arc;

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tokodash_core::{DateRange, Settlement};

const SETTLEMENT_COLUMNS: &str =
    "id, tenant_id, store_id, bank_id, amount, settlement_date, notes, created_at";

#[derive(Debug, Clone)]
pub struct SettlementRepository {
    pool: SqlitePool,
    tenant_id: Arc<str>,
}

impl SettlementRepository {
    /// Creates a new SettlementRepository.
    pub fn new(pool: SqlitePool, tenant_id: Arc<str>) -> Self {
        SettlementRepository { pool, tenant_id }
    }

    pub async fn insert_in(
        &self,
        conn: &mut SqliteConnection,
        settlement: &Settlement,
    ) -> DbResult<()> {
        debug!(
            store_id = %settlement.store_id,
            amount = settlement.amount,
            "Inserting settlement"
        );

        sqlx::query(
            r#"
            INSERT INTO settlements (
                id, tenant_id, store_id, bank_id, amount, settlement_date, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&settlement.id)
        .bind(&*self.tenant_id)
        .bind(&settlement.store_id)
        .bind(&settlement.bank_id)
        .bind(settlement.amount)
        .bind(settlement.settlement_date)
        .bind(&settlement.notes)
        .bind(settlement.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Settlement>> {
        let settlement = sqlx::query_as::<_, Settlement>(&format!(
            "SELECT {SETTLEMENT_COLUMNS} FROM settlements WHERE id = ?1 AND tenant_id = ?2"
        ))
        .bind(id)
        .bind(&*self.tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(settlement)
    }

    pub async fn get_by_id_in(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Settlement>> {
        let settlement = sqlx::query_as::<_, Settlement>(&format!(
            "SELECT {SETTLEMENT_COLUMNS} FROM settlements WHERE id = ?1 AND tenant_id = ?2"
        ))
        .bind(id)
        .bind(&*self.tenant_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(settlement)
    }

    pub async fn delete_in(&self, conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting settlement");

        let result = sqlx::query("DELETE FROM settlements WHERE id = ?1 AND tenant_id = ?2")
            .bind(id)
            .bind(&*self.tenant_id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Settlement", id));
        }

        Ok(())
    }

    /// Lists settlements, newest first.
    pub async fn list(
        &self,
        store_id: Option<&str>,
        range: Option<DateRange>,
    ) -> DbResult<Vec<Settlement>> {
        let (start, end) = match range {
            Some(range) => (Some(range.start), Some(range.end)),
            None => (None, None),
        };

        let settlements = sqlx::query_as::<_, Settlement>(&format!(
            "SELECT {SETTLEMENT_COLUMNS} FROM settlements \
             WHERE tenant_id = ?1 \
               AND (?2 IS NULL OR store_id = ?2) \
               AND (?3 IS NULL OR settlement_date >= ?3) \
               AND (?4 IS NULL OR settlement_date <= ?4) \
             ORDER BY settlement_date DESC, created_at DESC"
        ))
        .bind(&*self.tenant_id)
        .bind(store_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(settlements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{fixtures, generate_id};
    use chrono::Utc;

    #[tokio::test]
    async fn test_insert_list_delete() {
        let db = fixtures::database().await;
        let store = fixtures::store(&db, None).await;
        let repo = db.settlements();

        let settlement = Settlement {
            id: generate_id(),
            tenant_id: String::new(),
            store_id: store.id.clone(),
            bank_id: None,
            amount: 500_000,
            settlement_date: fixtures::day("2026-03-15"),
            notes: Some("Penarikan".to_string()),
            created_at: Utc::now(),
        };

        let mut tx = db.begin().await.unwrap();
        repo.insert_in(&mut tx, &settlement).await.unwrap();
        tx.commit().await.unwrap();

        let listed = repo.list(Some(&store.id), None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].tenant_id, db.tenant_id());

        let mut tx = db.begin().await.unwrap();
        repo.delete_in(&mut tx, &settlement.id).await.unwrap();
        tx.commit().await.unwrap();

        assert!(repo.get_by_id(&settlement.id).await.unwrap().is_none());
    }
}
