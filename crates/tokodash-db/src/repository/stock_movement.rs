//! # Stock Movement Repository
//!
//! The inventory ledger. Rows are append-only: corrections are new
//! `adjustment` rows, never edits.

use std::sync::Arc;

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tokodash_core::{MovementFilter, ReferenceType, StockMovement};

const MOVEMENT_COLUMNS: &str = "id, tenant_id, variant_id, movement_type, quantity, \
     reference_type, reference_id, notes, created_at";

#[derive(Debug, Clone)]
pub struct StockMovementRepository {
    pool: SqlitePool,
    tenant_id: Arc<str>,
}

impl StockMovementRepository {
    /// Creates a new StockMovementRepository.
    pub fn new(pool: SqlitePool, tenant_id: Arc<str>) -> Self {
        StockMovementRepository { pool, tenant_id }
    }

    /// Appends a ledger row inside a transaction.
    pub async fn insert_in(
        &self,
        conn: &mut SqliteConnection,
        movement: &StockMovement,
    ) -> DbResult<()> {
        debug!(
            variant_id = %movement.variant_id,
            movement_type = ?movement.movement_type,
            quantity = movement.quantity,
            "Recording stock movement"
        );

        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, tenant_id, variant_id, movement_type, quantity,
                reference_type, reference_id, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&movement.id)
        .bind(&*self.tenant_id)
        .bind(&movement.variant_id)
        .bind(movement.movement_type)
        .bind(movement.quantity)
        .bind(movement.reference_type)
        .bind(&movement.reference_id)
        .bind(&movement.notes)
        .bind(movement.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Lists ledger rows, newest first.
    pub async fn list(&self, filter: &MovementFilter) -> DbResult<Vec<StockMovement>> {
        let (start, end) = match filter.range {
            Some(range) => (Some(range.start), Some(range.end)),
            None => (None, None),
        };

        // created_at is RFC 3339 text; its first 10 chars are the UTC day
        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE tenant_id = ?1 \
               AND (?2 IS NULL OR variant_id = ?2) \
               AND (?3 IS NULL OR movement_type = ?3) \
               AND (?4 IS NULL OR substr(created_at, 1, 10) >= ?4) \
               AND (?5 IS NULL OR substr(created_at, 1, 10) <= ?5) \
             ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(&*self.tenant_id)
        .bind(filter.variant_id.as_deref())
        .bind(filter.movement_type)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = movements.len(), "Listed stock movements");
        Ok(movements)
    }

    /// Ledger rows written for one sale, purchase or adjustment, oldest first.
    pub async fn list_for_reference(
        &self,
        reference_type: ReferenceType,
        reference_id: &str,
    ) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE tenant_id = ?1 AND reference_type = ?2 AND reference_id = ?3 \
             ORDER BY created_at, rowid"
        ))
        .bind(&*self.tenant_id)
        .bind(reference_type)
        .bind(reference_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{fixtures, generate_id};
    use chrono::Utc;
    use tokodash_core::{DateRange, MovementType};

    fn movement(variant_id: &str, movement_type: MovementType, quantity: i64) -> StockMovement {
        StockMovement {
            id: generate_id(),
            tenant_id: String::new(),
            variant_id: variant_id.to_string(),
            movement_type,
            quantity,
            reference_type: Some(ReferenceType::Sale),
            reference_id: Some("sale-1".to_string()),
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_filter() {
        let db = fixtures::database().await;
        let ledger = db.stock_movements();

        let mut tx = db.begin().await.unwrap();
        ledger
            .insert_in(&mut tx, &movement("v1", MovementType::Out, 2))
            .await
            .unwrap();
        ledger
            .insert_in(&mut tx, &movement("v1", MovementType::In, 2))
            .await
            .unwrap();
        ledger
            .insert_in(&mut tx, &movement("v2", MovementType::Out, 1))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let all = ledger.list(&MovementFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|m| m.tenant_id == db.tenant_id()));

        let v1_out = ledger
            .list(&MovementFilter {
                variant_id: Some("v1".to_string()),
                movement_type: Some(MovementType::Out),
                range: None,
            })
            .await
            .unwrap();
        assert_eq!(v1_out.len(), 1);

        let today = DateRange::single_day(Utc::now().date_naive());
        let in_range = ledger
            .list(&MovementFilter {
                range: Some(today),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(in_range.len(), 3);

        let by_reference = ledger
            .list_for_reference(ReferenceType::Sale, "sale-1")
            .await
            .unwrap();
        assert_eq!(by_reference.len(), 3);
        assert_eq!(by_reference[0].movement_type, MovementType::Out);
    }
}
