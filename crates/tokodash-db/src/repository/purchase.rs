//! # Purchase Repository
//!
//! Suppliers and purchase orders. Non-cancelled purchase totals are the
//! cost-of-goods figure in profit & loss.

use std::sync::Arc;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tokodash_core::{DateRange, Purchase, PurchaseFilter, PurchaseItem, PurchaseStatus, Supplier};

const PURCHASE_COLUMNS: &str = "id, tenant_id, supplier_id, store_id, purchase_number, \
     purchase_date, status, total, notes, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
    tenant_id: Arc<str>,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool, tenant_id: Arc<str>) -> Self {
        PurchaseRepository { pool, tenant_id }
    }

    // =========================================================================
    // Suppliers
    // =========================================================================

    pub async fn insert_supplier(&self, supplier: &Supplier) -> DbResult<()> {
        debug!(name = %supplier.name, "Inserting supplier");

        sqlx::query(
            r#"
            INSERT INTO suppliers (id, tenant_id, name, phone, address, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&supplier.id)
        .bind(&*self.tenant_id)
        .bind(&supplier.name)
        .bind(&supplier.phone)
        .bind(&supplier.address)
        .bind(supplier.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_suppliers(&self) -> DbResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, tenant_id, name, phone, address, created_at
            FROM suppliers
            WHERE tenant_id = ?1
            ORDER BY name
            "#,
        )
        .bind(&*self.tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(suppliers)
    }

    // =========================================================================
    // Purchases
    // =========================================================================

    /// Inserts a purchase header inside a transaction.
    pub async fn insert_in(&self, conn: &mut SqliteConnection, purchase: &Purchase) -> DbResult<()> {
        debug!(id = %purchase.id, number = %purchase.purchase_number, "Inserting purchase");

        sqlx::query(
            r#"
            INSERT INTO purchases (
                id, tenant_id, supplier_id, store_id, purchase_number,
                purchase_date, status, total, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&purchase.id)
        .bind(&*self.tenant_id)
        .bind(&purchase.supplier_id)
        .bind(&purchase.store_id)
        .bind(&purchase.purchase_number)
        .bind(purchase.purchase_date)
        .bind(purchase.status)
        .bind(purchase.total)
        .bind(&purchase.notes)
        .bind(purchase.created_at)
        .bind(purchase.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts a purchase line inside a transaction.
    pub async fn insert_item_in(
        &self,
        conn: &mut SqliteConnection,
        item: &PurchaseItem,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO purchase_items (
                id, purchase_id, variant_id, quantity, unit_cost, line_total
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&item.id)
        .bind(&item.purchase_id)
        .bind(&item.variant_id)
        .bind(item.quantity)
        .bind(item.unit_cost)
        .bind(item.line_total)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Purchase>> {
        let purchase = sqlx::query_as::<_, Purchase>(&format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE id = ?1 AND tenant_id = ?2"
        ))
        .bind(id)
        .bind(&*self.tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(purchase)
    }

    pub async fn get_by_id_in(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Purchase>> {
        let purchase = sqlx::query_as::<_, Purchase>(&format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE id = ?1 AND tenant_id = ?2"
        ))
        .bind(id)
        .bind(&*self.tenant_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(purchase)
    }

    pub async fn get_items(&self, purchase_id: &str) -> DbResult<Vec<PurchaseItem>> {
        let items = sqlx::query_as::<_, PurchaseItem>(
            r#"
            SELECT id, purchase_id, variant_id, quantity, unit_cost, line_total
            FROM purchase_items
            WHERE purchase_id = ?1
              AND purchase_id IN (SELECT id FROM purchases WHERE tenant_id = ?2)
            ORDER BY rowid
            "#,
        )
        .bind(purchase_id)
        .bind(&*self.tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    pub async fn get_items_in(
        &self,
        conn: &mut SqliteConnection,
        purchase_id: &str,
    ) -> DbResult<Vec<PurchaseItem>> {
        let items = sqlx::query_as::<_, PurchaseItem>(
            r#"
            SELECT id, purchase_id, variant_id, quantity, unit_cost, line_total
            FROM purchase_items
            WHERE purchase_id = ?1
              AND purchase_id IN (SELECT id FROM purchases WHERE tenant_id = ?2)
            ORDER BY rowid
            "#,
        )
        .bind(purchase_id)
        .bind(&*self.tenant_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(items)
    }

    /// Lists purchases matching `filter`, newest first.
    pub async fn list(&self, filter: &PurchaseFilter) -> DbResult<Vec<Purchase>> {
        let (start, end) = match filter.range {
            Some(range) => (Some(range.start), Some(range.end)),
            None => (None, None),
        };

        let purchases = sqlx::query_as::<_, Purchase>(&format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases \
             WHERE tenant_id = ?1 \
               AND (?2 IS NULL OR purchase_date >= ?2) \
               AND (?3 IS NULL OR purchase_date <= ?3) \
               AND (?4 IS NULL OR supplier_id = ?4) \
               AND (?5 IS NULL OR status = ?5) \
             ORDER BY purchase_date DESC, created_at DESC"
        ))
        .bind(&*self.tenant_id)
        .bind(start)
        .bind(end)
        .bind(filter.supplier_id.as_deref())
        .bind(filter.status)
        .fetch_all(&self.pool)
        .await?;

        Ok(purchases)
    }

    /// Moves a purchase from `from` to `to`.
    ///
    /// ## Returns
    /// * `Err(DbError::Conflict)` - the purchase is no longer in `from`
    pub async fn update_status_in(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        from: PurchaseStatus,
        to: PurchaseStatus,
    ) -> DbResult<()> {
        debug!(id = %id, from = %from, to = %to, "Updating purchase status");

        let result = sqlx::query(
            r#"
            UPDATE purchases
            SET status = ?1, updated_at = ?2
            WHERE id = ?3 AND tenant_id = ?4 AND status = ?5
            "#,
        )
        .bind(to)
        .bind(Utc::now())
        .bind(id)
        .bind(&*self.tenant_id)
        .bind(from)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict("Purchase", id));
        }

        Ok(())
    }

    /// Totals of non-cancelled purchases dated in `range`.
    pub async fn cost_of_goods(
        &self,
        range: DateRange,
        store_id: Option<&str>,
    ) -> DbResult<Vec<i64>> {
        let totals: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT total
            FROM purchases
            WHERE tenant_id = ?1
              AND status != 'cancelled'
              AND purchase_date >= ?2 AND purchase_date <= ?3
              AND (?4 IS NULL OR store_id = ?4)
            "#,
        )
        .bind(&*self.tenant_id)
        .bind(range.start)
        .bind(range.end)
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(totals)
    }
}
