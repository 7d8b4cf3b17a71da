//! # Sale Repository
//!
//! Database operations for sales orders, their lines, and the revenue
//! queries behind reports and the dashboard.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  insert_in + insert_item_in      (one transaction)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  pending ─► processing ─► shipped ─► delivered                          │
//! │                              │           │                              │
//! │                              ▼           ▼                              │
//! │                         cancelled    returned                           │
//! │                                                                         │
//! │  update_status_in only succeeds if the row still has the status the    │
//! │  caller read, so two sessions cannot both apply the same transition.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tokodash_core::{DateRange, Sale, SaleFilter, SaleItem, SaleStatus};

const SALE_COLUMNS: &str = "id, tenant_id, store_id, platform_id, order_number, customer_name, \
     status, sale_date, subtotal, shipping_cost, discount, total, notes, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, sale_id, variant_id, quantity, unit_price, line_total, created_at";

// =============================================================================
// Query Rows
// =============================================================================

/// A delivered sale's total with the name of its platform.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RevenueRow {
    pub platform_name: Option<String>,
    pub total: i64,
}

/// Number and value of orders in one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StatusCount {
    pub status: SaleStatus,
    pub order_count: i64,
    pub total: i64,
}

/// Delivered revenue for one business day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DailyRevenue {
    pub sale_date: NaiveDate,
    pub order_count: i64,
    pub revenue: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
    tenant_id: Arc<str>,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool, tenant_id: Arc<str>) -> Self {
        SaleRepository { pool, tenant_id }
    }

    /// Inserts a sale header inside a transaction.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - order number already used by the store
    pub async fn insert_in(&self, conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, order_number = %sale.order_number, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, tenant_id, store_id, platform_id, order_number, customer_name,
                status, sale_date, subtotal, shipping_cost, discount, total,
                notes, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10, ?11, ?12,
                ?13, ?14, ?15
            )
            "#,
        )
        .bind(&sale.id)
        .bind(&*self.tenant_id)
        .bind(&sale.store_id)
        .bind(&sale.platform_id)
        .bind(&sale.order_number)
        .bind(&sale.customer_name)
        .bind(sale.status)
        .bind(sale.sale_date)
        .bind(sale.subtotal)
        .bind(sale.shipping_cost)
        .bind(sale.discount)
        .bind(sale.total)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts a sale line inside a transaction.
    pub async fn insert_item_in(&self, conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
        debug!(sale_id = %item.sale_id, variant_id = %item.variant_id, "Inserting sale item");

        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, variant_id, quantity, unit_price, line_total, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.variant_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.line_total)
        .bind(item.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1 AND tenant_id = ?2"
        ))
        .bind(id)
        .bind(&*self.tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Same as [`get_by_id`](Self::get_by_id) inside a transaction.
    pub async fn get_by_id_in(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1 AND tenant_id = ?2"
        ))
        .bind(id)
        .bind(&*self.tenant_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(sale)
    }

    /// Gets all lines of a sale.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM sale_items \
             WHERE sale_id = ?1 \
               AND sale_id IN (SELECT id FROM sales WHERE tenant_id = ?2) \
             ORDER BY created_at, rowid"
        ))
        .bind(sale_id)
        .bind(&*self.tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Same as [`get_items`](Self::get_items) inside a transaction.
    pub async fn get_items_in(
        &self,
        conn: &mut SqliteConnection,
        sale_id: &str,
    ) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM sale_items \
             WHERE sale_id = ?1 \
               AND sale_id IN (SELECT id FROM sales WHERE tenant_id = ?2) \
             ORDER BY created_at, rowid"
        ))
        .bind(sale_id)
        .bind(&*self.tenant_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(items)
    }

    /// Lists sales matching `filter`, newest business day first.
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<Vec<Sale>> {
        let (start, end) = split_range(filter.range);

        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             WHERE tenant_id = ?1 \
               AND (?2 IS NULL OR sale_date >= ?2) \
               AND (?3 IS NULL OR sale_date <= ?3) \
               AND (?4 IS NULL OR store_id = ?4) \
               AND (?5 IS NULL OR status = ?5) \
             ORDER BY sale_date DESC, created_at DESC"
        ))
        .bind(&*self.tenant_id)
        .bind(start)
        .bind(end)
        .bind(filter.store_id.as_deref())
        .bind(filter.status)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = sales.len(), "Listed sales");
        Ok(sales)
    }

    /// Moves a sale from `from` to `to`.
    ///
    /// ## Returns
    /// * `Err(DbError::Conflict)` - the sale is no longer in `from`
    pub async fn update_status_in(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        from: SaleStatus,
        to: SaleStatus,
    ) -> DbResult<()> {
        debug!(id = %id, from = %from, to = %to, "Updating sale status");

        let result = sqlx::query(
            r#"
            UPDATE sales
            SET status = ?1,
                updated_at = ?2
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
            return Err(DbError::conflict("Sale", id));
        }

        Ok(())
    }

    /// Deletes a sale and its lines.
    pub async fn delete_in(&self, conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting sale");

        sqlx::query(
            r#"
            DELETE FROM sale_items
            WHERE sale_id = ?1
              AND sale_id IN (SELECT id FROM sales WHERE tenant_id = ?2)
            "#,
        )
        .bind(id)
        .bind(&*self.tenant_id)
        .execute(&mut *conn)
        .await?;

        let result = sqlx::query("DELETE FROM sales WHERE id = ?1 AND tenant_id = ?2")
            .bind(id)
            .bind(&*self.tenant_id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }

        Ok(())
    }

    // =========================================================================
    // Revenue queries
    // =========================================================================

    /// Delivered sales in `range` with their platform name.
    ///
    /// The sale's own platform wins; otherwise the store's platform.
    pub async fn delivered_revenue(
        &self,
        range: DateRange,
        store_id: Option<&str>,
    ) -> DbResult<Vec<RevenueRow>> {
        let rows = sqlx::query_as::<_, RevenueRow>(
            r#"
            SELECT p.name AS platform_name, s.total AS total
            FROM sales s
            LEFT JOIN stores st ON st.id = s.store_id AND st.tenant_id = s.tenant_id
            LEFT JOIN platforms p
                ON p.id = COALESCE(s.platform_id, st.platform_id) AND p.tenant_id = s.tenant_id
            WHERE s.tenant_id = ?1
              AND s.status = 'delivered'
              AND s.sale_date >= ?2 AND s.sale_date <= ?3
              AND (?4 IS NULL OR s.store_id = ?4)
            "#,
        )
        .bind(&*self.tenant_id)
        .bind(range.start)
        .bind(range.end)
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Order count and value per status in `range`.
    pub async fn status_counts(
        &self,
        range: DateRange,
        store_id: Option<&str>,
    ) -> DbResult<Vec<StatusCount>> {
        let rows = sqlx::query_as::<_, StatusCount>(
            r#"
            SELECT status, COUNT(*) AS order_count, COALESCE(SUM(total), 0) AS total
            FROM sales
            WHERE tenant_id = ?1
              AND sale_date >= ?2 AND sale_date <= ?3
              AND (?4 IS NULL OR store_id = ?4)
            GROUP BY status
            ORDER BY status
            "#,
        )
        .bind(&*self.tenant_id)
        .bind(range.start)
        .bind(range.end)
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Delivered revenue per day in `range`, days without sales omitted.
    pub async fn daily_revenue(
        &self,
        range: DateRange,
        store_id: Option<&str>,
    ) -> DbResult<Vec<DailyRevenue>> {
        let rows = sqlx::query_as::<_, DailyRevenue>(
            r#"
            SELECT sale_date, COUNT(*) AS order_count, COALESCE(SUM(total), 0) AS revenue
            FROM sales
            WHERE tenant_id = ?1
              AND status = 'delivered'
              AND sale_date >= ?2 AND sale_date <= ?3
              AND (?4 IS NULL OR store_id = ?4)
            GROUP BY sale_date
            ORDER BY sale_date
            "#,
        )
        .bind(&*self.tenant_id)
        .bind(range.start)
        .bind(range.end)
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

fn split_range(range: Option<DateRange>) -> (Option<NaiveDate>, Option<NaiveDate>) {
    match range {
        Some(range) => (Some(range.start), Some(range.end)),
        None => (None, None),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
