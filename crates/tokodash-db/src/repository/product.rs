//! # Product Repository
//!
//! Catalog products, their variants, and on-hand stock.
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                            │
//! │                                                                     │
//! │  ❌ WRONG: read, check, write back an absolute value                │
//! │     SELECT stock_quantity ...  → 5                                  │
//! │     UPDATE ... SET stock_quantity = 3                               │
//! │     (a concurrent shipment in between is silently lost)             │
//! │                                                                     │
//! │  ✅ CORRECT: one guarded delta statement                            │
//! │     UPDATE ... SET stock_quantity = stock_quantity - 2              │
//! │     WHERE ... AND stock_quantity - 2 >= 0                           │
//! │     RETURNING sku, stock_quantity                                   │
//! │                                                                     │
//! │  No row back → variant missing, or not enough stock.                │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tokodash_core::{Product, ProductVariant};

const VARIANT_COLUMNS: &str = "id, tenant_id, product_id, sku, name, price, cost_price, \
     stock_quantity, min_stock, created_at, updated_at";

/// Outcome of a guarded stock delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockChange {
    /// Delta applied.
    Applied { sku: String, new_quantity: i64 },
    /// The variant does not exist (deleted from the catalog).
    Missing,
    /// Applying the delta would make stock negative; nothing changed.
    Insufficient { sku: String, available: i64 },
}

/// Repository for products and variants.
///
/// ## Usage
/// ```rust,ignore
/// let products = db.products();
/// let variant = products.get_variant_by_sku("KAOS-HITAM-L").await?;
/// let low = products.low_stock(5).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    tenant_id: Arc<str>,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool, tenant_id: Arc<str>) -> Self {
        ProductRepository { pool, tenant_id }
    }

    // =========================================================================
    // Products
    // =========================================================================

    pub async fn insert_product(&self, product: &Product) -> DbResult<()> {
        debug!(name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, tenant_id, name, description, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.id)
        .bind(&*self.tenant_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_product(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, tenant_id, name, description, is_active, created_at, updated_at
            FROM products
            WHERE id = ?1 AND tenant_id = ?2
            "#,
        )
        .bind(id)
        .bind(&*self.tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists active products by name.
    pub async fn list_products(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, tenant_id, name, description, is_active, created_at, updated_at
            FROM products
            WHERE tenant_id = ?1 AND is_active = 1
            ORDER BY name
            "#,
        )
        .bind(&*self.tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    // =========================================================================
    // Variants
    // =========================================================================

    /// Inserts a variant.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU already used by this tenant
    pub async fn insert_variant(&self, variant: &ProductVariant) -> DbResult<()> {
        debug!(sku = %variant.sku, "Inserting variant");

        sqlx::query(
            r#"
            INSERT INTO product_variants (
                id, tenant_id, product_id, sku, name, price, cost_price,
                stock_quantity, min_stock, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&variant.id)
        .bind(&*self.tenant_id)
        .bind(&variant.product_id)
        .bind(&variant.sku)
        .bind(&variant.name)
        .bind(variant.price)
        .bind(variant.cost_price)
        .bind(variant.stock_quantity)
        .bind(variant.min_stock)
        .bind(variant.created_at)
        .bind(variant.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_variant(&self, id: &str) -> DbResult<Option<ProductVariant>> {
        let variant = sqlx::query_as::<_, ProductVariant>(&format!(
            "SELECT {VARIANT_COLUMNS} FROM product_variants WHERE id = ?1 AND tenant_id = ?2"
        ))
        .bind(id)
        .bind(&*self.tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(variant)
    }

    /// Same as [`get_variant`](Self::get_variant) inside a transaction.
    pub async fn get_variant_in(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<ProductVariant>> {
        let variant = sqlx::query_as::<_, ProductVariant>(&format!(
            "SELECT {VARIANT_COLUMNS} FROM product_variants WHERE id = ?1 AND tenant_id = ?2"
        ))
        .bind(id)
        .bind(&*self.tenant_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(variant)
    }

    pub async fn get_variant_by_sku(&self, sku: &str) -> DbResult<Option<ProductVariant>> {
        let variant = sqlx::query_as::<_, ProductVariant>(&format!(
            "SELECT {VARIANT_COLUMNS} FROM product_variants WHERE sku = ?1 AND tenant_id = ?2"
        ))
        .bind(sku)
        .bind(&*self.tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(variant)
    }

    /// Lists variants, optionally of a single product, ordered by SKU.
    pub async fn list_variants(&self, product_id: Option<&str>) -> DbResult<Vec<ProductVariant>> {
        let variants = sqlx::query_as::<_, ProductVariant>(&format!(
            "SELECT {VARIANT_COLUMNS} FROM product_variants \
             WHERE tenant_id = ?1 AND (?2 IS NULL OR product_id = ?2) \
             ORDER BY sku"
        ))
        .bind(&*self.tenant_id)
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(variants)
    }

    /// Variants at or below their threshold (`min_stock`, else `default_threshold`),
    /// emptiest first.
    pub async fn low_stock(&self, default_threshold: i64) -> DbResult<Vec<ProductVariant>> {
        let variants = sqlx::query_as::<_, ProductVariant>(&format!(
            "SELECT {VARIANT_COLUMNS} FROM product_variants \
             WHERE tenant_id = ?1 AND stock_quantity <= COALESCE(min_stock, ?2) \
             ORDER BY stock_quantity, sku"
        ))
        .bind(&*self.tenant_id)
        .bind(default_threshold)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = variants.len(), threshold = default_threshold, "Low stock query");
        Ok(variants)
    }

    /// Removes a variant from the catalog.
    ///
    /// Sale and purchase lines keep their `variant_id`; ledger code treats
    /// such lines as missing and skips them.
    pub async fn delete_variant(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting variant");

        let result = sqlx::query("DELETE FROM product_variants WHERE id = ?1 AND tenant_id = ?2")
            .bind(id)
            .bind(&*self.tenant_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("ProductVariant", id));
        }

        Ok(())
    }

    // =========================================================================
    // Stock (transaction helpers)
    // =========================================================================

    /// Adds `delta` to on-hand stock unless the result would be negative.
    pub async fn apply_stock_delta_in(
        &self,
        conn: &mut SqliteConnection,
        variant_id: &str,
        delta: i64,
    ) -> DbResult<StockChange> {
        debug!(variant_id = %variant_id, delta = delta, "Applying stock delta");

        let updated: Option<(String, i64)> = sqlx::query_as(
            r#"
            UPDATE product_variants
            SET stock_quantity = stock_quantity + ?1,
                updated_at = ?2
            WHERE id = ?3 AND tenant_id = ?4 AND stock_quantity + ?1 >= 0
            RETURNING sku, stock_quantity
            "#,
        )
        .bind(delta)
        .bind(Utc::now())
        .bind(variant_id)
        .bind(&*self.tenant_id)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some((sku, new_quantity)) = updated {
            return Ok(StockChange::Applied { sku, new_quantity });
        }

        match self.get_variant_in(conn, variant_id).await? {
            Some(variant) => Ok(StockChange::Insufficient {
                sku: variant.sku,
                available: variant.stock_quantity,
            }),
            None => Ok(StockChange::Missing),
        }
    }

    /// Sets on-hand stock to `new_quantity` if it still equals `expected`.
    ///
    /// ## Returns
    /// * `Err(DbError::Conflict)` - stock moved since `expected` was read
    pub async fn set_stock_in(
        &self,
        conn: &mut SqliteConnection,
        variant_id: &str,
        expected: i64,
        new_quantity: i64,
    ) -> DbResult<()> {
        debug!(variant_id = %variant_id, expected = expected, new_quantity = new_quantity, "Setting stock");

        let result = sqlx::query(
            r#"
            UPDATE product_variants
            SET stock_quantity = ?1,
                updated_at = ?2
            WHERE id = ?3 AND tenant_id = ?4 AND stock_quantity = ?5
            "#,
        )
        .bind(new_quantity)
        .bind(Utc::now())
        .bind(variant_id)
        .bind(&*self.tenant_id)
        .bind(expected)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict("ProductVariant", variant_id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;

    #[tokio::test]
    async fn test_variant_lookup() {
        let db = fixtures::database().await;
        let variant = fixtures::variant(&db, "KAOS-HITAM-L", 10).await;

        let by_id = db.products().get_variant(&variant.id).await.unwrap().unwrap();
        let by_sku = db
            .products()
            .get_variant_by_sku("KAOS-HITAM-L")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_id.id, by_sku.id);
        assert_eq!(
            db.products()
                .list_variants(Some(&variant.product_id))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = fixtures::database().await;
        let variant = fixtures::variant(&db, "DUP-1", 1).await;

        let mut copy = variant.clone();
        copy.id = crate::repository::generate_id();
        let err = db.products().insert_variant(&copy).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_stock_delta_outcomes() {
        let db = fixtures::database().await;
        let variant = fixtures::variant(&db, "KAOS-PUTIH-M", 3).await;
        let products = db.products();

        let mut tx = db.begin().await.unwrap();
        assert_eq!(
            products.apply_stock_delta_in(&mut tx, &variant.id, -2).await.unwrap(),
            StockChange::Applied {
                sku: "KAOS-PUTIH-M".to_string(),
                new_quantity: 1
            }
        );
        assert_eq!(
            products.apply_stock_delta_in(&mut tx, &variant.id, -2).await.unwrap(),
            StockChange::Insufficient {
                sku: "KAOS-PUTIH-M".to_string(),
                available: 1
            }
        );
        assert_eq!(
            products.apply_stock_delta_in(&mut tx, "gone", 1).await.unwrap(),
            StockChange::Missing
        );
        tx.commit().await.unwrap();

        let loaded = products.get_variant(&variant.id).await.unwrap().unwrap();
        assert_eq!(loaded.stock_quantity, 1);
    }

    #[tokio::test]
    async fn test_set_stock_detects_conflict() {
        let db = fixtures::database().await;
        let variant = fixtures::variant(&db, "TOPI-01", 7).await;
        let products = db.products();

        let mut tx = db.begin().await.unwrap();
        products.set_stock_in(&mut tx, &variant.id, 7, 4).await.unwrap();
        let err = products.set_stock_in(&mut tx, &variant.id, 7, 2).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_low_stock_uses_variant_threshold() {
        let db = fixtures::database().await;
        fixtures::variant(&db, "LOW-1", 2).await;
        fixtures::variant(&db, "OK-1", 50).await;

        let custom = fixtures::variant(&db, "CUSTOM-1", 15).await;
        sqlx::query("UPDATE product_variants SET min_stock = 20 WHERE id = ?1")
            .bind(&custom.id)
            .execute(db.pool())
            .await
            .unwrap();

        let low = db.products().low_stock(5).await.unwrap();
        let skus: Vec<_> = low.iter().map(|v| v.sku.as_str()).collect();
        assert_eq!(skus, vec!["LOW-1", "CUSTOM-1"]);
    }

    #[tokio::test]
    async fn test_delete_variant() {
        let db = fixtures::database().await;
        let variant = fixtures::variant(&db, "BYE-1", 1).await;

        db.products().delete_variant(&variant.id).await.unwrap();
        assert!(db.products().get_variant(&variant.id).await.unwrap().is_none());
        assert!(db.products().delete_variant(&variant.id).await.is_err());
    }
}
