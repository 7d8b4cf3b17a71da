//! # Stock Service
//!
//! Manual stock corrections, the movement ledger, and low-stock queries.

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument};
use ts_rs::TS;

use tokodash_core::stock::StockDirection;
use tokodash_core::validation::{validate_notes, validate_sku, validate_stock_level};
use tokodash_core::{
    CoreError, MovementFilter, MovementType, ProductVariant, ReferenceType, StockMovement,
};
use tokodash_db::{repository::generate_id, Database, DbError};

use crate::error::{ApiError, ApiResult};
use crate::ledger::{alert_low_stock, MovedStock};
use crate::notify::NotificationHub;

/// A stock count result: set on-hand stock to `new_quantity`.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct StockAdjustment {
    pub variant_id: String,
    pub new_quantity: i64,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct StockService {
    db: Database,
    hub: NotificationHub,
}

impl StockService {
    pub fn new(db: Database, hub: NotificationHub) -> Self {
        StockService { db, hub }
    }

    /// Sets a variant's stock and records the signed difference as an
    /// `adjustment` movement.
    ///
    /// ## Returns
    /// * `Ok(None)` - stock already equals `new_quantity`
    #[instrument(skip(self, adjustment), fields(variant_id = %adjustment.variant_id))]
    pub async fn adjust_stock(&self, adjustment: StockAdjustment) -> ApiResult<Option<StockMovement>> {
        validate_stock_level(adjustment.new_quantity)?;
        validate_notes(adjustment.notes.as_deref())?;

        let mut tx = self.db.begin().await?;

        let variant = self
            .db
            .products()
            .get_variant_in(&mut tx, &adjustment.variant_id)
            .await?
            .ok_or_else(|| CoreError::VariantNotFound(adjustment.variant_id.clone()))?;

        let delta = adjustment.new_quantity - variant.stock_quantity;
        if delta == 0 {
            return Ok(None);
        }

        self.db
            .products()
            .set_stock_in(&mut tx, &variant.id, variant.stock_quantity, adjustment.new_quantity)
            .await?;

        let movement_id = generate_id();
        let movement = StockMovement {
            id: movement_id.clone(),
            tenant_id: self.db.tenant_id().to_string(),
            variant_id: variant.id.clone(),
            movement_type: MovementType::Adjustment,
            quantity: delta,
            reference_type: Some(ReferenceType::Adjustment),
            reference_id: Some(movement_id),
            notes: adjustment.notes,
            created_at: Utc::now(),
        };
        self.db.stock_movements().insert_in(&mut tx, &movement).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            sku = %variant.sku,
            from = variant.stock_quantity,
            to = adjustment.new_quantity,
            "Stock adjusted"
        );

        if delta < 0 {
            let moved = [MovedStock {
                variant_id: variant.id,
                direction: StockDirection::Out,
                new_quantity: adjustment.new_quantity,
            }];
            alert_low_stock(&self.db, &self.hub, &moved).await;
        }

        Ok(Some(movement))
    }

    pub async fn list_movements(&self, filter: &MovementFilter) -> ApiResult<Vec<StockMovement>> {
        Ok(self.db.stock_movements().list(filter).await?)
    }

    /// Variants at or below `threshold`, or below their own `min_stock`.
    /// Without a threshold the tenant setting applies.
    pub async fn low_stock(&self, threshold: Option<i64>) -> ApiResult<Vec<ProductVariant>> {
        let threshold = match threshold {
            Some(t) if t < 0 => return Err(ApiError::validation("threshold must not be negative")),
            Some(t) => t,
            None => self.hub.low_stock_threshold().await?,
        };
        Ok(self.db.products().low_stock(threshold).await?)
    }

    pub async fn find_by_sku(&self, sku: &str) -> ApiResult<ProductVariant> {
        validate_sku(sku)?;
        self.db
            .products()
            .get_variant_by_sku(sku.trim())
            .await?
            .ok_or_else(|| ApiError::not_found("Product variant", sku))
    }

    pub async fn list_variants(&self, product_id: Option<&str>) -> ApiResult<Vec<ProductVariant>> {
        Ok(self.db.products().list_variants(product_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::testing;
    use tokodash_core::NotificationKind;

    fn count(variant_id: &str, new_quantity: i64) -> StockAdjustment {
        StockAdjustment {
            variant_id: variant_id.to_string(),
            new_quantity,
            notes: Some("stock opname".to_string()),
        }
    }

    #[tokio::test]
    async fn test_adjust_records_signed_delta() {
        let fx = testing::fixture().await;
        let kaos = testing::variant(&fx.office, "KOS-M", 10).await;
        let stock = fx.office.stock();

        let down = stock.adjust_stock(count(&kaos.id, 7)).await.unwrap().unwrap();
        assert_eq!(down.movement_type, MovementType::Adjustment);
        assert_eq!(down.quantity, -3);
        assert_eq!(down.signed_quantity(), -3);

        let up = stock.adjust_stock(count(&kaos.id, 12)).await.unwrap().unwrap();
        assert_eq!(up.quantity, 5);
        assert_eq!(testing::stock_of(&fx.office, &kaos.id).await, 12);

        let ledger = stock
            .list_movements(&MovementFilter {
                variant_id: Some(kaos.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(ledger.iter().map(|m| m.signed_quantity()).sum::<i64>(), 2);
    }

    #[tokio::test]
    async fn test_zero_delta_is_noop() {
        let fx = testing::fixture().await;
        let kaos = testing::variant(&fx.office, "KOS-M", 10).await;

        assert!(fx
            .office
            .stock()
            .adjust_stock(count(&kaos.id, 10))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_negative_and_unknown_rejected() {
        let fx = testing::fixture().await;
        let kaos = testing::variant(&fx.office, "KOS-M", 10).await;
        let stock = fx.office.stock();

        let err = stock.adjust_stock(count(&kaos.id, -1)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(testing::stock_of(&fx.office, &kaos.id).await, 10);

        let err = stock.adjust_stock(count(&generate_id(), 3)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_low_stock_uses_tenant_threshold() {
        let fx = testing::fixture().await;
        testing::variant(&fx.office, "LOW-1", 3).await;
        testing::variant(&fx.office, "MID-1", 8).await;
        let stock = fx.office.stock();

        assert_eq!(stock.low_stock(None).await.unwrap().len(), 1);
        assert_eq!(stock.low_stock(Some(10)).await.unwrap().len(), 2);

        fx.office
            .notifications()
            .update_settings(crate::notify::SettingsUpdate {
                low_stock_threshold: Some(8),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(stock.low_stock(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_adjust_down_alerts() {
        let fx = testing::fixture().await;
        let kaos = testing::variant(&fx.office, "KOS-M", 10).await;
        let mut rx = fx.office.notifications().subscribe();

        fx.office.stock().adjust_stock(count(&kaos.id, 2)).await.unwrap();

        let alert = rx.recv().await.unwrap();
        assert_eq!(alert.kind, NotificationKind::LowStock);
    }

    #[tokio::test]
    async fn test_find_by_sku() {
        let fx = testing::fixture().await;
        let kaos = testing::variant(&fx.office, "KOS-M", 10).await;
        let stock = fx.office.stock();

        assert_eq!(stock.find_by_sku("KOS-M").await.unwrap().id, kaos.id);
        assert_eq!(
            stock.find_by_sku("KOS M!").await.unwrap_err().code,
            ErrorCode::ValidationError
        );
        assert_eq!(
            stock.find_by_sku("NOPE-1").await.unwrap_err().code,
            ErrorCode::NotFound
        );
    }
}
