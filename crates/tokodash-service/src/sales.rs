//! # Sale Service
//!
//! Sales orders and the stock ledger their status changes drive.
//!
//! ## Status Change Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  update_status(id, Shipped)                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │  ├── load sale + items                                                  │
//! │  ├── UPDATE sales SET status WHERE status = old   (else CONFLICT)       │
//! │  ├── transition_effect(old, new)                                        │
//! │  ├── per line: guarded stock delta + ledger row                         │
//! │  │     └── insufficient → return, tx dropped, nothing written           │
//! │  └── balance delta on stores.saldo_dashboard                            │
//! │  COMMIT                                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  notifications (status change, low stock)                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every quantity and balance change is a delta applied in SQL, so two
//! concurrent status changes cannot lose each other's update; the second
//! one to reach the conditional status update gets `CONFLICT`.

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use sqlx::SqliteConnection;
use tracing::{info, instrument};
use ts_rs::TS;

use tokodash_core::sale::{LineAmount, SaleTotals};
use tokodash_core::stock::{deletion_effect, transition_effect, TransitionEffect};
use tokodash_core::validation::{
    validate_name, validate_non_negative_amount, validate_not_empty, validate_notes,
    validate_quantity, validate_uuid,
};
use tokodash_core::{
    CoreError, Money, NotificationKind, ReferenceType, Sale, SaleDetail, SaleFilter, SaleItem,
    SaleStatus,
};
use tokodash_db::{repository::generate_id, Database, DbError, ReferenceKind};

use crate::error::ApiResult;
use crate::ledger::{alert_low_stock, move_stock_in, MovedStock, Reference};
use crate::notify::NotificationHub;

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct NewSaleItem {
    pub variant_id: String,
    pub quantity: i64,
    /// Defaults to the variant's list price.
    pub unit_price: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct NewSale {
    pub store_id: String,
    pub platform_id: Option<String>,
    pub order_number: String,
    pub customer_name: Option<String>,
    /// Defaults to `pending`.
    pub status: Option<SaleStatus>,
    #[ts(as = "String")]
    pub sale_date: NaiveDate,
    #[serde(default)]
    pub shipping_cost: i64,
    #[serde(default)]
    pub discount: i64,
    pub notes: Option<String>,
    pub items: Vec<NewSaleItem>,
}

// =============================================================================
// Service
// =============================================================================

#[derive(Clone)]
pub struct SaleService {
    db: Database,
    hub: NotificationHub,
}

impl SaleService {
    pub fn new(db: Database, hub: NotificationHub) -> Self {
        SaleService { db, hub }
    }

    /// Records a new order. An initial status of shipped or delivered
    /// applies the same stock and balance effect as moving there from
    /// pending.
    #[instrument(skip(self, new), fields(order_number = %new.order_number))]
    pub async fn create_sale(&self, new: NewSale) -> ApiResult<SaleDetail> {
        validate_uuid("store_id", &new.store_id)?;
        if let Some(platform_id) = &new.platform_id {
            validate_uuid("platform_id", platform_id)?;
        }
        validate_name("order_number", &new.order_number)?;
        validate_notes(new.notes.as_deref())?;
        validate_not_empty("items", &new.items)?;
        for item in &new.items {
            validate_quantity(item.quantity)?;
            if let Some(price) = item.unit_price {
                validate_non_negative_amount("unit_price", price)?;
            }
        }

        let status = new.status.unwrap_or_default();
        let now = Utc::now();
        let sale_id = generate_id();

        let mut tx = self.db.begin().await?;

        let references = self.db.references();
        references
            .ensure_owned_in(&mut tx, ReferenceKind::Store, &new.store_id)
            .await?;
        if let Some(platform_id) = &new.platform_id {
            references
                .ensure_owned_in(&mut tx, ReferenceKind::Platform, platform_id)
                .await?;
        }

        let mut items = Vec::with_capacity(new.items.len());
        let mut lines = Vec::with_capacity(new.items.len());
        for item in &new.items {
            let variant = self
                .db
                .products()
                .get_variant_in(&mut tx, &item.variant_id)
                .await?
                .ok_or_else(|| CoreError::VariantNotFound(item.variant_id.clone()))?;

            let line = LineAmount::new(
                item.quantity,
                Money::from_amount(item.unit_price.unwrap_or(variant.price)),
            );
            items.push(SaleItem {
                id: generate_id(),
                sale_id: sale_id.clone(),
                variant_id: variant.id,
                quantity: line.quantity,
                unit_price: line.unit_price.amount(),
                line_total: line.line_total()?.amount(),
                created_at: now,
            });
            lines.push(line);
        }

        let totals = SaleTotals::compute(
            &lines,
            Money::from_amount(new.shipping_cost),
            Money::from_amount(new.discount),
        )?;

        let sale = Sale {
            id: sale_id,
            tenant_id: self.db.tenant_id().to_string(),
            store_id: new.store_id,
            platform_id: new.platform_id,
            order_number: new.order_number,
            customer_name: new.customer_name,
            status,
            sale_date: new.sale_date,
            subtotal: totals.subtotal.amount(),
            shipping_cost: totals.shipping_cost.amount(),
            discount: totals.discount.amount(),
            total: totals.total.amount(),
            notes: new.notes,
            created_at: now,
            updated_at: now,
        };

        self.db.sales().insert_in(&mut tx, &sale).await?;
        for item in &items {
            self.db.sales().insert_item_in(&mut tx, item).await?;
        }

        let effect = transition_effect(SaleStatus::Pending, status);
        let notes = format!("sale {} created as {}", sale.order_number, status);
        let moved = self.apply_effect_in(&mut tx, &sale, &items, effect, &notes).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(sale_id = %sale.id, total = %sale.total(), status = %status, "Sale created");
        alert_low_stock(&self.db, &self.hub, &moved).await;

        Ok(SaleDetail { sale, items })
    }

    pub async fn get_sale(&self, id: &str) -> ApiResult<SaleDetail> {
        let sale = self
            .db
            .sales()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(id.to_string()))?;
        let items = self.db.sales().get_items(id).await?;

        Ok(SaleDetail { sale, items })
    }

    pub async fn list_sales(&self, filter: &SaleFilter) -> ApiResult<Vec<Sale>> {
        Ok(self.db.sales().list(filter).await?)
    }

    /// Moves a sale to `new_status`, applying the stock and balance effect
    /// of the transition atomically.
    ///
    /// ## Errors
    /// * `INSUFFICIENT_STOCK` - a line cannot be shipped; nothing changes
    /// * `BUSINESS_LOGIC` - the sale changed status concurrently
    pub async fn update_status(&self, id: &str, new_status: SaleStatus) -> ApiResult<Sale> {
        self.change_status(id, None, new_status).await
    }

    /// Like [`update_status`](Self::update_status), but only if the sale is
    /// still in `expected`, the status the caller last displayed.
    ///
    /// ## Errors
    /// * `BUSINESS_LOGIC` - the sale is no longer in `expected`
    pub async fn update_status_from(
        &self,
        id: &str,
        expected: SaleStatus,
        new_status: SaleStatus,
    ) -> ApiResult<Sale> {
        self.change_status(id, Some(expected), new_status).await
    }

    #[instrument(skip(self))]
    async fn change_status(
        &self,
        id: &str,
        expected: Option<SaleStatus>,
        new_status: SaleStatus,
    ) -> ApiResult<Sale> {
        let mut tx = self.db.begin().await?;

        let mut sale = self
            .db
            .sales()
            .get_by_id_in(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(id.to_string()))?;

        // The conditional update below rejects a stale `expected`
        let old_status = expected.unwrap_or(sale.status);
        if old_status == new_status {
            if sale.status != new_status {
                return Err(DbError::conflict("Sale", id).into());
            }
            return Ok(sale);
        }

        let items = self.db.sales().get_items_in(&mut tx, id).await?;
        self.db
            .sales()
            .update_status_in(&mut tx, id, old_status, new_status)
            .await?;

        let effect = transition_effect(old_status, new_status);
        let notes = format!("sale {}: {} -> {}", sale.order_number, old_status, new_status);
        let moved = self.apply_effect_in(&mut tx, &sale, &items, effect, &notes).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            sale_id = %id,
            from = %old_status,
            to = %new_status,
            stock = ?effect.stock,
            balance = ?effect.balance,
            lines_moved = moved.len(),
            "Sale status updated"
        );

        sale.status = new_status;
        sale.updated_at = Utc::now();

        self.hub
            .notify_logged(
                NotificationKind::SaleStatus,
                format!("Order {} is {}", sale.order_number, new_status),
                notes,
                Some(&sale.id),
            )
            .await;
        alert_low_stock(&self.db, &self.hub, &moved).await;

        Ok(sale)
    }

    /// Deletes a sale, returning committed stock and taking back a
    /// delivered order's balance credit first.
    #[instrument(skip(self))]
    pub async fn delete_sale(&self, id: &str) -> ApiResult<()> {
        let mut tx = self.db.begin().await?;

        let sale = self
            .db
            .sales()
            .get_by_id_in(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(id.to_string()))?;
        let items = self.db.sales().get_items_in(&mut tx, id).await?;

        let effect = deletion_effect(sale.status);
        self.apply_effect_in(&mut tx, &sale, &items, effect, "sale deleted")
            .await?;
        self.db.sales().delete_in(&mut tx, id).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(sale_id = %id, status = %sale.status, "Sale deleted");
        Ok(())
    }

    /// Applies `effect` to every line and to the store balance.
    async fn apply_effect_in(
        &self,
        conn: &mut SqliteConnection,
        sale: &Sale,
        items: &[SaleItem],
        effect: TransitionEffect,
        notes: &str,
    ) -> ApiResult<Vec<MovedStock>> {
        let mut moved = Vec::new();
        if effect.is_noop() {
            return Ok(moved);
        }

        let reference = Reference {
            kind: ReferenceType::Sale,
            id: &sale.id,
        };
        for item in items {
            if let Some(m) = move_stock_in(
                &self.db,
                conn,
                effect.stock,
                &item.variant_id,
                item.quantity,
                reference,
                notes,
            )
            .await?
            {
                moved.push(m);
            }
        }

        let balance_delta = effect.balance.sign() * sale.total;
        if balance_delta != 0 {
            let balance = self
                .db
                .stores()
                .adjust_balance_in(conn, &sale.store_id, balance_delta)
                .await?;
            info!(store_id = %sale.store_id, delta = balance_delta, balance = balance, "Store balance adjusted");
        }

        Ok(moved)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::testing::{self, Fixture};
    use tokodash_core::{MovementFilter, MovementType};

    fn order(fx: &Fixture, number: &str, status: SaleStatus, lines: &[(&str, i64)]) -> NewSale {
        NewSale {
            store_id: fx.store.id.clone(),
            platform_id: None,
            order_number: number.to_string(),
            customer_name: Some("Budi".to_string()),
            status: Some(status),
            sale_date: testing::day("2026-03-10"),
            shipping_cost: 10_000,
            discount: 0,
            notes: None,
            items: lines
                .iter()
                .map(|(variant_id, quantity)| NewSaleItem {
                    variant_id: variant_id.to_string(),
                    quantity: *quantity,
                    unit_price: None,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_create_pending_moves_nothing() {
        let fx = testing::fixture().await;
        let kaos = testing::variant(&fx.office, "KOS-M", 10).await;

        let detail = fx
            .office
            .sales()
            .create_sale(order(&fx, "INV-1", SaleStatus::Pending, &[(&kaos.id, 2)]))
            .await
            .unwrap();

        assert_eq!(detail.sale.subtotal, 100_000);
        assert_eq!(detail.sale.total, 110_000);
        assert_eq!(testing::stock_of(&fx.office, &kaos.id).await, 10);
        assert!(fx
            .office
            .database()
            .stock_movements()
            .list(&MovementFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_ship_decrements_and_logs() {
        let fx = testing::fixture().await;
        let kaos = testing::variant(&fx.office, "KOS-M", 10).await;
        let topi = testing::variant(&fx.office, "TOP-1", 4).await;
        let sales = fx.office.sales();

        let detail = sales
            .create_sale(order(&fx, "INV-2", SaleStatus::Processing, &[(&kaos.id, 3), (&topi.id, 1)]))
            .await
            .unwrap();
        let shipped = sales
            .update_status(&detail.sale.id, SaleStatus::Shipped)
            .await
            .unwrap();

        assert_eq!(shipped.status, SaleStatus::Shipped);
        assert_eq!(testing::stock_of(&fx.office, &kaos.id).await, 7);
        assert_eq!(testing::stock_of(&fx.office, &topi.id).await, 3);

        let ledger = fx
            .office
            .database()
            .stock_movements()
            .list_for_reference(ReferenceType::Sale, &detail.sale.id)
            .await
            .unwrap();
        assert_eq!(ledger.len(), 2);
        assert!(ledger.iter().all(|m| m.movement_type == MovementType::Out));
        assert_eq!(testing::balance_of(&fx.office, &fx.store.id).await, 0);
    }

    #[tokio::test]
    async fn test_insufficient_stock_changes_nothing() {
        let fx = testing::fixture().await;
        let plenty = testing::variant(&fx.office, "KOS-M", 10).await;
        let scarce = testing::variant(&fx.office, "KOS-L", 1).await;
        let sales = fx.office.sales();

        let detail = sales
            .create_sale(order(&fx, "INV-3", SaleStatus::Pending, &[(&plenty.id, 2), (&scarce.id, 2)]))
            .await
            .unwrap();

        let err = sales
            .update_status(&detail.sale.id, SaleStatus::Delivered)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        // First line was applied inside the transaction, then rolled back
        assert_eq!(testing::stock_of(&fx.office, &plenty.id).await, 10);
        assert_eq!(testing::stock_of(&fx.office, &scarce.id).await, 1);
        assert_eq!(testing::balance_of(&fx.office, &fx.store.id).await, 0);
        assert_eq!(
            sales.get_sale(&detail.sale.id).await.unwrap().sale.status,
            SaleStatus::Pending
        );
        assert!(fx
            .office
            .database()
            .stock_movements()
            .list_for_reference(ReferenceType::Sale, &detail.sale.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_delivered_credits_and_return_reverses() {
        let fx = testing::fixture().await;
        let kaos = testing::variant(&fx.office, "KOS-M", 10).await;
        let sales = fx.office.sales();

        let detail = sales
            .create_sale(order(&fx, "INV-4", SaleStatus::Pending, &[(&kaos.id, 4)]))
            .await
            .unwrap();
        let id = detail.sale.id.clone();

        sales.update_status(&id, SaleStatus::Delivered).await.unwrap();
        assert_eq!(testing::stock_of(&fx.office, &kaos.id).await, 6);
        assert_eq!(testing::balance_of(&fx.office, &fx.store.id).await, 210_000);

        sales.update_status(&id, SaleStatus::Returned).await.unwrap();
        assert_eq!(testing::stock_of(&fx.office, &kaos.id).await, 10);
        assert_eq!(testing::balance_of(&fx.office, &fx.store.id).await, 0);

        // Re-shipping a returned order takes stock out again
        sales.update_status(&id, SaleStatus::Shipped).await.unwrap();
        assert_eq!(testing::stock_of(&fx.office, &kaos.id).await, 6);
    }

    #[tokio::test]
    async fn test_cancel_from_shipped_restores_each_line() {
        let fx = testing::fixture().await;
        let a = testing::variant(&fx.office, "A-1", 5).await;
        let b = testing::variant(&fx.office, "B-1", 5).await;
        let sales = fx.office.sales();

        let detail = sales
            .create_sale(order(&fx, "INV-5", SaleStatus::Shipped, &[(&a.id, 2), (&b.id, 5)]))
            .await
            .unwrap();
        assert_eq!(testing::stock_of(&fx.office, &a.id).await, 3);
        assert_eq!(testing::stock_of(&fx.office, &b.id).await, 0);

        sales
            .update_status(&detail.sale.id, SaleStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(testing::stock_of(&fx.office, &a.id).await, 5);
        assert_eq!(testing::stock_of(&fx.office, &b.id).await, 5);
    }

    #[tokio::test]
    async fn test_same_status_is_noop() {
        let fx = testing::fixture().await;
        let kaos = testing::variant(&fx.office, "KOS-M", 10).await;
        let sales = fx.office.sales();

        let detail = sales
            .create_sale(order(&fx, "INV-6", SaleStatus::Shipped, &[(&kaos.id, 1)]))
            .await
            .unwrap();
        sales
            .update_status(&detail.sale.id, SaleStatus::Shipped)
            .await
            .unwrap();
        assert_eq!(testing::stock_of(&fx.office, &kaos.id).await, 9);
    }

    #[tokio::test]
    async fn test_missing_variant_is_skipped() {
        let fx = testing::fixture().await;
        let kept = testing::variant(&fx.office, "KEEP-1", 10).await;
        let gone = testing::variant(&fx.office, "GONE-1", 10).await;
        let sales = fx.office.sales();

        let detail = sales
            .create_sale(order(&fx, "INV-7", SaleStatus::Pending, &[(&kept.id, 1), (&gone.id, 1)]))
            .await
            .unwrap();
        fx.office
            .database()
            .products()
            .delete_variant(&gone.id)
            .await
            .unwrap();

        sales
            .update_status(&detail.sale.id, SaleStatus::Shipped)
            .await
            .unwrap();
        assert_eq!(testing::stock_of(&fx.office, &kept.id).await, 9);

        let ledger = fx
            .office
            .database()
            .stock_movements()
            .list_for_reference(ReferenceType::Sale, &detail.sale.id)
            .await
            .unwrap();
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_shipped_restores_stock() {
        let fx = testing::fixture().await;
        let kaos = testing::variant(&fx.office, "KOS-M", 8).await;
        let sales = fx.office.sales();

        let detail = sales
            .create_sale(order(&fx, "INV-8", SaleStatus::Pending, &[(&kaos.id, 3)]))
            .await
            .unwrap();
        sales
            .update_status(&detail.sale.id, SaleStatus::Shipped)
            .await
            .unwrap();
        assert_eq!(testing::stock_of(&fx.office, &kaos.id).await, 5);

        sales.delete_sale(&detail.sale.id).await.unwrap();

        assert_eq!(testing::stock_of(&fx.office, &kaos.id).await, 8);
        let err = sales.get_sale(&detail.sale.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let restocked = fx
            .office
            .database()
            .stock_movements()
            .list(&MovementFilter {
                variant_id: Some(kaos.id.clone()),
                movement_type: Some(MovementType::In),
                range: None,
            })
            .await
            .unwrap();
        assert_eq!(restocked.len(), 1);
        assert_eq!(restocked[0].notes.as_deref(), Some("sale deleted"));
    }

    #[tokio::test]
    async fn test_delete_delivered_takes_back_credit() {
        let fx = testing::fixture().await;
        let kaos = testing::variant(&fx.office, "KOS-M", 8).await;
        let sales = fx.office.sales();

        let detail = sales
            .create_sale(order(&fx, "INV-9", SaleStatus::Delivered, &[(&kaos.id, 1)]))
            .await
            .unwrap();
        assert_eq!(testing::balance_of(&fx.office, &fx.store.id).await, 60_000);

        sales.delete_sale(&detail.sale.id).await.unwrap();
        assert_eq!(testing::balance_of(&fx.office, &fx.store.id).await, 0);
        assert_eq!(testing::stock_of(&fx.office, &kaos.id).await, 8);
    }

    #[tokio::test]
    async fn test_low_stock_notification_after_ship() {
        let fx = testing::fixture().await;
        let kaos = testing::variant(&fx.office, "KOS-M", 6).await;
        let sales = fx.office.sales();
        let mut rx = fx.office.notifications().subscribe();

        sales
            .create_sale(order(&fx, "INV-10", SaleStatus::Shipped, &[(&kaos.id, 2)]))
            .await
            .unwrap();

        let alert = rx.recv().await.unwrap();
        assert_eq!(alert.kind, NotificationKind::LowStock);
        assert_eq!(alert.reference_id.as_deref(), Some(kaos.id.as_str()));
    }

    #[tokio::test]
    async fn test_stale_status_change_is_rejected() {
        let fx = testing::fixture().await;
        let kaos = testing::variant(&fx.office, "KOS-M", 10).await;
        let sales = fx.office.sales();

        let detail = sales
            .create_sale(order(&fx, "INV-15", SaleStatus::Pending, &[(&kaos.id, 2)]))
            .await
            .unwrap();
        let id = detail.sale.id.clone();

        sales
            .update_status_from(&id, SaleStatus::Pending, SaleStatus::Shipped)
            .await
            .unwrap();

        // Second writer still thinks the order is pending
        let err = sales
            .update_status_from(&id, SaleStatus::Pending, SaleStatus::Cancelled)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);

        let err = sales
            .update_status_from(&id, SaleStatus::Pending, SaleStatus::Shipped)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);

        assert_eq!(sales.get_sale(&id).await.unwrap().sale.status, SaleStatus::Shipped);
        assert_eq!(testing::stock_of(&fx.office, &kaos.id).await, 8);
        assert_eq!(
            fx.office
                .database()
                .stock_movements()
                .list_for_reference(ReferenceType::Sale, &id)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_racing_status_changes_apply_once() {
        let fx = testing::fixture().await;
        let kaos = testing::variant(&fx.office, "KOS-M", 10).await;
        let sales = fx.office.sales();

        let detail = sales
            .create_sale(order(&fx, "INV-16", SaleStatus::Pending, &[(&kaos.id, 3)]))
            .await
            .unwrap();
        let id = detail.sale.id.as_str();

        let (first, second) = tokio::join!(
            sales.update_status_from(id, SaleStatus::Pending, SaleStatus::Delivered),
            sales.update_status_from(id, SaleStatus::Pending, SaleStatus::Delivered),
        );

        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        let rejected = outcomes.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert_eq!(rejected.code, ErrorCode::BusinessLogic);

        assert_eq!(testing::stock_of(&fx.office, &kaos.id).await, 7);
        assert_eq!(testing::balance_of(&fx.office, &fx.store.id).await, 160_000);
    }

    #[tokio::test]
    async fn test_overflowing_price_is_rejected() {
        let fx = testing::fixture().await;
        let kaos = testing::variant(&fx.office, "KOS-M", 10).await;
        let sales = fx.office.sales();

        let mut huge = order(&fx, "INV-17", SaleStatus::Pending, &[(&kaos.id, 3)]);
        huge.items[0].unit_price = Some(i64::MAX / 2);
        let err = sales.create_sale(huge).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        // Each line fits, the subtotal plus shipping does not
        let mut edge = order(&fx, "INV-18", SaleStatus::Pending, &[(&kaos.id, 1)]);
        edge.items[0].unit_price = Some(i64::MAX);
        let err = sales.create_sale(edge).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        assert!(sales.list_sales(&SaleFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_validation_rejects_bad_orders() {
        let fx = testing::fixture().await;
        let kaos = testing::variant(&fx.office, "KOS-M", 6).await;
        let sales = fx.office.sales();

        let empty = order(&fx, "INV-11", SaleStatus::Pending, &[]);
        assert_eq!(
            sales.create_sale(empty).await.unwrap_err().code,
            ErrorCode::ValidationError
        );

        let zero = order(&fx, "INV-12", SaleStatus::Pending, &[(&kaos.id, 0)]);
        assert_eq!(
            sales.create_sale(zero).await.unwrap_err().code,
            ErrorCode::ValidationError
        );

        let mut discounted = order(&fx, "INV-13", SaleStatus::Pending, &[(&kaos.id, 1)]);
        discounted.discount = 1_000_000;
        assert_eq!(
            sales.create_sale(discounted).await.unwrap_err().code,
            ErrorCode::ValidationError
        );

        let unknown = order(&fx, "INV-14", SaleStatus::Pending, &[(&generate_id(), 1)]);
        assert_eq!(
            sales.create_sale(unknown).await.unwrap_err().code,
            ErrorCode::NotFound
        );
    }
}
