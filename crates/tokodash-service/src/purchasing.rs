//! # Purchase Service
//!
//! Supplier orders. Receiving an order adds its lines to stock; cancelling
//! a received order takes them back out.
//!
//! ```text
//!   ordered ──receive──► received
//!      │                    │
//!      └──cancel──┐  ┌──cancel (stock out, checked)
//!                 ▼  ▼
//!               cancelled
//! ```

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use sqlx::SqliteConnection;
use tracing::{info, instrument};
use ts_rs::TS;

use tokodash_core::sale::{sum_line_totals, LineAmount};
use tokodash_core::stock::StockDirection;
use tokodash_core::validation::{
    validate_name, validate_non_negative_amount, validate_not_empty, validate_notes,
    validate_quantity, validate_uuid,
};
use tokodash_core::{
    CoreError, Money, Purchase, PurchaseDetail, PurchaseFilter, PurchaseItem, PurchaseStatus,
    ReferenceType, Supplier,
};
use tokodash_db::{repository::generate_id, Database, DbError, ReferenceKind};

use crate::error::{ApiError, ApiResult};
use crate::ledger::{alert_low_stock, move_stock_in, MovedStock, Reference};
use crate::notify::NotificationHub;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct NewPurchaseItem {
    pub variant_id: String,
    pub quantity: i64,
    /// Defaults to the variant's cost price.
    pub unit_cost: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct NewPurchase {
    pub supplier_id: Option<String>,
    pub store_id: Option<String>,
    pub purchase_number: String,
    #[ts(as = "String")]
    pub purchase_date: NaiveDate,
    /// `ordered` (default) or `received`.
    pub status: Option<PurchaseStatus>,
    pub notes: Option<String>,
    pub items: Vec<NewPurchaseItem>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct NewSupplier {
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Clone)]
pub struct PurchaseService {
    db: Database,
    hub: NotificationHub,
}

impl PurchaseService {
    pub fn new(db: Database, hub: NotificationHub) -> Self {
        PurchaseService { db, hub }
    }

    // =========================================================================
    // Suppliers
    // =========================================================================

    pub async fn create_supplier(&self, new: NewSupplier) -> ApiResult<Supplier> {
        validate_name("name", &new.name)?;

        let supplier = Supplier {
            id: generate_id(),
            tenant_id: self.db.tenant_id().to_string(),
            name: new.name.trim().to_string(),
            phone: new.phone,
            address: new.address,
            created_at: Utc::now(),
        };
        self.db.purchases().insert_supplier(&supplier).await?;

        Ok(supplier)
    }

    pub async fn list_suppliers(&self) -> ApiResult<Vec<Supplier>> {
        Ok(self.db.purchases().list_suppliers().await?)
    }

    // =========================================================================
    // Purchases
    // =========================================================================

    /// Records a purchase order. Created as `received`, its lines go into
    /// stock in the same transaction.
    #[instrument(skip(self, new), fields(purchase_number = %new.purchase_number))]
    pub async fn create_purchase(&self, new: NewPurchase) -> ApiResult<PurchaseDetail> {
        validate_name("purchase_number", &new.purchase_number)?;
        validate_notes(new.notes.as_deref())?;
        if let Some(supplier_id) = &new.supplier_id {
            validate_uuid("supplier_id", supplier_id)?;
        }
        if let Some(store_id) = &new.store_id {
            validate_uuid("store_id", store_id)?;
        }
        validate_not_empty("items", &new.items)?;
        for item in &new.items {
            validate_quantity(item.quantity)?;
            if let Some(cost) = item.unit_cost {
                validate_non_negative_amount("unit_cost", cost)?;
            }
        }

        let status = new.status.unwrap_or_default();
        if status == PurchaseStatus::Cancelled {
            return Err(ApiError::validation("a purchase cannot be created as cancelled"));
        }

        let purchase_id = generate_id();
        let mut tx = self.db.begin().await?;

        let references = self.db.references();
        if let Some(supplier_id) = &new.supplier_id {
            references
                .ensure_owned_in(&mut tx, ReferenceKind::Supplier, supplier_id)
                .await?;
        }
        if let Some(store_id) = &new.store_id {
            references
                .ensure_owned_in(&mut tx, ReferenceKind::Store, store_id)
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
                Money::from_amount(item.unit_cost.unwrap_or(variant.cost_price)),
            );
            items.push(PurchaseItem {
                id: generate_id(),
                purchase_id: purchase_id.clone(),
                variant_id: variant.id,
                quantity: line.quantity,
                unit_cost: line.unit_price.amount(),
                line_total: line.line_total()?.amount(),
            });
            lines.push(line);
        }

        let total = sum_line_totals(&lines)?.amount();
        let now = Utc::now();
        let purchase = Purchase {
            id: purchase_id,
            tenant_id: self.db.tenant_id().to_string(),
            supplier_id: new.supplier_id,
            store_id: new.store_id,
            purchase_number: new.purchase_number,
            purchase_date: new.purchase_date,
            status,
            total,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        };

        self.db.purchases().insert_in(&mut tx, &purchase).await?;
        for item in &items {
            self.db.purchases().insert_item_in(&mut tx, item).await?;
        }

        if status == PurchaseStatus::Received {
            let notes = format!("purchase {} received", purchase.purchase_number);
            self.move_lines_in(&mut tx, &purchase.id, &items, StockDirection::In, &notes)
                .await?;
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(purchase_id = %purchase.id, total = %Money::from_amount(total), status = %status, "Purchase created");
        Ok(PurchaseDetail { purchase, items })
    }

    pub async fn get_purchase(&self, id: &str) -> ApiResult<PurchaseDetail> {
        let purchase = self
            .db
            .purchases()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Purchase", id))?;
        let items = self.db.purchases().get_items(id).await?;

        Ok(PurchaseDetail { purchase, items })
    }

    pub async fn list_purchases(&self, filter: &PurchaseFilter) -> ApiResult<Vec<Purchase>> {
        Ok(self.db.purchases().list(filter).await?)
    }

    /// Marks an ordered purchase as received and adds its lines to stock.
    #[instrument(skip(self))]
    pub async fn receive_purchase(&self, id: &str) -> ApiResult<Purchase> {
        let mut tx = self.db.begin().await?;

        let mut purchase = self.load_in(&mut tx, id).await?;
        if purchase.status != PurchaseStatus::Ordered {
            return Err(invalid_status(&purchase));
        }

        let items = self.db.purchases().get_items_in(&mut tx, id).await?;
        self.db
            .purchases()
            .update_status_in(&mut tx, id, PurchaseStatus::Ordered, PurchaseStatus::Received)
            .await?;

        let notes = format!("purchase {} received", purchase.purchase_number);
        self.move_lines_in(&mut tx, id, &items, StockDirection::In, &notes)
            .await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(purchase_id = %id, lines = items.len(), "Purchase received");

        purchase.status = PurchaseStatus::Received;
        purchase.updated_at = Utc::now();
        Ok(purchase)
    }

    /// Cancels a purchase. A received one has its lines taken back out of
    /// stock, which fails with `INSUFFICIENT_STOCK` if they were already
    /// sold.
    #[instrument(skip(self))]
    pub async fn cancel_purchase(&self, id: &str) -> ApiResult<Purchase> {
        let mut tx = self.db.begin().await?;

        let mut purchase = self.load_in(&mut tx, id).await?;
        let old_status = purchase.status;
        if old_status == PurchaseStatus::Cancelled {
            return Err(invalid_status(&purchase));
        }

        self.db
            .purchases()
            .update_status_in(&mut tx, id, old_status, PurchaseStatus::Cancelled)
            .await?;

        let mut moved = Vec::new();
        if old_status == PurchaseStatus::Received {
            let items = self.db.purchases().get_items_in(&mut tx, id).await?;
            let notes = format!("purchase {} cancelled", purchase.purchase_number);
            moved = self
                .move_lines_in(&mut tx, id, &items, StockDirection::Out, &notes)
                .await?;
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(purchase_id = %id, from = %old_status, "Purchase cancelled");
        alert_low_stock(&self.db, &self.hub, &moved).await;

        purchase.status = PurchaseStatus::Cancelled;
        purchase.updated_at = Utc::now();
        Ok(purchase)
    }

    async fn load_in(&self, conn: &mut SqliteConnection, id: &str) -> ApiResult<Purchase> {
        self.db
            .purchases()
            .get_by_id_in(conn, id)
            .await?
            .ok_or_else(|| ApiError::not_found("Purchase", id))
    }

    async fn move_lines_in(
        &self,
        conn: &mut SqliteConnection,
        purchase_id: &str,
        items: &[PurchaseItem],
        direction: StockDirection,
        notes: &str,
    ) -> ApiResult<Vec<MovedStock>> {
        let reference = Reference {
            kind: ReferenceType::Purchase,
            id: purchase_id,
        };

        let mut moved = Vec::with_capacity(items.len());
        for item in items {
            if let Some(m) = move_stock_in(
                &self.db,
                conn,
                direction,
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

        Ok(moved)
    }
}

fn invalid_status(purchase: &Purchase) -> ApiError {
    CoreError::InvalidPurchaseStatus {
        purchase_id: purchase.id.clone(),
        current_status: purchase.status.to_string(),
    }
    .into()
}
