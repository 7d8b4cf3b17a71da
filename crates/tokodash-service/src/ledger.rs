//! # Stock Ledger Steps
//!
//! The per-line step shared by sales and purchases: apply a guarded stock
//! delta and append the matching `stock_movements` row, both on the
//! caller's transaction.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  move_stock_in(direction, variant, qty)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE stock = stock ± qty WHERE stock ± qty >= 0                      │
//! │       │                                                                 │
//! │       ├── Applied      → INSERT stock_movements, Ok(Some(moved))        │
//! │       ├── Missing      → warn!, Ok(None)  (line skipped)                │
//! │       └── Insufficient → Err(INSUFFICIENT_STOCK), caller drops the tx   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{debug, warn};

use tokodash_core::stock::StockDirection;
use tokodash_core::{CoreError, NotificationKind, ReferenceType, StockMovement};
use tokodash_db::{repository::generate_id, Database, StockChange};

use crate::error::ApiResult;
use crate::notify::NotificationHub;

/// Where a movement came from.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Reference<'a> {
    pub kind: ReferenceType,
    pub id: &'a str,
}

/// A line whose stock actually changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MovedStock {
    pub variant_id: String,
    pub direction: StockDirection,
    pub new_quantity: i64,
}

/// Moves `quantity` units of one variant and records the ledger row.
///
/// ## Returns
/// * `Ok(None)` - nothing to move, or the variant no longer exists
/// * `Err(INSUFFICIENT_STOCK)` - an outgoing move would go negative
pub(crate) async fn move_stock_in(
    db: &Database,
    conn: &mut SqliteConnection,
    direction: StockDirection,
    variant_id: &str,
    quantity: i64,
    reference: Reference<'_>,
    notes: &str,
) -> ApiResult<Option<MovedStock>> {
    let Some(movement_type) = direction.movement_type() else {
        return Ok(None);
    };

    let delta = direction.sign() * quantity;
    match db.products().apply_stock_delta_in(conn, variant_id, delta).await? {
        StockChange::Applied { sku, new_quantity } => {
            debug!(sku = %sku, delta = delta, new_quantity = new_quantity, "Stock moved");

            let movement = StockMovement {
                id: generate_id(),
                tenant_id: db.tenant_id().to_string(),
                variant_id: variant_id.to_string(),
                movement_type,
                quantity,
                reference_type: Some(reference.kind),
                reference_id: Some(reference.id.to_string()),
                notes: Some(notes.to_string()),
                created_at: Utc::now(),
            };
            db.stock_movements().insert_in(conn, &movement).await?;

            Ok(Some(MovedStock {
                variant_id: variant_id.to_string(),
                direction,
                new_quantity,
            }))
        }
        StockChange::Missing => {
            warn!(
                variant_id = %variant_id,
                reference_id = %reference.id,
                "Variant no longer exists, skipping stock movement"
            );
            Ok(None)
        }
        StockChange::Insufficient { sku, available } => Err(CoreError::InsufficientStock {
            sku,
            available,
            requested: quantity,
        }
        .into()),
    }
}

/// Emits a `low_stock` notification for every outgoing move that left the
/// variant at or below its threshold. Runs after commit; failures are
/// logged.
pub(crate) async fn alert_low_stock(db: &Database, hub: &NotificationHub, moved: &[MovedStock]) {
    let outgoing: Vec<&MovedStock> = moved
        .iter()
        .filter(|m| m.direction == StockDirection::Out)
        .collect();
    if outgoing.is_empty() {
        return;
    }

    let threshold = match hub.low_stock_threshold().await {
        Ok(threshold) => threshold,
        Err(e) => {
            warn!(error = %e, "Could not read low-stock threshold");
            return;
        }
    };

    for m in outgoing {
        let variant = match db.products().get_variant(&m.variant_id).await {
            Ok(Some(variant)) => variant,
            Ok(None) => continue,
            Err(e) => {
                warn!(variant_id = %m.variant_id, error = %e, "Could not reload variant");
                continue;
            }
        };

        if variant.is_low_stock(threshold) {
            hub.notify_logged(
                NotificationKind::LowStock,
                format!("Low stock: {}", variant.sku),
                format!("{} {} has {} left", variant.sku, variant.name, variant.stock_quantity),
                Some(&variant.id),
            )
            .await;
        }
    }
}
