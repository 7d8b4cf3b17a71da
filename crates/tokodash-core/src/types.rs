//! # Domain Types
//!
//! Entity types shared by every layer of TokoDash. One struct per table.
//!
//! ## Entity Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Platform ◄── Store ◄── Sale ◄── SaleItem ──► ProductVariant ◄── Product│
//! │                 │                                  ▲                    │
//! │                 │                                  │                    │
//! │                 ├── Settlement ──► Bank       StockMovement             │
//! │                 │                                  │                    │
//! │                 ├── Expense / Income ──► Category  │                    │
//! │                 │                                  │                    │
//! │  Supplier ◄── Purchase ◄── PurchaseItem ───────────┘                    │
//! │                                                                         │
//! │  Asset, UserSettings, Notification (tenant-level)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every row has a UUID v4 `id` and a `tenant_id`. Amounts are stored as
//! raw `i64` in the smallest currency unit with [`Money`] accessors.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Date Range
// =============================================================================

/// An inclusive range of business dates used by reports and list filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "String")]
    pub start: NaiveDate,
    #[ts(as = "String")]
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(DateRange { start, end })
    }

    /// A range covering a single day.
    pub fn single_day(day: NaiveDate) -> Self {
        DateRange { start: day, end: day }
    }

    /// Checks whether `day` falls inside the range (both ends inclusive).
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

// =============================================================================
// Platform & Store
// =============================================================================

/// A sales channel (marketplace, social commerce, offline).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Platform {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A storefront on a platform.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Store {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub platform_id: Option<String>,

    /// Running balance of validated revenue (credited when an order is
    /// delivered, debited by settlements and reversals).
    pub saldo_dashboard: i64,

    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Store {
    /// Returns the dashboard balance as Money.
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_amount(self.saldo_dashboard)
    }
}

// =============================================================================
// Product & Variant
// =============================================================================

/// A catalog product. Stock lives on its variants.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A sellable variant (size, colour) carrying price, cost and stock.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductVariant {
    pub id: String,
    pub tenant_id: String,
    pub product_id: String,
    pub sku: String,
    pub name: String,

    /// Selling price.
    pub price: i64,

    /// Cost price (HPP per unit).
    pub cost_price: i64,

    /// On-hand quantity. Never negative.
    pub stock_quantity: i64,

    /// Low-stock threshold for this variant; tenant default when absent.
    pub min_stock: Option<i64>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl ProductVariant {
    /// Returns the selling price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_amount(self.price)
    }

    /// Returns the unit cost as Money.
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_amount(self.cost_price)
    }

    /// Checks whether on-hand stock is at or below the threshold.
    pub fn is_low_stock(&self, default_threshold: i64) -> bool {
        self.stock_quantity <= self.min_stock.unwrap_or(default_threshold)
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// Fulfilment status of a sales order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Order received, not yet worked on.
    Pending,
    /// Being packed.
    Processing,
    /// Handed to the courier. Stock has left the warehouse.
    Shipped,
    /// Received by the customer. Revenue counts from here.
    Delivered,
    /// Cancelled by buyer or seller.
    Cancelled,
    /// Sent back by the customer.
    Returned,
}

impl SaleStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [SaleStatus; 6] = [
        SaleStatus::Pending,
        SaleStatus::Processing,
        SaleStatus::Shipped,
        SaleStatus::Delivered,
        SaleStatus::Cancelled,
        SaleStatus::Returned,
    ];

    /// Lowercase name as stored in the database.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Processing => "processing",
            SaleStatus::Shipped => "shipped",
            SaleStatus::Delivered => "delivered",
            SaleStatus::Cancelled => "cancelled",
            SaleStatus::Returned => "returned",
        }
    }

    /// Whether stock for this order has physically left (shipped/delivered).
    pub const fn is_stock_committed(&self) -> bool {
        matches!(self, SaleStatus::Shipped | SaleStatus::Delivered)
    }
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Pending
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaleStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SaleStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "status".to_string(),
                reason: format!("unknown sale status '{}'", s),
            })
    }
}

// =============================================================================
// Sale & Sale Item
// =============================================================================

/// A sales order from one store.
///
/// Invariant: `total = subtotal + shipping_cost - discount`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub tenant_id: String,
    pub store_id: String,
    pub platform_id: Option<String>,

    /// Marketplace order number.
    pub order_number: String,
    pub customer_name: Option<String>,
    pub status: SaleStatus,
    #[ts(as = "String")]
    pub sale_date: NaiveDate,
    pub subtotal: i64,
    pub shipping_cost: i64,
    pub discount: i64,
    pub total: i64,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the order total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_amount(self.total)
    }
}

/// A line of a sales order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub variant_id: String,
    pub quantity: i64,
    pub unit_price: i64,
    /// `unit_price × quantity`.
    pub line_total: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A sale together with its lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleDetail {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

// =============================================================================
// Purchasing
// =============================================================================

/// A supplier goods are bought from.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of a purchase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    /// Ordered from the supplier, not in the warehouse yet.
    Ordered,
    /// Goods arrived; stock has been added.
    Received,
    /// Cancelled; excluded from cost of goods.
    Cancelled,
}

impl PurchaseStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Ordered => "ordered",
            PurchaseStatus::Received => "received",
            PurchaseStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for PurchaseStatus {
    fn default() -> Self {
        PurchaseStatus::Ordered
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A purchase order. Its total is the cost-of-goods proxy in the P&L.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Purchase {
    pub id: String,
    pub tenant_id: String,
    pub supplier_id: Option<String>,
    pub store_id: Option<String>,
    pub purchase_number: String,
    #[ts(as = "String")]
    pub purchase_date: NaiveDate,
    pub status: PurchaseStatus,
    pub total: i64,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A line of a purchase order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseItem {
    pub id: String,
    pub purchase_id: String,
    pub variant_id: String,
    pub quantity: i64,
    pub unit_cost: i64,
    pub line_total: i64,
}

/// A purchase together with its lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseDetail {
    pub purchase: Purchase,
    pub items: Vec<PurchaseItem>,
}

// =============================================================================
// Finance
// =============================================================================

/// Whether a category classifies expenses or incomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Expense,
    Income,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub kind: CategoryKind,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A bank account settlements are paid into.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Bank {
    pub id: String,
    pub tenant_id: String,
    pub bank_name: String,
    pub account_number: String,
    pub account_holder: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// An operating expense.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Expense {
    pub id: String,
    pub tenant_id: String,
    pub store_id: Option<String>,
    pub category_id: Option<String>,
    pub bank_id: Option<String>,
    pub amount: i64,
    #[ts(as = "String")]
    pub expense_date: NaiveDate,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Income outside of sales (cashback, affiliate payouts, ...).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Income {
    pub id: String,
    pub tenant_id: String,
    pub store_id: Option<String>,
    pub category_id: Option<String>,
    pub bank_id: Option<String>,
    pub amount: i64,
    #[ts(as = "String")]
    pub income_date: NaiveDate,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A payout from a store's platform balance to a bank account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Settlement {
    pub id: String,
    pub tenant_id: String,
    pub store_id: String,
    pub bank_id: Option<String>,
    pub amount: i64,
    #[ts(as = "String")]
    pub settlement_date: NaiveDate,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A fixed asset owned by the business.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Asset {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub value: i64,
    #[ts(as = "String")]
    pub acquired_date: NaiveDate,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Stock Movement
// =============================================================================

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Stock added (return, cancellation, purchase received).
    In,
    /// Stock removed (order shipped).
    Out,
    /// Manual correction after a stock count.
    Adjustment,
}

/// What caused a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    Sale,
    Purchase,
    Adjustment,
}

/// An auditable inventory ledger entry.
///
/// `quantity` is a magnitude for `in`/`out` and a signed delta for
/// `adjustment`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockMovement {
    pub id: String,
    pub tenant_id: String,
    pub variant_id: String,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub reference_type: Option<ReferenceType>,
    pub reference_id: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    /// Net effect of the entry on on-hand stock.
    pub fn signed_quantity(&self) -> i64 {
        match self.movement_type {
            MovementType::In => self.quantity,
            MovementType::Out => -self.quantity,
            MovementType::Adjustment => self.quantity,
        }
    }
}

// =============================================================================
// Settings & Notifications
// =============================================================================

/// Per-user dashboard preferences.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct UserSettings {
    pub tenant_id: String,
    pub user_id: String,
    pub low_stock_threshold: i64,
    pub notifications_enabled: bool,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    LowStock,
    SaleStatus,
    Settlement,
}

/// A message pushed to every dashboard session of the tenant.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Notification {
    pub id: String,
    pub tenant_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub reference_id: Option<String>,
    pub is_read: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Query Filters
// =============================================================================

/// Filter for sale lists. Absent fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleFilter {
    pub range: Option<DateRange>,
    pub store_id: Option<String>,
    pub status: Option<SaleStatus>,
}

/// Filter for the stock ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MovementFilter {
    pub variant_id: Option<String>,
    pub movement_type: Option<MovementType>,
    /// Matched against the calendar day of `created_at` (UTC).
    pub range: Option<DateRange>,
}

/// Filter for purchase lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseFilter {
    pub range: Option<DateRange>,
    pub supplier_id: Option<String>,
    pub status: Option<PurchaseStatus>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_date_range() {
        let range = DateRange::new(day("2026-01-01"), day("2026-01-31")).unwrap();
        assert!(range.contains(day("2026-01-01")));
        assert!(range.contains(day("2026-01-31")));
        assert!(!range.contains(day("2026-02-01")));

        assert!(DateRange::new(day("2026-02-01"), day("2026-01-01")).is_err());
    }

    #[test]
    fn test_sale_status_parsing() {
        assert_eq!("shipped".parse::<SaleStatus>().unwrap(), SaleStatus::Shipped);
        assert_eq!(" Delivered ".parse::<SaleStatus>().unwrap(), SaleStatus::Delivered);
        assert!("lost".parse::<SaleStatus>().is_err());
        assert_eq!(SaleStatus::default(), SaleStatus::Pending);
    }

    #[test]
    fn test_stock_committed_statuses() {
        let committed: Vec<_> = SaleStatus::ALL
            .into_iter()
            .filter(SaleStatus::is_stock_committed)
            .collect();
        assert_eq!(committed, vec![SaleStatus::Shipped, SaleStatus::Delivered]);
    }

    #[test]
    fn test_movement_signed_quantity() {
        let mut movement = StockMovement {
            id: "m1".to_string(),
            tenant_id: "t".to_string(),
            variant_id: "v".to_string(),
            movement_type: MovementType::Out,
            quantity: 3,
            reference_type: Some(ReferenceType::Sale),
            reference_id: Some("s1".to_string()),
            notes: None,
            created_at: Utc::now(),
        };
        assert_eq!(movement.signed_quantity(), -3);

        movement.movement_type = MovementType::Adjustment;
        movement.quantity = -2;
        assert_eq!(movement.signed_quantity(), -2);
    }
}
