//! # tokodash-core: Pure Business Logic for TokoDash
//!
//! This crate holds every business rule of the back office as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        TokoDash Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Dashboard front end (browser)                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tokodash-service                             │   │
//! │  │    SaleService, StockService, ReportService, DashboardService   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tokodash-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   stock   │  │profit_loss│  │   │
//! │  │   │ Sale      │  │   Money   │  │transition │  │ P&L report│  │   │
//! │  │   │ Variant   │  │  Rp fmt   │  │  table    │  │  margins  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    tokodash-db (SQLite)                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entity types (Sale, ProductVariant, Settlement, etc.)
//! - [`money`] - Money type with integer arithmetic
//! - [`sale`] - Sale total calculation
//! - [`stock`] - Sale status transition table (stock and balance effects)
//! - [`profit_loss`] - Profit & loss aggregation
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use tokodash_core::stock::{transition_effect, BalanceEffect, StockDirection};
//! use tokodash_core::SaleStatus;
//!
//! let effect = transition_effect(SaleStatus::Processing, SaleStatus::Delivered);
//! assert_eq!(effect.stock, StockDirection::Out);
//! assert_eq!(effect.balance, BalanceEffect::Credit);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod profit_loss;
pub mod sale;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Tenant used when nothing else is configured (development, seed data).
pub const DEFAULT_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";

/// User id of the tenant-wide settings row.
pub const DEFAULT_USER_ID: &str = "default";

/// Low-stock threshold applied when a variant has no threshold of its own.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// Maximum quantity of a single line item.
///
/// Catches typing 1000 instead of 10 on the order form.
pub const MAX_LINE_QUANTITY: i64 = 100_000;

/// Group label for revenue without a platform.
pub const UNASSIGNED_PLATFORM: &str = "Unassigned";

/// Group label for expenses without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";
