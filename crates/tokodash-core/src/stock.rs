//! # Stock Transition Table
//!
//! Decides what a sale status change does to inventory and to the store
//! balance. The database layer applies the effect; this module only decides.
//!
//! ## Transition Table
//! ```text
//! ┌──────────────────────────┬──────────────────────────┬───────────┐
//! │ old status               │ new status               │ stock     │
//! ├──────────────────────────┼──────────────────────────┼───────────┤
//! │ pending, processing      │ shipped, delivered       │ OUT       │
//! │ shipped, delivered       │ cancelled, returned      │ IN        │
//! │ cancelled, returned      │ shipped, delivered       │ OUT       │
//! │ anything else            │                          │ none      │
//! └──────────────────────────┴──────────────────────────┴───────────┘
//!
//! Balance (saldo dashboard):
//!   entering delivered  → CREDIT order total
//!   leaving delivered   → DEBIT order total
//! ```
//!
//! Note that shipped → delivered moves no stock (it already left) but does
//! credit the balance, and delivered → returned both restocks and debits.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{MovementType, SaleStatus};

/// Which way stock moves for every line of the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockDirection {
    None,
    /// Decrement on-hand stock by the ordered quantity.
    Out,
    /// Increment on-hand stock by the ordered quantity.
    In,
}

impl StockDirection {
    /// Ledger movement type for this direction, if any.
    pub fn movement_type(&self) -> Option<MovementType> {
        match self {
            StockDirection::None => None,
            StockDirection::Out => Some(MovementType::Out),
            StockDirection::In => Some(MovementType::In),
        }
    }

    /// Signed multiplier applied to a line quantity.
    pub fn sign(&self) -> i64 {
        match self {
            StockDirection::None => 0,
            StockDirection::Out => -1,
            StockDirection::In => 1,
        }
    }
}

/// What happens to the store's dashboard balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BalanceEffect {
    None,
    /// Add the order total.
    Credit,
    /// Subtract the order total.
    Debit,
}

impl BalanceEffect {
    /// Signed multiplier applied to the order total.
    pub fn sign(&self) -> i64 {
        match self {
            BalanceEffect::None => 0,
            BalanceEffect::Credit => 1,
            BalanceEffect::Debit => -1,
        }
    }
}

/// Combined effect of a status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransitionEffect {
    pub stock: StockDirection,
    pub balance: BalanceEffect,
}

impl TransitionEffect {
    pub const NONE: TransitionEffect = TransitionEffect {
        stock: StockDirection::None,
        balance: BalanceEffect::None,
    };

    /// True when the transition changes neither stock nor balance.
    pub fn is_noop(&self) -> bool {
        *self == TransitionEffect::NONE
    }
}

/// Computes the effect of moving a sale from `old` to `new`.
///
/// ## Example
/// ```rust
/// use tokodash_core::stock::{transition_effect, BalanceEffect, StockDirection};
/// use tokodash_core::SaleStatus;
///
/// let effect = transition_effect(SaleStatus::Delivered, SaleStatus::Returned);
/// assert_eq!(effect.stock, StockDirection::In);
/// assert_eq!(effect.balance, BalanceEffect::Debit);
/// ```
pub fn transition_effect(old: SaleStatus, new: SaleStatus) -> TransitionEffect {
    use SaleStatus::*;

    if old == new {
        return TransitionEffect::NONE;
    }

    let stock = match (old, new) {
        (Pending | Processing, Shipped | Delivered) => StockDirection::Out,
        (Shipped | Delivered, Cancelled | Returned) => StockDirection::In,
        (Cancelled | Returned, Shipped | Delivered) => StockDirection::Out,
        _ => StockDirection::None,
    };

    let balance = match (old, new) {
        (_, Delivered) => BalanceEffect::Credit,
        (Delivered, _) => BalanceEffect::Debit,
        _ => BalanceEffect::None,
    };

    TransitionEffect { stock, balance }
}

/// Effect of removing a sale that currently sits in `status`.
///
/// Deleting undoes whatever the sale's lifecycle applied: committed stock
/// comes back and a delivered order's credit is taken off the balance.
pub fn deletion_effect(status: SaleStatus) -> TransitionEffect {
    TransitionEffect {
        stock: if status.is_stock_committed() {
            StockDirection::In
        } else {
            StockDirection::None
        },
        balance: if status == SaleStatus::Delivered {
            BalanceEffect::Debit
        } else {
            BalanceEffect::None
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
