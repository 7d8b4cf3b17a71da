//! # Sale Totals
//!
//! Order math: line totals, subtotal and the final total
//! `subtotal + shipping - discount`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

/// Quantity and unit price of a single order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAmount {
    pub quantity: i64,
    pub unit_price: Money,
}

impl LineAmount {
    pub fn new(quantity: i64, unit_price: Money) -> Self {
        LineAmount {
            quantity,
            unit_price,
        }
    }

    /// `unit_price × quantity`.
    ///
    /// ## Errors
    /// `TooLarge` when the product does not fit in an `i64`.
    pub fn line_total(&self) -> CoreResult<Money> {
        self.unit_price
            .multiply_quantity(self.quantity)
            .ok_or_else(|| too_large("line_total"))
    }
}

/// Sums line totals, rejecting a sum that overflows.
pub fn sum_line_totals(lines: &[LineAmount]) -> CoreResult<Money> {
    lines.iter().try_fold(Money::zero(), |acc, line| {
        acc.checked_add(line.line_total()?)
            .ok_or_else(|| too_large("subtotal"))
    })
}

fn too_large(field: &str) -> CoreError {
    ValidationError::TooLarge {
        field: field.to_string(),
    }
    .into()
}

/// Computed totals of a sales order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub discount: Money,
    pub total: Money,
}

impl SaleTotals {
    /// Computes totals for an order.
    ///
    /// ## Errors
    /// - negative shipping or discount
    /// - a discount larger than subtotal plus shipping
    ///
    /// ## Example
    /// ```rust
    /// use tokodash_core::sale::{LineAmount, SaleTotals};
    /// use tokodash_core::Money;
    ///
    /// let lines = [
    ///     LineAmount::new(2, Money::from_amount(50_000)),
    ///     LineAmount::new(1, Money::from_amount(25_000)),
    /// ];
    /// let totals = SaleTotals::compute(
    ///     &lines,
    ///     Money::from_amount(10_000),
    ///     Money::from_amount(5_000),
    /// )
    /// .unwrap();
    /// assert_eq!(totals.subtotal.amount(), 125_000);
    /// assert_eq!(totals.total.amount(), 130_000);
    /// ```
    pub fn compute(lines: &[LineAmount], shipping: Money, discount: Money) -> CoreResult<Self> {
        if shipping.is_negative() {
            return Err(ValidationError::Negative {
                field: "shipping_cost".to_string(),
            }
            .into());
        }
        if discount.is_negative() {
            return Err(ValidationError::Negative {
                field: "discount".to_string(),
            }
            .into());
        }

        let subtotal = sum_line_totals(lines)?;
        let gross = subtotal
            .checked_add(shipping)
            .ok_or_else(|| too_large("total"))?;

        if discount > gross {
            return Err(CoreError::DiscountTooLarge {
                discount: discount.amount(),
                gross: gross.amount(),
            });
        }

        Ok(SaleTotals {
            subtotal,
            shipping_cost: shipping,
            discount,
            total: gross - discount,
        })
    }
}
