//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Summing a month of marketplace orders as floats drifts:                │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  OUR SOLUTION: integer amounts in the smallest currency unit            │
//! │    Rupiah has no minor unit in practice, so 1 = Rp1                     │
//! │    Every sum in the P&L is exact                                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tokodash_core::money::Money;
//!
//! let price = Money::from_amount(125_000);
//! let line = price * 2;
//! assert_eq!(line.amount(), 250_000);
//! assert_eq!(line.to_string(), "Rp250.000");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: negative values for net losses and balance debits
/// - **Single field tuple struct**: zero-cost abstraction over i64
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from an amount in the smallest unit.
    #[inline]
    pub const fn from_amount(amount: i64) -> Self {
        Money(amount)
    }

    /// Returns the raw amount.
    #[inline]
    pub const fn amount(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies a unit price by a quantity, `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use tokodash_core::money::Money;
    ///
    /// let unit_price = Money::from_amount(49_900);
    /// assert_eq!(unit_price.multiply_quantity(3), Some(Money::from_amount(149_700)));
    /// assert_eq!(Money::from_amount(i64::MAX).multiply_quantity(2), None);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(amount) => Some(Money(amount)),
            None => None,
        }
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(amount) => Some(Money(amount)),
            None => None,
        }
    }

    /// Expresses `self` as a share of `whole`, in basis points.
    ///
    /// Returns 0 when `whole` is zero. Rounds half away from zero.
    ///
    /// ## Example
    /// ```rust
    /// use tokodash_core::money::Money;
    ///
    /// let profit = Money::from_amount(250);
    /// let revenue = Money::from_amount(1_000);
    /// assert_eq!(profit.ratio_bps(revenue), 2_500); // 25.00%
    /// assert_eq!(profit.ratio_bps(Money::zero()), 0);
    /// ```
    pub fn ratio_bps(&self, whole: Money) -> i64 {
        if whole.is_zero() {
            return 0;
        }

        // i128 keeps large period totals from overflowing
        let scaled = self.0 as i128 * 10_000;
        let whole = whole.0 as i128;
        let half = whole.abs() / 2;
        let rounded = if (scaled >= 0) == (whole > 0) {
            (scaled.abs() + half) / whole.abs()
        } else {
            -((scaled.abs() + half) / whole.abs())
        };
        // A large loss on tiny revenue can exceed i64 basis points
        i64::try_from(rounded).unwrap_or(if rounded < 0 { i64::MIN } else { i64::MAX })
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Rupiah formatting with dot thousand separators: `Rp1.250.000`.
///
/// ## Note
/// This is for logs and debugging. The dashboard formats for display.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.0.unsigned_abs().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        write!(f, "{}Rp{}", sign, grouped)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Plain `i64` addition. Order math on user input goes through
/// [`Money::checked_add`] instead.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_amount(1_250_000).to_string(), "Rp1.250.000");
        assert_eq!(Money::from_amount(500).to_string(), "Rp500");
        assert_eq!(Money::from_amount(1_000).to_string(), "Rp1.000");
        assert_eq!(Money::from_amount(-75_500).to_string(), "-Rp75.500");
        assert_eq!(Money::zero().to_string(), "Rp0");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_amount(1_000);
        let b = Money::from_amount(400);

        assert_eq!((a + b).amount(), 1_400);
        assert_eq!((a - b).amount(), 600);
        assert_eq!((a * 3).amount(), 3_000);
        assert_eq!((-a).amount(), -1_000);
    }

    #[test]
    fn test_sum() {
        let values = vec![
            Money::from_amount(100),
            Money::from_amount(250),
            Money::from_amount(-50),
        ];
        let by_ref: Money = values.iter().sum();
        let by_value: Money = values.into_iter().sum();
        assert_eq!(by_ref.amount(), 300);
        assert_eq!(by_value, by_ref);
    }

    #[test]
    fn test_ratio_bps_rounding() {
        // 1/3 = 33.33%
        assert_eq!(Money::from_amount(1).ratio_bps(Money::from_amount(3)), 3_333);
        // 2/3 = 66.67%
        assert_eq!(Money::from_amount(2).ratio_bps(Money::from_amount(3)), 6_667);
        // negative share: -1/8 = -12.50%
        assert_eq!(Money::from_amount(-1).ratio_bps(Money::from_amount(8)), -1_250);
    }

    #[test]
    fn test_ratio_bps_zero_whole() {
        assert_eq!(Money::from_amount(500).ratio_bps(Money::zero()), 0);
        assert_eq!(Money::from_amount(-500).ratio_bps(Money::zero()), 0);
    }

    #[test]
    fn test_checked_math() {
        let price = Money::from_amount(i64::MAX / 2);
        assert_eq!(price.multiply_quantity(2), Some(Money::from_amount(i64::MAX - 1)));
        assert_eq!(price.multiply_quantity(3), None);

        assert_eq!(
            Money::from_amount(1).checked_add(Money::from_amount(2)),
            Some(Money::from_amount(3))
        );
        assert_eq!(Money::from_amount(i64::MAX).checked_add(Money::from_amount(1)), None);
    }

    #[test]
    fn test_ratio_bps_saturates() {
        let loss = Money::from_amount(-(i64::MAX / 2));
        assert_eq!(loss.ratio_bps(Money::from_amount(1)), i64::MIN);
        assert_eq!((-loss).ratio_bps(Money::from_amount(1)), i64::MAX);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_amount(-100);
        assert!(negative.is_negative());
        assert_eq!(negative.abs().amount(), 100);
    }
}
