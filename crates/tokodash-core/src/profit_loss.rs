//! # Profit & Loss
//!
//! Aggregates one period of delivered revenue, purchases and expenses into
//! a profit & loss statement.
//!
//! ## Statement Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Revenue (delivered sales, by platform)           Rp12.500.000          │
//! │  - COGS (non-cancelled purchases)                 Rp 7.000.000          │
//! │  ─────────────────────────────────────────────────────────────          │
//! │  = Gross profit                                   Rp 5.500.000  44.00%  │
//! │  - Expenses (by category)                         Rp 1.500.000          │
//! │  ─────────────────────────────────────────────────────────────          │
//! │  = Net profit                                     Rp 4.000.000  32.00%  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is a pure fold over rows already in memory; the caller
//! fetches the whole period first.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::DateRange;
use crate::{UNASSIGNED_PLATFORM, UNCATEGORIZED};

// =============================================================================
// Inputs
// =============================================================================

/// A delivered sale's contribution to revenue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevenueEntry {
    pub platform: Option<String>,
    pub amount: Money,
}

/// An expense with its category name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseEntry {
    pub category: Option<String>,
    pub amount: Money,
}

// =============================================================================
// Report
// =============================================================================

/// Sum of one group (a platform or an expense category).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GroupTotal {
    pub name: String,
    pub amount: Money,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProfitLossReport {
    pub period: DateRange,

    pub revenue: Money,
    pub revenue_by_platform: Vec<GroupTotal>,
    pub sale_count: usize,

    /// Cost of goods sold, approximated by purchase totals.
    pub cogs: Money,
    pub purchase_count: usize,

    pub gross_profit: Money,

    pub expenses: Money,
    pub expenses_by_category: Vec<GroupTotal>,

    pub net_profit: Money,

    /// `(revenue - cogs) / revenue` in basis points, 0 without revenue.
    pub gross_margin_bps: i64,
    /// `net_profit / revenue` in basis points, 0 without revenue.
    pub net_margin_bps: i64,
}

impl ProfitLossReport {
    /// Builds the statement for `period`.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::NaiveDate;
    /// use tokodash_core::profit_loss::{ExpenseEntry, ProfitLossReport};
    /// use tokodash_core::{DateRange, Money};
    ///
    /// let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
    /// let expenses = [ExpenseEntry { category: None, amount: Money::from_amount(200_000) }];
    /// let report = ProfitLossReport::compute(DateRange::single_day(day), &[], &[], &expenses);
    ///
    /// assert_eq!(report.net_profit.amount(), -200_000);
    /// assert_eq!(report.gross_margin_bps, 0);
    /// ```
    pub fn compute(
        period: DateRange,
        revenue: &[RevenueEntry],
        purchases: &[Money],
        expenses: &[ExpenseEntry],
    ) -> Self {
        let revenue_by_platform = group_totals(
            revenue
                .iter()
                .map(|entry| (entry.platform.as_deref(), entry.amount)),
            UNASSIGNED_PLATFORM,
        );
        let expenses_by_category = group_totals(
            expenses
                .iter()
                .map(|entry| (entry.category.as_deref(), entry.amount)),
            UNCATEGORIZED,
        );

        let total_revenue: Money = revenue.iter().map(|entry| entry.amount).sum();
        let cogs: Money = purchases.iter().sum();
        let total_expenses: Money = expenses.iter().map(|entry| entry.amount).sum();

        let gross_profit = total_revenue - cogs;
        let net_profit = gross_profit - total_expenses;

        ProfitLossReport {
            period,
            revenue: total_revenue,
            revenue_by_platform,
            sale_count: revenue.len(),
            cogs,
            purchase_count: purchases.len(),
            gross_profit,
            expenses: total_expenses,
            expenses_by_category,
            net_profit,
            gross_margin_bps: gross_profit.ratio_bps(total_revenue),
            net_margin_bps: net_profit.ratio_bps(total_revenue),
        }
    }

    /// Gross margin as a percentage, e.g. `44.0`.
    pub fn gross_margin_percent(&self) -> f64 {
        self.gross_margin_bps as f64 / 100.0
    }

    /// Net margin as a percentage.
    pub fn net_margin_percent(&self) -> f64 {
        self.net_margin_bps as f64 / 100.0
    }
}

/// Sums amounts per name, sorted by descending amount then name.
fn group_totals<'a>(
    rows: impl Iterator<Item = (Option<&'a str>, Money)>,
    fallback: &str,
) -> Vec<GroupTotal> {
    let mut groups: BTreeMap<String, (Money, usize)> = BTreeMap::new();

    for (name, amount) in rows {
        let name = match name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => fallback.to_string(),
        };
        let entry = groups.entry(name).or_insert((Money::zero(), 0));
        entry.0 += amount;
        entry.1 += 1;
    }

    let mut totals: Vec<GroupTotal> = groups
        .into_iter()
        .map(|(name, (amount, count))| GroupTotal {
            name,
            amount,
            count,
        })
        .collect();
    totals.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.name.cmp(&b.name)));
    totals
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn march() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
        )
        .unwrap()
    }

    fn sale(platform: Option<&str>, amount: i64) -> RevenueEntry {
        RevenueEntry {
            platform: platform.map(str::to_string),
            amount: Money::from_amount(amount),
        }
    }

    fn expense(category: Option<&str>, amount: i64) -> ExpenseEntry {
        ExpenseEntry {
            category: category.map(str::to_string),
            amount: Money::from_amount(amount),
        }
    }

    #[test]
    fn test_full_statement() {
        let revenue = [
            sale(Some("Shopee"), 8_000_000),
            sale(Some("Tokopedia"), 3_000_000),
            sale(Some("Shopee"), 1_500_000),
        ];
        let purchases = [Money::from_amount(7_000_000)];
        let expenses = [
            expense(Some("Ads"), 1_000_000),
            expense(Some("Packaging"), 500_000),
        ];

        let report = ProfitLossReport::compute(march(), &revenue, &purchases, &expenses);

        assert_eq!(report.revenue.amount(), 12_500_000);
        assert_eq!(report.cogs.amount(), 7_000_000);
        assert_eq!(report.gross_profit.amount(), 5_500_000);
        assert_eq!(report.expenses.amount(), 1_500_000);
        assert_eq!(report.net_profit.amount(), 4_000_000);
        assert_eq!(report.gross_margin_bps, 4_400);
        assert_eq!(report.net_margin_bps, 3_200);
        assert_eq!(report.gross_margin_percent(), 44.0);
        assert_eq!(report.sale_count, 3);

        assert_eq!(report.revenue_by_platform[0].name, "Shopee");
        assert_eq!(report.revenue_by_platform[0].amount.amount(), 9_500_000);
        assert_eq!(report.revenue_by_platform[0].count, 2);
        assert_eq!(report.revenue_by_platform[1].name, "Tokopedia");
    }

    #[test]
    fn test_zero_sales_with_expenses() {
        let expenses = [expense(Some("Rent"), 2_000_000), expense(None, 250_000)];
        let report = ProfitLossReport::compute(march(), &[], &[], &expenses);

        assert!(report.revenue.is_zero());
        assert_eq!(report.net_profit, -report.expenses);
        assert_eq!(report.net_profit.amount(), -2_250_000);
        assert_eq!(report.gross_margin_bps, 0);
        assert_eq!(report.net_margin_bps, 0);
    }

    #[test]
    fn test_missing_names_fall_back() {
        let revenue = [sale(None, 100), sale(Some("  "), 50)];
        let expenses = [expense(None, 10)];
        let report = ProfitLossReport::compute(march(), &revenue, &[], &expenses);

        assert_eq!(report.revenue_by_platform.len(), 1);
        assert_eq!(report.revenue_by_platform[0].name, UNASSIGNED_PLATFORM);
        assert_eq!(report.revenue_by_platform[0].amount.amount(), 150);
        assert_eq!(report.expenses_by_category[0].name, UNCATEGORIZED);
    }

    #[test]
    fn test_groups_tie_break_on_name() {
        let expenses = [
            expense(Some("Transport"), 100),
            expense(Some("Ads"), 100),
            expense(Some("Salary"), 300),
        ];
        let report = ProfitLossReport::compute(march(), &[], &[], &expenses);
        let names: Vec<_> = report
            .expenses_by_category
            .iter()
            .map(|group| group.name.as_str())
            .collect();
        assert_eq!(names, vec!["Salary", "Ads", "Transport"]);
    }

    #[test]
    fn test_negative_gross_margin() {
        let revenue = [sale(Some("Shopee"), 1_000)];
        let purchases = [Money::from_amount(1_500)];
        let report = ProfitLossReport::compute(march(), &revenue, &purchases, &[]);
        assert_eq!(report.gross_profit.amount(), -500);
        assert_eq!(report.gross_margin_bps, -5_000);
    }
}
