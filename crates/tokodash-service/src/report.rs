//! # Profit & Loss Report
//!
//! Loads the three inputs of the P&L for a period and hands them to the
//! core aggregator. Always computed fresh.

use tracing::{debug, instrument};

use tokodash_core::profit_loss::{ExpenseEntry, ProfitLossReport, RevenueEntry};
use tokodash_core::validation::validate_uuid;
use tokodash_core::{DateRange, Money};
use tokodash_db::Database;

use crate::error::ApiResult;

#[derive(Clone)]
pub struct ReportService {
    db: Database,
}

impl ReportService {
    pub fn new(db: Database) -> Self {
        ReportService { db }
    }

    /// Profit & loss over `range`, optionally for one store.
    ///
    /// Revenue counts delivered sales by `sale_date`; cost of goods counts
    /// non-cancelled purchases by `purchase_date`; expenses count by
    /// `expense_date`. Incomes are not part of the figure.
    #[instrument(skip(self))]
    pub async fn profit_loss(
        &self,
        range: DateRange,
        store_id: Option<&str>,
    ) -> ApiResult<ProfitLossReport> {
        if let Some(store_id) = store_id {
            validate_uuid("store_id", store_id)?;
        }

        let revenue: Vec<RevenueEntry> = self
            .db
            .sales()
            .delivered_revenue(range, store_id)
            .await?
            .into_iter()
            .map(|row| RevenueEntry {
                platform: row.platform_name,
                amount: Money::from_amount(row.total),
            })
            .collect();

        let purchases: Vec<Money> = self
            .db
            .purchases()
            .cost_of_goods(range, store_id)
            .await?
            .into_iter()
            .map(Money::from_amount)
            .collect();

        let expenses: Vec<ExpenseEntry> = self
            .db
            .finance()
            .expense_rows(range, store_id)
            .await?
            .into_iter()
            .map(|row| ExpenseEntry {
                category: row.category_name,
                amount: Money::from_amount(row.amount),
            })
            .collect();

        debug!(
            sales = revenue.len(),
            purchases = purchases.len(),
            expenses = expenses.len(),
            "Computing profit & loss"
        );

        Ok(ProfitLossReport::compute(range, &revenue, &purchases, &expenses))
    }
}
