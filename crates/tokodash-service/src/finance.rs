//! # Finance Service
//!
//! Expenses, incomes, their categories, bank accounts, assets, and
//! settlements (payouts from a store's marketplace balance).
//!
//! ## Settlement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_settlement(store, 500_000)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │  ├── UPDATE stores SET saldo -= 500_000 WHERE saldo >= 500_000          │
//! │  │     └── no row → INSUFFICIENT_BALANCE, tx dropped                    │
//! │  └── INSERT settlements                                                 │
//! │  COMMIT ──► settlement notification                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::{info, instrument};
use ts_rs::TS;

use tokodash_core::validation::{
    validate_name, validate_non_negative_amount, validate_notes, validate_positive_amount,
    validate_uuid,
};
use tokodash_core::{
    Asset, Bank, Category, CategoryKind, CoreError, DateRange, Expense, Income, Money,
    NotificationKind, Settlement,
};
use tokodash_db::{repository::generate_id, BalanceDebit, Database, DbError, ReferenceKind};

use crate::error::{ApiError, ApiResult};
use crate::notify::NotificationHub;

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct NewCategory {
    pub name: String,
    pub kind: CategoryKind,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct NewBank {
    pub bank_name: String,
    pub account_number: String,
    pub account_holder: String,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct NewAsset {
    pub name: String,
    pub value: i64,
    #[ts(as = "String")]
    pub acquired_date: NaiveDate,
    pub notes: Option<String>,
}

/// Fields of an expense or income entry, for both create and update.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct LedgerEntryInput {
    pub store_id: Option<String>,
    pub category_id: Option<String>,
    pub bank_id: Option<String>,
    pub amount: i64,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub description: Option<String>,
}

impl LedgerEntryInput {
    fn validate(&self) -> ApiResult<()> {
        validate_positive_amount("amount", self.amount)?;
        validate_notes(self.description.as_deref())?;
        for (field, value) in [
            ("store_id", &self.store_id),
            ("category_id", &self.category_id),
            ("bank_id", &self.bank_id),
        ] {
            if let Some(value) = value {
                validate_uuid(field, value)?;
            }
        }
        Ok(())
    }

    fn references(&self) -> [(ReferenceKind, Option<&str>); 3] {
        [
            (ReferenceKind::Store, self.store_id.as_deref()),
            (ReferenceKind::Category, self.category_id.as_deref()),
            (ReferenceKind::Bank, self.bank_id.as_deref()),
        ]
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct NewSettlement {
    pub store_id: String,
    pub bank_id: Option<String>,
    pub amount: i64,
    #[ts(as = "String")]
    pub settlement_date: NaiveDate,
    pub notes: Option<String>,
}

// =============================================================================
// Service
// =============================================================================

#[derive(Clone)]
pub struct FinanceService {
    db: Database,
    hub: NotificationHub,
}

impl FinanceService {
    pub fn new(db: Database, hub: NotificationHub) -> Self {
        FinanceService { db, hub }
    }

    // =========================================================================
    // Categories, banks, assets
    // =========================================================================

    pub async fn create_category(&self, new: NewCategory) -> ApiResult<Category> {
        validate_name("name", &new.name)?;

        let category = Category {
            id: generate_id(),
            tenant_id: self.db.tenant_id().to_string(),
            name: new.name.trim().to_string(),
            kind: new.kind,
            created_at: Utc::now(),
        };
        self.db.finance().insert_category(&category).await?;

        Ok(category)
    }

    pub async fn list_categories(&self, kind: Option<CategoryKind>) -> ApiResult<Vec<Category>> {
        Ok(self.db.finance().list_categories(kind).await?)
    }

    pub async fn create_bank(&self, new: NewBank) -> ApiResult<Bank> {
        validate_name("bank_name", &new.bank_name)?;
        validate_name("account_number", &new.account_number)?;
        validate_name("account_holder", &new.account_holder)?;

        let bank = Bank {
            id: generate_id(),
            tenant_id: self.db.tenant_id().to_string(),
            bank_name: new.bank_name.trim().to_string(),
            account_number: new.account_number.trim().to_string(),
            account_holder: new.account_holder.trim().to_string(),
            created_at: Utc::now(),
        };
        self.db.finance().insert_bank(&bank).await?;

        Ok(bank)
    }

    pub async fn list_banks(&self) -> ApiResult<Vec<Bank>> {
        Ok(self.db.finance().list_banks().await?)
    }

    pub async fn create_asset(&self, new: NewAsset) -> ApiResult<Asset> {
        validate_name("name", &new.name)?;
        validate_non_negative_amount("value", new.value)?;
        validate_notes(new.notes.as_deref())?;

        let asset = Asset {
            id: generate_id(),
            tenant_id: self.db.tenant_id().to_string(),
            name: new.name.trim().to_string(),
            value: new.value,
            acquired_date: new.acquired_date,
            notes: new.notes,
            created_at: Utc::now(),
        };
        self.db.finance().insert_asset(&asset).await?;

        Ok(asset)
    }

    pub async fn list_assets(&self) -> ApiResult<Vec<Asset>> {
        Ok(self.db.finance().list_assets().await?)
    }

    /// Validates an entry and checks its store, category and bank belong
    /// to this tenant.
    async fn check_entry(&self, input: &LedgerEntryInput) -> ApiResult<()> {
        input.validate()?;
        self.db
            .references()
            .ensure_all_owned(&input.references())
            .await?;
        Ok(())
    }

    // =========================================================================
    // Expenses
    // =========================================================================

    pub async fn create_expense(&self, input: LedgerEntryInput) -> ApiResult<Expense> {
        self.check_entry(&input).await?;

        let now = Utc::now();
        let expense = Expense {
            id: generate_id(),
            tenant_id: self.db.tenant_id().to_string(),
            store_id: input.store_id,
            category_id: input.category_id,
            bank_id: input.bank_id,
            amount: input.amount,
            expense_date: input.date,
            description: input.description,
            created_at: now,
            updated_at: now,
        };
        self.db.finance().insert_expense(&expense).await?;

        Ok(expense)
    }

    pub async fn update_expense(&self, id: &str, input: LedgerEntryInput) -> ApiResult<Expense> {
        self.check_entry(&input).await?;

        let mut expense = self
            .db
            .finance()
            .get_expense(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Expense", id))?;

        expense.store_id = input.store_id;
        expense.category_id = input.category_id;
        expense.bank_id = input.bank_id;
        expense.amount = input.amount;
        expense.expense_date = input.date;
        expense.description = input.description;
        expense.updated_at = Utc::now();

        self.db.finance().update_expense(&expense).await?;
        Ok(expense)
    }

    pub async fn delete_expense(&self, id: &str) -> ApiResult<()> {
        Ok(self.db.finance().delete_expense(id).await?)
    }

    pub async fn list_expenses(
        &self,
        range: DateRange,
        store_id: Option<&str>,
    ) -> ApiResult<Vec<Expense>> {
        Ok(self.db.finance().list_expenses(range, store_id).await?)
    }

    // =========================================================================
    // Incomes
    // =========================================================================

    pub async fn create_income(&self, input: LedgerEntryInput) -> ApiResult<Income> {
        self.check_entry(&input).await?;

        let now = Utc::now();
        let income = Income {
            id: generate_id(),
            tenant_id: self.db.tenant_id().to_string(),
            store_id: input.store_id,
            category_id: input.category_id,
            bank_id: input.bank_id,
            amount: input.amount,
            income_date: input.date,
            description: input.description,
            created_at: now,
            updated_at: now,
        };
        self.db.finance().insert_income(&income).await?;

        Ok(income)
    }

    pub async fn update_income(&self, id: &str, input: LedgerEntryInput) -> ApiResult<Income> {
        self.check_entry(&input).await?;

        let mut income = self
            .db
            .finance()
            .get_income(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Income", id))?;

        income.store_id = input.store_id;
        income.category_id = input.category_id;
        income.bank_id = input.bank_id;
        income.amount = input.amount;
        income.income_date = input.date;
        income.description = input.description;
        income.updated_at = Utc::now();

        self.db.finance().update_income(&income).await?;
        Ok(income)
    }

    pub async fn delete_income(&self, id: &str) -> ApiResult<()> {
        Ok(self.db.finance().delete_income(id).await?)
    }

    pub async fn list_incomes(
        &self,
        range: DateRange,
        store_id: Option<&str>,
    ) -> ApiResult<Vec<Income>> {
        Ok(self.db.finance().list_incomes(range, store_id).await?)
    }

    // =========================================================================
    // Settlements
    // =========================================================================

    /// Pays out `amount` from the store's dashboard balance.
    ///
    /// ## Errors
    /// * `INSUFFICIENT_BALANCE` - the balance does not cover `amount`
    /// * `NOT_FOUND` - unknown store or bank
    #[instrument(skip(self, new), fields(store_id = %new.store_id, amount = new.amount))]
    pub async fn create_settlement(&self, new: NewSettlement) -> ApiResult<Settlement> {
        validate_uuid("store_id", &new.store_id)?;
        validate_positive_amount("amount", new.amount)?;
        validate_notes(new.notes.as_deref())?;
        if let Some(bank_id) = &new.bank_id {
            validate_uuid("bank_id", bank_id)?;
        }

        let mut tx = self.db.begin().await?;

        if let Some(bank_id) = &new.bank_id {
            self.db
                .references()
                .ensure_owned_in(&mut tx, ReferenceKind::Bank, bank_id)
                .await?;
        }

        let balance = match self
            .db
            .stores()
            .debit_balance_in(&mut tx, &new.store_id, new.amount)
            .await?
        {
            BalanceDebit::Applied { balance } => balance,
            BalanceDebit::Insufficient { available } => {
                return Err(CoreError::InsufficientBalance {
                    store_id: new.store_id,
                    available,
                    requested: new.amount,
                }
                .into());
            }
        };

        let settlement = Settlement {
            id: generate_id(),
            tenant_id: self.db.tenant_id().to_string(),
            store_id: new.store_id,
            bank_id: new.bank_id,
            amount: new.amount,
            settlement_date: new.settlement_date,
            notes: new.notes,
            created_at: Utc::now(),
        };
        self.db.settlements().insert_in(&mut tx, &settlement).await?;

        tx.commit().await.map_err(DbError::from)?;

        let amount = Money::from_amount(settlement.amount);
        info!(settlement_id = %settlement.id, balance = balance, "Settlement recorded");

        self.hub
            .notify_logged(
                NotificationKind::Settlement,
                format!("Settlement {amount}"),
                format!("{amount} withdrawn, remaining balance {}", Money::from_amount(balance)),
                Some(&settlement.id),
            )
            .await;

        Ok(settlement)
    }

    /// Deletes a settlement and credits its amount back to the store.
    #[instrument(skip(self))]
    pub async fn delete_settlement(&self, id: &str) -> ApiResult<()> {
        let mut tx = self.db.begin().await?;

        let settlement = self
            .db
            .settlements()
            .get_by_id_in(&mut tx, id)
            .await?
            .ok_or_else(|| ApiError::not_found("Settlement", id))?;

        self.db
            .stores()
            .adjust_balance_in(&mut tx, &settlement.store_id, settlement.amount)
            .await?;
        self.db.settlements().delete_in(&mut tx, id).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(settlement_id = %id, amount = settlement.amount, "Settlement deleted");
        Ok(())
    }

    pub async fn list_settlements(
        &self,
        store_id: Option<&str>,
        range: Option<DateRange>,
    ) -> ApiResult<Vec<Settlement>> {
        Ok(self.db.settlements().list(store_id, range).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::testing;

    fn entry(amount: i64, date: &str) -> LedgerEntryInput {
        LedgerEntryInput {
            store_id: None,
            category_id: None,
            bank_id: None,
            amount,
            date: testing::day(date),
            description: Some("iklan".to_string()),
        }
    }

    fn payout(store_id: &str, amount: i64) -> NewSettlement {
        NewSettlement {
            store_id: store_id.to_string(),
            bank_id: None,
            amount,
            settlement_date: testing::day("2026-03-10"),
            notes: None,
        }
    }

    async fn fund(fx: &testing::Fixture, amount: i64) {
        let mut tx = fx.office.database().begin().await.unwrap();
        fx.office
            .database()
            .stores()
            .adjust_balance_in(&mut tx, &fx.store.id, amount)
            .await
            .unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_settlement_debits_balance_and_notifies() {
        let fx = testing::fixture().await;
        fund(&fx, 1_000_000).await;
        let mut rx = fx.office.notifications().subscribe();
        let finance = fx.office.finance();

        let settlement = finance.create_settlement(payout(&fx.store.id, 400_000)).await.unwrap();
        assert_eq!(testing::balance_of(&fx.office, &fx.store.id).await, 600_000);

        let note = rx.recv().await.unwrap();
        assert_eq!(note.kind, NotificationKind::Settlement);
        assert_eq!(note.reference_id.as_deref(), Some(settlement.id.as_str()));

        finance.delete_settlement(&settlement.id).await.unwrap();
        assert_eq!(testing::balance_of(&fx.office, &fx.store.id).await, 1_000_000);
        assert!(finance.list_settlements(None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_settlement_over_balance_rejected() {
        let fx = testing::fixture().await;
        fund(&fx, 100_000).await;
        let finance = fx.office.finance();

        let err = finance
            .create_settlement(payout(&fx.store.id, 100_001))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientBalance);
        assert_eq!(testing::balance_of(&fx.office, &fx.store.id).await, 100_000);
        assert!(finance.list_settlements(Some(&fx.store.id), None).await.unwrap().is_empty());

        // Exactly the balance is allowed
        finance.create_settlement(payout(&fx.store.id, 100_000)).await.unwrap();
        assert_eq!(testing::balance_of(&fx.office, &fx.store.id).await, 0);
    }

    #[tokio::test]
    async fn test_settlement_validation() {
        let fx = testing::fixture().await;
        let finance = fx.office.finance();

        let err = finance.create_settlement(payout(&fx.store.id, 0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = finance
            .create_settlement(payout(&generate_id(), 10))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        fund(&fx, 10).await;
        let mut unknown_bank = payout(&fx.store.id, 10);
        unknown_bank.bank_id = Some(generate_id());
        let err = finance.create_settlement(unknown_bank).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(testing::balance_of(&fx.office, &fx.store.id).await, 10);
    }

    #[tokio::test]
    async fn test_expense_lifecycle() {
        let fx = testing::fixture().await;
        let finance = fx.office.finance();
        let march = DateRange::new(testing::day("2026-03-01"), testing::day("2026-03-31")).unwrap();

        let expense = finance.create_expense(entry(150_000, "2026-03-05")).await.unwrap();
        finance.create_expense(entry(90_000, "2026-04-01")).await.unwrap();
        assert_eq!(finance.list_expenses(march, None).await.unwrap().len(), 1);

        let updated = finance
            .update_expense(&expense.id, entry(175_000, "2026-03-06"))
            .await
            .unwrap();
        assert_eq!(updated.amount, 175_000);

        finance.delete_expense(&expense.id).await.unwrap();
        assert!(finance.list_expenses(march, None).await.unwrap().is_empty());
        assert_eq!(
            finance.delete_expense(&expense.id).await.unwrap_err().code,
            ErrorCode::NotFound
        );

        let err = finance.create_expense(entry(0, "2026-03-05")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_income_and_reference_data() {
        let fx = testing::fixture().await;
        let finance = fx.office.finance();

        let category = finance
            .create_category(NewCategory {
                name: "Cashback".to_string(),
                kind: CategoryKind::Income,
            })
            .await
            .unwrap();
        let bank = finance
            .create_bank(NewBank {
                bank_name: "BCA".to_string(),
                account_number: "1234567890".to_string(),
                account_holder: "Toko Maju".to_string(),
            })
            .await
            .unwrap();

        let mut input = entry(25_000, "2026-03-05");
        input.category_id = Some(category.id.clone());
        input.bank_id = Some(bank.id.clone());
        let income = finance.create_income(input.clone()).await.unwrap();

        input.amount = 30_000;
        assert_eq!(finance.update_income(&income.id, input).await.unwrap().amount, 30_000);

        let march = DateRange::new(testing::day("2026-03-01"), testing::day("2026-03-31")).unwrap();
        assert_eq!(finance.list_incomes(march, None).await.unwrap().len(), 1);
        finance.delete_income(&income.id).await.unwrap();

        assert_eq!(
            finance.list_categories(Some(CategoryKind::Income)).await.unwrap().len(),
            1
        );
        assert!(finance
            .list_categories(Some(CategoryKind::Expense))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(finance.list_banks().await.unwrap().len(), 1);

        finance
            .create_asset(NewAsset {
                name: "Printer label".to_string(),
                value: 1_500_000,
                acquired_date: testing::day("2026-01-15"),
                notes: None,
            })
            .await
            .unwrap();
        assert_eq!(finance.list_assets().await.unwrap().len(), 1);
    }
}
