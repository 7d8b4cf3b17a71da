//! # Finance Repository
//!
//! Expenses, incomes, and the reference data they point at: categories,
//! bank accounts and fixed assets.

use std::sync::Arc;

use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tokodash_core::{Asset, Bank, Category, CategoryKind, DateRange, Expense, Income};

const EXPENSE_COLUMNS: &str = "id, tenant_id, store_id, category_id, bank_id, amount, \
     expense_date, description, created_at, updated_at";

const INCOME_COLUMNS: &str = "id, tenant_id, store_id, category_id, bank_id, amount, \
     income_date, description, created_at, updated_at";

/// An expense amount with its category name.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ExpenseRow {
    pub category_name: Option<String>,
    pub amount: i64,
}

#[derive(Debug, Clone)]
pub struct FinanceRepository {
    pool: SqlitePool,
    tenant_id: Arc<str>,
}

impl FinanceRepository {
    /// Creates a new FinanceRepository.
    pub fn new(pool: SqlitePool, tenant_id: Arc<str>) -> Self {
        FinanceRepository { pool, tenant_id }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    pub async fn insert_category(&self, category: &Category) -> DbResult<()> {
        debug!(name = %category.name, kind = ?category.kind, "Inserting category");

        sqlx::query(
            r#"
            INSERT INTO categories (id, tenant_id, name, kind, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&category.id)
        .bind(&*self.tenant_id)
        .bind(&category.name)
        .bind(category.kind)
        .bind(category.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_category(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, tenant_id, name, kind, created_at
            FROM categories
            WHERE id = ?1 AND tenant_id = ?2
            "#,
        )
        .bind(id)
        .bind(&*self.tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Lists categories, optionally of one kind, by name.
    pub async fn list_categories(&self, kind: Option<CategoryKind>) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, tenant_id, name, kind, created_at
            FROM categories
            WHERE tenant_id = ?1 AND (?2 IS NULL OR kind = ?2)
            ORDER BY kind, name
            "#,
        )
        .bind(&*self.tenant_id)
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    // =========================================================================
    // Banks & assets
    // =========================================================================

    pub async fn insert_bank(&self, bank: &Bank) -> DbResult<()> {
        debug!(bank_name = %bank.bank_name, "Inserting bank account");

        sqlx::query(
            r#"
            INSERT INTO banks (id, tenant_id, bank_name, account_number, account_holder, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&bank.id)
        .bind(&*self.tenant_id)
        .bind(&bank.bank_name)
        .bind(&bank.account_number)
        .bind(&bank.account_holder)
        .bind(bank.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_bank(&self, id: &str) -> DbResult<Option<Bank>> {
        let bank = sqlx::query_as::<_, Bank>(
            r#"
            SELECT id, tenant_id, bank_name, account_number, account_holder, created_at
            FROM banks
            WHERE id = ?1 AND tenant_id = ?2
            "#,
        )
        .bind(id)
        .bind(&*self.tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(bank)
    }

    pub async fn list_banks(&self) -> DbResult<Vec<Bank>> {
        let banks = sqlx::query_as::<_, Bank>(
            r#"
            SELECT id, tenant_id, bank_name, account_number, account_holder, created_at
            FROM banks
            WHERE tenant_id = ?1
            ORDER BY bank_name, account_number
            "#,
        )
        .bind(&*self.tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(banks)
    }

    pub async fn insert_asset(&self, asset: &Asset) -> DbResult<()> {
        debug!(name = %asset.name, value = asset.value, "Inserting asset");

        sqlx::query(
            r#"
            INSERT INTO assets (id, tenant_id, name, value, acquired_date, notes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&asset.id)
        .bind(&*self.tenant_id)
        .bind(&asset.name)
        .bind(asset.value)
        .bind(asset.acquired_date)
        .bind(&asset.notes)
        .bind(asset.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_assets(&self) -> DbResult<Vec<Asset>> {
        let assets = sqlx::query_as::<_, Asset>(
            r#"
            SELECT id, tenant_id, name, value, acquired_date, notes, created_at
            FROM assets
            WHERE tenant_id = ?1
            ORDER BY acquired_date DESC, name
            "#,
        )
        .bind(&*self.tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(assets)
    }

    // =========================================================================
    // Expenses
    // =========================================================================

    pub async fn insert_expense(&self, expense: &Expense) -> DbResult<()> {
        debug!(amount = expense.amount, date = %expense.expense_date, "Inserting expense");

        sqlx::query(
            r#"
            INSERT INTO expenses (
                id, tenant_id, store_id, category_id, bank_id, amount,
                expense_date, description, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&expense.id)
        .bind(&*self.tenant_id)
        .bind(&expense.store_id)
        .bind(&expense.category_id)
        .bind(&expense.bank_id)
        .bind(expense.amount)
        .bind(expense.expense_date)
        .bind(&expense.description)
        .bind(expense.created_at)
        .bind(expense.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_expense(&self, id: &str) -> DbResult<Option<Expense>> {
        let expense = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ?1 AND tenant_id = ?2"
        ))
        .bind(id)
        .bind(&*self.tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(expense)
    }

    /// Overwrites the editable fields of an expense.
    pub async fn update_expense(&self, expense: &Expense) -> DbResult<()> {
        debug!(id = %expense.id, "Updating expense");

        let result = sqlx::query(
            r#"
            UPDATE expenses
            SET store_id = ?1, category_id = ?2, bank_id = ?3, amount = ?4,
                expense_date = ?5, description = ?6, updated_at = ?7
            WHERE id = ?8 AND tenant_id = ?9
            "#,
        )
        .bind(&expense.store_id)
        .bind(&expense.category_id)
        .bind(&expense.bank_id)
        .bind(expense.amount)
        .bind(expense.expense_date)
        .bind(&expense.description)
        .bind(expense.updated_at)
        .bind(&expense.id)
        .bind(&*self.tenant_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", &expense.id));
        }

        Ok(())
    }

    pub async fn delete_expense(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?1 AND tenant_id = ?2")
            .bind(id)
            .bind(&*self.tenant_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }

        Ok(())
    }

    /// Expenses dated in `range`, newest first.
    pub async fn list_expenses(
        &self,
        range: DateRange,
        store_id: Option<&str>,
    ) -> DbResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses \
             WHERE tenant_id = ?1 \
               AND expense_date >= ?2 AND expense_date <= ?3 \
               AND (?4 IS NULL OR store_id = ?4) \
             ORDER BY expense_date DESC, created_at DESC"
        ))
        .bind(&*self.tenant_id)
        .bind(range.start)
        .bind(range.end)
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    /// Expense amounts in `range` with their category names.
    pub async fn expense_rows(
        &self,
        range: DateRange,
        store_id: Option<&str>,
    ) -> DbResult<Vec<ExpenseRow>> {
        let rows = sqlx::query_as::<_, ExpenseRow>(
            r#"
            SELECT c.name AS category_name, e.amount AS amount
            FROM expenses e
            LEFT JOIN categories c ON c.id = e.category_id AND c.tenant_id = e.tenant_id
            WHERE e.tenant_id = ?1
              AND e.expense_date >= ?2 AND e.expense_date <= ?3
              AND (?4 IS NULL OR e.store_id = ?4)
            "#,
        )
        .bind(&*self.tenant_id)
        .bind(range.start)
        .bind(range.end)
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // =========================================================================
    // Incomes
    // =========================================================================

    pub async fn insert_income(&self, income: &Income) -> DbResult<()> {
        debug!(amount = income.amount, date = %income.income_date, "Inserting income");

        sqlx::query(
            r#"
            INSERT INTO incomes (
                id, tenant_id, store_id, category_id, bank_id, amount,
                income_date, description, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&income.id)
        .bind(&*self.tenant_id)
        .bind(&income.store_id)
        .bind(&income.category_id)
        .bind(&income.bank_id)
        .bind(income.amount)
        .bind(income.income_date)
        .bind(&income.description)
        .bind(income.created_at)
        .bind(income.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_income(&self, id: &str) -> DbResult<Option<Income>> {
        let income = sqlx::query_as::<_, Income>(&format!(
            "SELECT {INCOME_COLUMNS} FROM incomes WHERE id = ?1 AND tenant_id = ?2"
        ))
        .bind(id)
        .bind(&*self.tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(income)
    }

    pub async fn update_income(&self, income: &Income) -> DbResult<()> {
        debug!(id = %income.id, "Updating income");

        let result = sqlx::query(
            r#"
            UPDATE incomes
            SET store_id = ?1, category_id = ?2, bank_id = ?3, amount = ?4,
                income_date = ?5, description = ?6, updated_at = ?7
            WHERE id = ?8 AND tenant_id = ?9
            "#,
        )
        .bind(&income.store_id)
        .bind(&income.category_id)
        .bind(&income.bank_id)
        .bind(income.amount)
        .bind(income.income_date)
        .bind(&income.description)
        .bind(income.updated_at)
        .bind(&income.id)
        .bind(&*self.tenant_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Income", &income.id));
        }

        Ok(())
    }

    pub async fn delete_income(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM incomes WHERE id = ?1 AND tenant_id = ?2")
            .bind(id)
            .bind(&*self.tenant_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Income", id));
        }

        Ok(())
    }

    /// Incomes dated in `range`, newest first.
    pub async fn list_incomes(
        &self,
        range: DateRange,
        store_id: Option<&str>,
    ) -> DbResult<Vec<Income>> {
        let incomes = sqlx::query_as::<_, Income>(&format!(
            "SELECT {INCOME_COLUMNS} FROM incomes \
             WHERE tenant_id = ?1 \
               AND income_date >= ?2 AND income_date <= ?3 \
               AND (?4 IS NULL OR store_id = ?4) \
             ORDER BY income_date DESC, created_at DESC"
        ))
        .bind(&*self.tenant_id)
        .bind(range.start)
        .bind(range.end)
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(incomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{fixtures, generate_id};
    use chrono::Utc;

    async fn category(db: &crate::Database, name: &str, kind: CategoryKind) -> Category {
        let category = Category {
            id: generate_id(),
            tenant_id: db.tenant_id().to_string(),
            name: name.to_string(),
            kind,
            created_at: Utc::now(),
        };
        db.finance().insert_category(&category).await.unwrap();
        category
    }

    fn expense(category_id: Option<&str>, amount: i64, date: &str) -> Expense {
        let now = Utc::now();
        Expense {
            id: generate_id(),
            tenant_id: String::new(),
            store_id: None,
            category_id: category_id.map(str::to_string),
            bank_id: None,
            amount,
            expense_date: fixtures::day(date),
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_categories_by_kind() {
        let db = fixtures::database().await;
        category(&db, "Ads", CategoryKind::Expense).await;
        category(&db, "Cashback", CategoryKind::Income).await;

        let finance = db.finance();
        assert_eq!(finance.list_categories(None).await.unwrap().len(), 2);
        let incomes = finance
            .list_categories(Some(CategoryKind::Income))
            .await
            .unwrap();
        assert_eq!(incomes.len(), 1);
        assert_eq!(incomes[0].name, "Cashback");
    }

    #[tokio::test]
    async fn test_expense_crud_and_rows() {
        let db = fixtures::database().await;
        let ads = category(&db, "Ads", CategoryKind::Expense).await;
        let finance = db.finance();

        let mut first = expense(Some(&ads.id), 100_000, "2026-03-10");
        finance.insert_expense(&first).await.unwrap();
        finance
            .insert_expense(&expense(None, 25_000, "2026-03-11"))
            .await
            .unwrap();

        first.amount = 120_000;
        finance.update_expense(&first).await.unwrap();
        assert_eq!(
            finance.get_expense(&first.id).await.unwrap().unwrap().amount,
            120_000
        );

        let march = DateRange::new(fixtures::day("2026-03-01"), fixtures::day("2026-03-31")).unwrap();
        let rows = finance.expense_rows(march, None).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.contains(&ExpenseRow {
            category_name: Some("Ads".to_string()),
            amount: 120_000
        }));
        assert!(rows.contains(&ExpenseRow {
            category_name: None,
            amount: 25_000
        }));

        finance.delete_expense(&first.id).await.unwrap();
        assert_eq!(finance.list_expenses(march, None).await.unwrap().len(), 1);
        assert!(finance.delete_expense(&first.id).await.is_err());
    }

    #[tokio::test]
    async fn test_expense_rows_ignore_foreign_category_name() {
        let db = fixtures::database().await;
        let payroll = category(&db, "Payroll", CategoryKind::Expense).await;

        // Written directly, past the service-level reference check
        let other = db.for_tenant("tenant-b");
        other
            .finance()
            .insert_expense(&expense(Some(&payroll.id), 10_000, "2026-03-10"))
            .await
            .unwrap();

        let march = DateRange::new(fixtures::day("2026-03-01"), fixtures::day("2026-03-31")).unwrap();
        let rows = other.finance().expense_rows(march, None).await.unwrap();
        assert_eq!(
            rows,
            vec![ExpenseRow {
                category_name: None,
                amount: 10_000
            }]
        );
    }

    #[tokio::test]
    async fn test_banks_and_assets() {
        let db = fixtures::database().await;
        let finance = db.finance();

        finance
            .insert_bank(&Bank {
                id: generate_id(),
                tenant_id: String::new(),
                bank_name: "BCA".to_string(),
                account_number: "1234567890".to_string(),
                account_holder: "Toko Berkah".to_string(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        finance
            .insert_asset(&Asset {
                id: generate_id(),
                tenant_id: String::new(),
                name: "Thermal printer".to_string(),
                value: 1_500_000,
                acquired_date: fixtures::day("2025-11-01"),
                notes: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        assert_eq!(finance.list_banks().await.unwrap().len(), 1);
        let assets = finance.list_assets().await.unwrap();
        assert_eq!(assets[0].tenant_id, db.tenant_id());
    }
}
