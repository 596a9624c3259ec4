//! Expense repository.
//!
//! An expense with an account owns one Debit ledger transaction ("Expense").
//! Edits move the balance by the net difference; deletes reverse it once.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use cemtrade_core::expense::ExpenseTransaction;
use cemtrade_core::ledger::{EntryType, GlobalTransaction, LedgerCategory, LedgerError, LinkRef};
use cemtrade_shared::types::{AccountId, ExpenseId};

use super::ledger::{LedgerRepository, LinkedEntryDetails};
use crate::error::RepositoryError;
use crate::records::{encode, fetch, fetch_all, require};
use crate::store::{Collection, EntityStore, WriteBatch};

/// Input for recording or editing an expense.
#[derive(Debug, Clone)]
pub struct ExpenseInput {
    /// Who was paid.
    pub vendor: String,
    /// Expense category.
    pub item: String,
    /// Amount paid; must be positive.
    pub amount: Decimal,
    /// Payment date.
    pub date: NaiveDate,
    /// Account the money left.
    pub account_id: Option<AccountId>,
    /// Free-text note.
    pub note: Option<String>,
}

impl ExpenseInput {
    fn into_expense(self, id: ExpenseId) -> Result<ExpenseTransaction, LedgerError> {
        LedgerError::ensure_positive_amount(self.amount)?;
        Ok(ExpenseTransaction {
            id,
            vendor: self.vendor,
            item: self.item,
            amount: self.amount,
            date: self.date,
            account_id: self.account_id,
            note: self.note,
        })
    }
}

/// Repository for expenses.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    store: Arc<dyn EntityStore>,
    ledger: LedgerRepository,
}

impl ExpenseRepository {
    /// Creates a new expense repository.
    #[must_use]
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            ledger: LedgerRepository::new(store.clone()),
            store,
        }
    }

    /// Records an expense, its linked Debit and the account debit in one commit.
    pub async fn record_expense(&self, input: ExpenseInput) -> Result<ExpenseTransaction, RepositoryError> {
        let expense = input.into_expense(ExpenseId::new())?;

        let mut batch = WriteBatch::new();
        batch.put(Collection::Expenses, expense.id.into_inner(), encode(&expense)?);
        if let Some(posting) = expense.posting() {
            let details = Self::details(&expense);
            let entry = GlobalTransaction::linked(
                LinkRef::Expense(expense.id),
                posting.account_id,
                EntryType::Debit,
                posting.amount,
                details.date,
                details.description,
                details.category,
            );
            LedgerRepository::stage_record(&mut batch, &entry)?;
        }
        self.store.commit(batch).await?;

        info!(
            expense_id = %expense.id,
            amount = %expense.amount,
            account_id = ?expense.account_id,
            "Recorded expense"
        );
        Ok(expense)
    }

    /// Edits an expense.
    ///
    /// Same account: one adjustment of `old - new`. Different accounts: the
    /// old account is credited back, the new one debited.
    pub async fn update_expense(
        &self,
        id: ExpenseId,
        input: ExpenseInput,
    ) -> Result<ExpenseTransaction, RepositoryError> {
        let updated = input.into_expense(id)?;
        let old: ExpenseTransaction = require(self.store.as_ref(), Collection::Expenses, id.into_inner()).await?;

        let mut batch = WriteBatch::new();
        self.ledger
            .stage_linked_edit(
                &mut batch,
                LinkRef::Expense(id),
                EntryType::Debit,
                old.posting(),
                updated.posting(),
                Self::details(&updated),
            )
            .await?;
        batch.put(Collection::Expenses, id.into_inner(), encode(&updated)?);
        self.store.commit(batch).await?;

        info!(expense_id = %id, old_amount = %old.amount, new_amount = %updated.amount, "Updated expense");
        Ok(updated)
    }

    /// Deletes an expense with its linked Debit, crediting the account back once.
    pub async fn delete_expense(&self, id: ExpenseId) -> Result<(), RepositoryError> {
        let expense: ExpenseTransaction =
            require(self.store.as_ref(), Collection::Expenses, id.into_inner()).await?;

        let mut batch = WriteBatch::new();
        self.ledger
            .stage_delete_linked(&mut batch, LinkRef::Expense(id))
            .await?;
        batch.delete(Collection::Expenses, id.into_inner());
        self.store.commit(batch).await?;

        info!(expense_id = %id, amount = %expense.amount, "Deleted expense");
        Ok(())
    }

    /// Returns the expense, if it exists.
    pub async fn get_expense(&self, id: ExpenseId) -> Result<Option<ExpenseTransaction>, RepositoryError> {
        fetch(self.store.as_ref(), Collection::Expenses, id.into_inner()).await
    }

    /// Lists every expense in creation order.
    pub async fn list_expenses(&self) -> Result<Vec<ExpenseTransaction>, RepositoryError> {
        fetch_all(self.store.as_ref(), Collection::Expenses).await
    }

    fn details(expense: &ExpenseTransaction) -> LinkedEntryDetails {
        LinkedEntryDetails {
            date: expense.date,
            description: expense.ledger_description(),
            category: LedgerCategory::Expense,
        }
    }
}
