//! Account repository: account records and the Account Balance Adjuster.
//!
//! `Account.balance` is only ever changed through [`AccountRepository::stage_adjustment`],
//! which stages one store-side increment per logical event.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{info, warn};

use cemtrade_core::ledger::{Account, BalanceAdjustment, BalanceDrift, BalanceService, GlobalTransaction};
use cemtrade_shared::types::AccountId;

use crate::error::RepositoryError;
use crate::records::{encode, fetch, fetch_all, find, require};
use crate::store::{Collection, EntityStore, WriteBatch};

/// Field holding an account's materialized balance.
pub const BALANCE_FIELD: &str = "balance";

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Display name.
    pub name: String,
    /// Free-form kind, e.g. "Cash" or "Bank".
    pub account_type: String,
    /// Balance on the opening date.
    pub opening_balance: Decimal,
    /// Date the opening balance refers to.
    pub opening_date: Option<NaiveDate>,
}

/// Input for updating an account. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccountInput {
    /// New name.
    pub name: Option<String>,
    /// New kind.
    pub account_type: Option<String>,
    /// New opening balance; the running balance shifts by the difference.
    pub opening_balance: Option<Decimal>,
    /// New opening date.
    pub opening_date: Option<Option<NaiveDate>>,
}

/// Account repository for CRUD operations and balance adjustment.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    store: Arc<dyn EntityStore>,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Creates an account whose balance starts at its opening balance.
    pub async fn create_account(&self, input: CreateAccountInput) -> Result<Account, RepositoryError> {
        let account = Account::open(
            input.name,
            input.account_type,
            input.opening_balance,
            input.opening_date,
        );
        let mut batch = WriteBatch::new();
        batch.put(Collection::Accounts, account.id.into_inner(), encode(&account)?);
        self.store.commit(batch).await?;

        info!(account_id = %account.id, name = %account.name, "Created account");
        Ok(account)
    }

    /// Updates an account's descriptive fields and opening balance.
    ///
    /// Changing the opening balance moves the running balance by the same
    /// difference, so `balance == opening + Σ ledger` keeps holding.
    pub async fn update_account(
        &self,
        id: AccountId,
        input: UpdateAccountInput,
    ) -> Result<Account, RepositoryError> {
        let current: Account = require(self.store.as_ref(), Collection::Accounts, id.into_inner()).await?;

        let opening_balance = input.opening_balance.unwrap_or(current.opening_balance);
        let fields = json!({
            "name": input.name.unwrap_or(current.name),
            "type": input.account_type.unwrap_or(current.account_type),
            "openingBalance": opening_balance,
            "openingDate": input.opening_date.unwrap_or(current.opening_date),
        });

        let mut batch = WriteBatch::new();
        batch.merge(Collection::Accounts, id.into_inner(), fields);
        Self::stage_adjustment(
            &mut batch,
            &BalanceAdjustment::new(id, opening_balance - current.opening_balance),
        );
        self.store.commit(batch).await?;

        info!(account_id = %id, "Updated account");
        require(self.store.as_ref(), Collection::Accounts, id.into_inner()).await
    }

    /// Deletes an account that no ledger transaction posts to.
    pub async fn delete_account(&self, id: AccountId) -> Result<(), RepositoryError> {
        let entries = self.ledger_entries(id).await?;
        if !entries.is_empty() {
            return Err(RepositoryError::AccountInUse {
                id: id.into_inner(),
                entries: entries.len(),
            });
        }

        let mut batch = WriteBatch::new();
        batch.delete(Collection::Accounts, id.into_inner());
        self.store.commit(batch).await?;

        info!(account_id = %id, "Deleted account");
        Ok(())
    }

    /// Returns the account, if it exists.
    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        fetch(self.store.as_ref(), Collection::Accounts, id.into_inner()).await
    }

    /// Lists every account in creation order.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, RepositoryError> {
        fetch_all(self.store.as_ref(), Collection::Accounts).await
    }

    /// Stages one signed-delta adjustment of an account's balance.
    ///
    /// A zero delta stages nothing. The target account must exist when the
    /// batch commits, otherwise the whole batch fails with a stale reference.
    pub fn stage_adjustment(batch: &mut WriteBatch, adjustment: &BalanceAdjustment) {
        batch.increment(
            Collection::Accounts,
            adjustment.account_id.into_inner(),
            BALANCE_FIELD,
            adjustment.delta,
        );
    }

    /// Applies one signed-delta adjustment immediately.
    pub async fn adjust_balance(
        &self,
        account_id: AccountId,
        delta: Decimal,
    ) -> Result<Account, RepositoryError> {
        let mut batch = WriteBatch::new();
        Self::stage_adjustment(&mut batch, &BalanceAdjustment::new(account_id, delta));
        self.store.commit(batch).await?;

        info!(account_id = %account_id, delta = %delta, "Adjusted account balance");
        require(self.store.as_ref(), Collection::Accounts, account_id.into_inner()).await
    }

    /// Ledger transactions posted to the account, in creation order.
    pub async fn ledger_entries(&self, account_id: AccountId) -> Result<Vec<GlobalTransaction>, RepositoryError> {
        find(
            self.store.as_ref(),
            Collection::GlobalTransactions,
            "accountId",
            account_id.into_inner(),
        )
        .await
    }

    /// Compares the stored balance with `opening + Σ credits − Σ debits`.
    pub async fn check_drift(&self, account_id: AccountId) -> Result<BalanceDrift, RepositoryError> {
        let account: Account =
            require(self.store.as_ref(), Collection::Accounts, account_id.into_inner()).await?;
        let entries = self.ledger_entries(account_id).await?;
        Ok(BalanceService::check_drift(
            account_id,
            account.balance,
            account.opening_balance,
            &entries,
        ))
    }

    /// Checks every account and returns the drifted ones.
    pub async fn find_drifted(&self) -> Result<Vec<BalanceDrift>, RepositoryError> {
        let accounts = self.list_accounts().await?;
        let entries: Vec<GlobalTransaction> =
            fetch_all(self.store.as_ref(), Collection::GlobalTransactions).await?;

        Ok(accounts
            .iter()
            .map(|account| {
                BalanceService::check_drift(account.id, account.balance, account.opening_balance, &entries)
            })
            .filter(BalanceDrift::is_drifted)
            .collect())
    }

    /// Brings the stored balance back to the ledger-derived one with a single increment.
    pub async fn reconcile(&self, account_id: AccountId) -> Result<BalanceDrift, RepositoryError> {
        let drift = self.check_drift(account_id).await?;
        if drift.is_drifted() {
            warn!(
                account_id = %account_id,
                stored = %drift.stored,
                derived = %drift.derived,
                "Account balance drifted from ledger; repairing"
            );
            let mut batch = WriteBatch::new();
            Self::stage_adjustment(&mut batch, &BalanceAdjustment::new(account_id, drift.correction()));
            self.store.commit(batch).await?;
        }
        Ok(drift)
    }
}
