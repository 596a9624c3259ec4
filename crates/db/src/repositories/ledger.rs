//! Ledger Transaction Linker and manual ledger entries.
//!
//! A ledger transaction carrying a `paymentId`, `expenseId` or `transferId`
//! is owned by that record. The linker stages its creation, edit and removal
//! into the owner's batch together with exactly one balance adjustment per
//! affected account.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{debug, info, warn};

use cemtrade_core::ledger::{
    BalanceAdjustment, BalanceService, EntryType, GlobalTransaction, LedgerCategory, LedgerError,
    LinkAction, LinkRef, LinkedEditPlan, LinkedEditService, LinkedPosting,
};
use cemtrade_shared::types::{AccountId, FundTransferId, LedgerTransactionId};

use super::account::AccountRepository;
use crate::error::RepositoryError;
use crate::records::{encode, fetch_all, find, require};
use crate::store::{Collection, EntityStore, WriteBatch};

/// Descriptive fields copied onto a linked ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedEntryDetails {
    /// Value date.
    pub date: NaiveDate,
    /// Description shown in the ledger view.
    pub description: String,
    /// Category label.
    pub category: LedgerCategory,
}

/// Input for a manual (unlinked) ledger transaction.
#[derive(Debug, Clone)]
pub struct LedgerEntryInput {
    /// Account the money moves through.
    pub account_id: AccountId,
    /// Credit or Debit.
    pub entry_type: EntryType,
    /// Unsigned amount; must be positive.
    pub amount: Decimal,
    /// Value date.
    pub date: NaiveDate,
    /// Free-text description.
    pub description: String,
    /// Category label.
    pub category: LedgerCategory,
}

/// Input for moving money between two accounts.
#[derive(Debug, Clone)]
pub struct FundTransferInput {
    /// Account the money leaves.
    pub from: AccountId,
    /// Account the money arrives in.
    pub to: AccountId,
    /// Amount moved; must be positive.
    pub amount: Decimal,
    /// Transfer date.
    pub date: NaiveDate,
    /// Optional description for both legs.
    pub description: Option<String>,
}

/// Both legs of a fund transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundTransfer {
    /// Shared transfer id.
    pub transfer_id: FundTransferId,
    /// Debit on the source account.
    pub debit: GlobalTransaction,
    /// Credit on the destination account.
    pub credit: GlobalTransaction,
}

/// Repository for ledger transactions.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    store: Arc<dyn EntityStore>,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    // ========== Linker ==========

    /// Finds the ledger transaction owned by `link`.
    pub async fn find_linked(&self, link: LinkRef) -> Result<Option<GlobalTransaction>, RepositoryError> {
        let mut matches: Vec<GlobalTransaction> = find(
            self.store.as_ref(),
            Collection::GlobalTransactions,
            link.field_name(),
            link.value(),
        )
        .await?;
        if matches.len() > 1 {
            warn!(%link, count = matches.len(), "Several ledger transactions share one owner; using the first");
        }
        Ok(if matches.is_empty() {
            None
        } else {
            Some(matches.swap_remove(0))
        })
    }

    /// Stages a new ledger transaction and its balance adjustment.
    pub fn stage_record(batch: &mut WriteBatch, entry: &GlobalTransaction) -> Result<(), RepositoryError> {
        batch.put(Collection::GlobalTransactions, entry.id.into_inner(), encode(entry)?);
        AccountRepository::stage_adjustment(
            batch,
            &BalanceAdjustment::new(entry.account_id, entry.signed_amount()),
        );
        debug!(entry_id = %entry.id, account_id = %entry.account_id, "Staged ledger transaction");
        Ok(())
    }

    /// Stages removal of a ledger transaction and the inverse balance adjustment.
    pub fn stage_remove(batch: &mut WriteBatch, entry: &GlobalTransaction) {
        batch.delete(Collection::GlobalTransactions, entry.id.into_inner());
        AccountRepository::stage_adjustment(
            batch,
            &BalanceAdjustment::new(entry.account_id, -entry.signed_amount()),
        );
        debug!(entry_id = %entry.id, account_id = %entry.account_id, "Staged ledger transaction removal");
    }

    /// Creates a ledger transaction owned by `link` and applies it to the account.
    pub async fn record_linked_transaction(
        &self,
        link: LinkRef,
        account_id: AccountId,
        entry_type: EntryType,
        amount: Decimal,
        details: LinkedEntryDetails,
    ) -> Result<GlobalTransaction, RepositoryError> {
        LedgerError::ensure_positive_amount(amount)?;
        let entry = GlobalTransaction::linked(
            link,
            account_id,
            entry_type,
            amount,
            details.date,
            details.description,
            details.category,
        );
        let mut batch = WriteBatch::new();
        Self::stage_record(&mut batch, &entry)?;
        self.store.commit(batch).await?;

        info!(%link, entry_id = %entry.id, amount = %amount, "Recorded linked ledger transaction");
        Ok(entry)
    }

    /// Stages removal of the entry owned by `link` and reverses its balance effect.
    ///
    /// Returns the removed entry, or `None` (after a warning) when there is none.
    pub async fn stage_delete_linked(
        &self,
        batch: &mut WriteBatch,
        link: LinkRef,
    ) -> Result<Option<GlobalTransaction>, RepositoryError> {
        let entry = self.find_linked(link).await?;
        match &entry {
            Some(entry) => Self::stage_remove(batch, entry),
            None => warn!(%link, "No linked ledger transaction to delete"),
        }
        Ok(entry)
    }

    /// Deletes the entry owned by `link` and reverses its balance effect.
    pub async fn delete_linked_transaction(
        &self,
        link: LinkRef,
    ) -> Result<Option<GlobalTransaction>, RepositoryError> {
        let mut batch = WriteBatch::new();
        let removed = self.stage_delete_linked(&mut batch, link).await?;
        self.store.commit(batch).await?;
        if removed.is_some() {
            info!(%link, "Deleted linked ledger transaction");
        }
        Ok(removed)
    }

    /// Stages a change of the stored amount (and optionally description) of the
    /// entry owned by `link`. The account balance is left to the caller.
    pub async fn stage_update_linked_amount(
        &self,
        batch: &mut WriteBatch,
        link: LinkRef,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<Option<GlobalTransaction>, RepositoryError> {
        let Some(entry) = self.find_linked(link).await? else {
            warn!(%link, "No linked ledger transaction to update");
            return Ok(None);
        };
        let mut fields = json!({ "amount": amount });
        if let Some(description) = &description {
            fields["description"] = json!(description);
        }
        batch.merge(Collection::GlobalTransactions, entry.id.into_inner(), fields);

        Ok(Some(GlobalTransaction {
            amount,
            description: description.unwrap_or(entry.description.clone()),
            ..entry
        }))
    }

    /// Changes the stored amount of the entry owned by `link` without touching any balance.
    pub async fn update_linked_transaction_amount(
        &self,
        link: LinkRef,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<Option<GlobalTransaction>, RepositoryError> {
        LedgerError::ensure_positive_amount(amount)?;
        let mut batch = WriteBatch::new();
        let updated = self
            .stage_update_linked_amount(&mut batch, link, amount, description)
            .await?;
        self.store.commit(batch).await?;
        Ok(updated)
    }

    /// Stages the edit of a record that owns a linked entry.
    ///
    /// The balance change is the net delta computed by [`LinkedEditService`];
    /// the linked entry follows the new account, amount and details, and is
    /// created or removed when an account is selected or cleared.
    ///
    /// A legacy record with an account but no linked entry never posted, so
    /// its old posting is ignored: the edit posts the new amount as a fresh
    /// linked entry, and clearing its account changes nothing.
    pub async fn stage_linked_edit(
        &self,
        batch: &mut WriteBatch,
        link: LinkRef,
        entry_type: EntryType,
        old: Option<LinkedPosting>,
        new: Option<LinkedPosting>,
        details: LinkedEntryDetails,
    ) -> Result<LinkedEditPlan, RepositoryError> {
        let existing = match old {
            Some(_) => self.find_linked(link).await?,
            None => None,
        };
        let old = if existing.is_none() && old.is_some() {
            warn!(%link, "Record never posted a linked ledger transaction; posting the edit afresh");
            None
        } else {
            old
        };

        let plan = LinkedEditService::plan(entry_type, old, new);
        for adjustment in &plan.adjustments {
            AccountRepository::stage_adjustment(batch, adjustment);
        }

        match (plan.action, new, existing) {
            (LinkAction::Create, Some(posting), _) => {
                let entry = GlobalTransaction::linked(
                    link,
                    posting.account_id,
                    entry_type,
                    posting.amount,
                    details.date,
                    details.description,
                    details.category,
                );
                batch.put(Collection::GlobalTransactions, entry.id.into_inner(), encode(&entry)?);
            }
            (LinkAction::Update, Some(posting), Some(entry)) => {
                batch.merge(
                    Collection::GlobalTransactions,
                    entry.id.into_inner(),
                    json!({
                        "accountId": posting.account_id,
                        "amount": posting.amount,
                        "date": details.date,
                        "description": details.description,
                    }),
                );
            }
            (LinkAction::Delete, _, Some(entry)) => {
                batch.delete(Collection::GlobalTransactions, entry.id.into_inner());
            }
            _ => {}
        }

        debug!(%link, action = ?plan.action, adjustments = plan.adjustments.len(), "Staged linked edit");
        Ok(plan)
    }

    // ========== Manual entries ==========

    /// Lists ledger transactions in creation order, optionally for one account.
    pub async fn list_entries(
        &self,
        account_id: Option<AccountId>,
    ) -> Result<Vec<GlobalTransaction>, RepositoryError> {
        match account_id {
            Some(account_id) => {
                find(
                    self.store.as_ref(),
                    Collection::GlobalTransactions,
                    "accountId",
                    account_id.into_inner(),
                )
                .await
            }
            None => fetch_all(self.store.as_ref(), Collection::GlobalTransactions).await,
        }
    }

    /// Creates an unlinked ledger transaction and applies it to the account.
    pub async fn create_entry(&self, input: LedgerEntryInput) -> Result<GlobalTransaction, RepositoryError> {
        LedgerError::ensure_positive_amount(input.amount)?;
        let entry = GlobalTransaction {
            id: LedgerTransactionId::new(),
            account_id: input.account_id,
            entry_type: input.entry_type,
            amount: input.amount,
            date: input.date,
            description: input.description,
            category: input.category,
            payment_id: None,
            expense_id: None,
            transfer_id: None,
        };
        let mut batch = WriteBatch::new();
        Self::stage_record(&mut batch, &entry)?;
        self.store.commit(batch).await?;

        info!(entry_id = %entry.id, account_id = %entry.account_id, amount = %entry.amount, "Created ledger transaction");
        Ok(entry)
    }

    /// Edits an unlinked ledger transaction with one net adjustment per account.
    pub async fn update_entry(
        &self,
        id: LedgerTransactionId,
        input: LedgerEntryInput,
    ) -> Result<GlobalTransaction, RepositoryError> {
        LedgerError::ensure_positive_amount(input.amount)?;
        let old = self.require_unlinked(id).await?;
        let updated = GlobalTransaction {
            account_id: input.account_id,
            entry_type: input.entry_type,
            amount: input.amount,
            date: input.date,
            description: input.description,
            category: input.category,
            ..old.clone()
        };

        let mut batch = WriteBatch::new();
        batch.put(Collection::GlobalTransactions, id.into_inner(), encode(&updated)?);
        for adjustment in BalanceService::coalesce([
            BalanceAdjustment::new(old.account_id, -old.signed_amount()),
            BalanceAdjustment::new(updated.account_id, updated.signed_amount()),
        ]) {
            AccountRepository::stage_adjustment(&mut batch, &adjustment);
        }
        self.store.commit(batch).await?;

        info!(entry_id = %id, "Updated ledger transaction");
        Ok(updated)
    }

    /// Deletes an unlinked ledger transaction and reverses its balance effect.
    pub async fn delete_entry(&self, id: LedgerTransactionId) -> Result<(), RepositoryError> {
        let entry = self.require_unlinked(id).await?;
        let mut batch = WriteBatch::new();
        Self::stage_remove(&mut batch, &entry);
        self.store.commit(batch).await?;

        info!(entry_id = %id, "Deleted ledger transaction");
        Ok(())
    }

    async fn require_unlinked(&self, id: LedgerTransactionId) -> Result<GlobalTransaction, RepositoryError> {
        let entry: GlobalTransaction =
            require(self.store.as_ref(), Collection::GlobalTransactions, id.into_inner()).await?;
        if entry.is_linked() {
            return Err(LedgerError::LinkedEntryReadOnly(id).into());
        }
        Ok(entry)
    }

    // ========== Fund transfers ==========

    /// Moves money between two accounts as a Debit/Credit pair sharing a `transferId`.
    pub async fn transfer_funds(&self, input: FundTransferInput) -> Result<FundTransfer, RepositoryError> {
        if input.from == input.to {
            return Err(LedgerError::SameAccountTransfer(input.from).into());
        }
        LedgerError::ensure_positive_amount(input.amount)?;

        let transfer_id = FundTransferId::new();
        let link = LinkRef::FundTransfer(transfer_id);
        let description = input.description.unwrap_or_else(|| "Fund transfer".to_string());
        let debit = GlobalTransaction::linked(
            link,
            input.from,
            EntryType::Debit,
            input.amount,
            input.date,
            description.clone(),
            LedgerCategory::FundTransfer,
        );
        let credit = GlobalTransaction::linked(
            link,
            input.to,
            EntryType::Credit,
            input.amount,
            input.date,
            description,
            LedgerCategory::FundTransfer,
        );

        let mut batch = WriteBatch::new();
        Self::stage_record(&mut batch, &debit)?;
        Self::stage_record(&mut batch, &credit)?;
        self.store.commit(batch).await?;

        info!(
            transfer_id = %transfer_id,
            from = %input.from,
            to = %input.to,
            amount = %input.amount,
            "Transferred funds"
        );
        Ok(FundTransfer {
            transfer_id,
            debit,
            credit,
        })
    }

    /// Deletes both legs of a fund transfer and reverses both balance effects.
    ///
    /// Returns the number of legs removed.
    pub async fn delete_fund_transfer(&self, transfer_id: FundTransferId) -> Result<usize, RepositoryError> {
        let link = LinkRef::FundTransfer(transfer_id);
        let legs: Vec<GlobalTransaction> = find(
            self.store.as_ref(),
            Collection::GlobalTransactions,
            link.field_name(),
            link.value(),
        )
        .await?;

        if legs.is_empty() {
            warn!(%link, "No fund transfer legs to delete");
            return Ok(0);
        }

        let mut batch = WriteBatch::new();
        for leg in &legs {
            Self::stage_remove(&mut batch, leg);
        }
        self.store.commit(batch).await?;

        info!(transfer_id = %transfer_id, legs = legs.len(), "Deleted fund transfer");
        Ok(legs.len())
    }
}
