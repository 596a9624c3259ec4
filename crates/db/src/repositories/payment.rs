//! Customer payment repository.
//!
//! A payment with an account owns one Credit ledger transaction
//! ("Sales Payment"). The payment, its ledger transaction and the account
//! balance always change in one commit.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use cemtrade_core::customer::{Customer, PaymentTransaction};
use cemtrade_core::ledger::{Account, EntryType, GlobalTransaction, LedgerCategory, LedgerError, LinkRef};
use cemtrade_shared::types::{AccountId, CustomerId, PaymentId};

use super::ledger::{LedgerRepository, LinkedEntryDetails};
use crate::error::RepositoryError;
use crate::records::{encode, fetch, fetch_all, require};
use crate::store::{Collection, EntityStore, WriteBatch};

/// Input for recording or editing a payment.
#[derive(Debug, Clone)]
pub struct PaymentInput {
    /// Paying customer.
    pub customer_id: CustomerId,
    /// Amount received; must be positive.
    pub amount: Decimal,
    /// Date received.
    pub date: NaiveDate,
    /// Account that received the funds.
    pub account_id: Option<AccountId>,
    /// Free-text note.
    pub note: Option<String>,
}

/// Repository for customer payments.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    store: Arc<dyn EntityStore>,
    ledger: LedgerRepository,
}

impl PaymentRepository {
    /// Creates a new payment repository.
    #[must_use]
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            ledger: LedgerRepository::new(store.clone()),
            store,
        }
    }

    /// Records a payment, its linked Credit and the account credit in one commit.
    pub async fn record_payment(&self, input: PaymentInput) -> Result<PaymentTransaction, RepositoryError> {
        let (payment, customer) = self.build(PaymentId::new(), input).await?;

        let mut batch = WriteBatch::new();
        batch.put(Collection::Payments, payment.id.into_inner(), encode(&payment)?);
        if let Some(posting) = payment.posting() {
            let details = Self::details(&payment, &customer);
            let entry = GlobalTransaction::linked(
                LinkRef::Payment(payment.id),
                posting.account_id,
                EntryType::Credit,
                posting.amount,
                details.date,
                details.description,
                details.category,
            );
            LedgerRepository::stage_record(&mut batch, &entry)?;
        }
        self.store.commit(batch).await?;

        info!(
            payment_id = %payment.id,
            customer_id = %customer.id,
            amount = %payment.amount,
            account_id = ?payment.account_id,
            "Recorded payment"
        );
        Ok(payment)
    }

    /// Edits a payment. The account balance moves by the net difference only.
    pub async fn update_payment(
        &self,
        id: PaymentId,
        input: PaymentInput,
    ) -> Result<PaymentTransaction, RepositoryError> {
        let old: PaymentTransaction = require(self.store.as_ref(), Collection::Payments, id.into_inner()).await?;
        let (updated, customer) = self.build(id, input).await?;

        let mut batch = WriteBatch::new();
        self.ledger
            .stage_linked_edit(
                &mut batch,
                LinkRef::Payment(id),
                EntryType::Credit,
                old.posting(),
                updated.posting(),
                Self::details(&updated, &customer),
            )
            .await?;
        batch.put(Collection::Payments, id.into_inner(), encode(&updated)?);
        self.store.commit(batch).await?;

        info!(payment_id = %id, old_amount = %old.amount, new_amount = %updated.amount, "Updated payment");
        Ok(updated)
    }

    /// Deletes a payment together with its linked Credit, debiting the account back once.
    pub async fn delete_payment(&self, id: PaymentId) -> Result<(), RepositoryError> {
        let payment: PaymentTransaction =
            require(self.store.as_ref(), Collection::Payments, id.into_inner()).await?;

        let mut batch = WriteBatch::new();
        self.ledger
            .stage_delete_linked(&mut batch, LinkRef::Payment(id))
            .await?;
        batch.delete(Collection::Payments, id.into_inner());
        self.store.commit(batch).await?;

        info!(payment_id = %id, amount = %payment.amount, "Deleted payment");
        Ok(())
    }

    /// Returns the payment, if it exists.
    pub async fn get_payment(&self, id: PaymentId) -> Result<Option<PaymentTransaction>, RepositoryError> {
        fetch(self.store.as_ref(), Collection::Payments, id.into_inner()).await
    }

    /// Lists every payment in creation order.
    pub async fn list_payments(&self) -> Result<Vec<PaymentTransaction>, RepositoryError> {
        fetch_all(self.store.as_ref(), Collection::Payments).await
    }

    /// Validates the input and resolves the customer and receiving account.
    async fn build(
        &self,
        id: PaymentId,
        input: PaymentInput,
    ) -> Result<(PaymentTransaction, Customer), RepositoryError> {
        LedgerError::ensure_positive_amount(input.amount)?;
        let customer: Customer =
            require(self.store.as_ref(), Collection::Customers, input.customer_id.into_inner()).await?;
        let method = match input.account_id {
            Some(account_id) => {
                let account: Account =
                    require(self.store.as_ref(), Collection::Accounts, account_id.into_inner()).await?;
                Some(account.name)
            }
            None => None,
        };
        let payment = PaymentTransaction {
            id,
            customer_id: Some(customer.id),
            customer: None,
            amount: input.amount,
            date: input.date,
            account_id: input.account_id,
            method,
            note: input.note,
        };
        Ok((payment, customer))
    }

    fn details(payment: &PaymentTransaction, customer: &Customer) -> LinkedEntryDetails {
        LinkedEntryDetails {
            date: payment.date,
            description: format!("Payment from {}", customer.name),
            category: LedgerCategory::SalesPayment,
        }
    }
}
