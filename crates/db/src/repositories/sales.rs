//! Sales repository. Sales never move an account balance.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use cemtrade_core::customer::{Customer, SalesTransaction};
use cemtrade_core::ledger::LedgerError;
use cemtrade_shared::types::{CustomerId, SaleId};

use crate::error::RepositoryError;
use crate::records::{encode, fetch, fetch_all, require};
use crate::store::{Collection, EntityStore, WriteBatch};

/// Input for recording or editing a sale.
#[derive(Debug, Clone)]
pub struct SaleInput {
    /// Buying customer.
    pub customer_id: CustomerId,
    /// Product description.
    pub product: String,
    /// Sale date.
    pub date: NaiveDate,
    /// Total billed; must be positive.
    pub amount: Decimal,
    /// Selling price per bag.
    pub price_per_bag: Option<Decimal>,
    /// Cost price per bag.
    pub purchase_price: Option<Decimal>,
    /// Free-text note.
    pub note: Option<String>,
}

/// Repository for sales.
#[derive(Debug, Clone)]
pub struct SalesRepository {
    store: Arc<dyn EntityStore>,
}

impl SalesRepository {
    /// Creates a new sales repository.
    #[must_use]
    pub const fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Records a sale.
    pub async fn record_sale(&self, input: SaleInput) -> Result<SalesTransaction, RepositoryError> {
        let sale = self.build(SaleId::new(), input).await?;
        self.put(&sale).await?;
        info!(sale_id = %sale.id, amount = %sale.amount, "Recorded sale");
        Ok(sale)
    }

    /// Replaces a sale's fields.
    pub async fn update_sale(&self, id: SaleId, input: SaleInput) -> Result<SalesTransaction, RepositoryError> {
        let _: SalesTransaction = require(self.store.as_ref(), Collection::Sales, id.into_inner()).await?;
        let sale = self.build(id, input).await?;
        self.put(&sale).await?;
        info!(sale_id = %id, amount = %sale.amount, "Updated sale");
        Ok(sale)
    }

    /// Deletes a sale.
    pub async fn delete_sale(&self, id: SaleId) -> Result<(), RepositoryError> {
        let mut batch = WriteBatch::new();
        batch.delete(Collection::Sales, id.into_inner());
        self.store.commit(batch).await?;
        info!(sale_id = %id, "Deleted sale");
        Ok(())
    }

    /// Returns the sale, if it exists.
    pub async fn get_sale(&self, id: SaleId) -> Result<Option<SalesTransaction>, RepositoryError> {
        fetch(self.store.as_ref(), Collection::Sales, id.into_inner()).await
    }

    /// Lists every sale in creation order.
    pub async fn list_sales(&self) -> Result<Vec<SalesTransaction>, RepositoryError> {
        fetch_all(self.store.as_ref(), Collection::Sales).await
    }

    async fn build(&self, id: SaleId, input: SaleInput) -> Result<SalesTransaction, RepositoryError> {
        LedgerError::ensure_positive_amount(input.amount)?;
        let customer: Customer =
            require(self.store.as_ref(), Collection::Customers, input.customer_id.into_inner()).await?;
        Ok(SalesTransaction {
            id,
            customer_id: Some(customer.id),
            customer: None,
            product: input.product,
            date: input.date,
            amount: input.amount,
            price_per_bag: input.price_per_bag,
            purchase_price: input.purchase_price,
            note: input.note,
        })
    }

    async fn put(&self, sale: &SalesTransaction) -> Result<(), RepositoryError> {
        let mut batch = WriteBatch::new();
        batch.put(Collection::Sales, sale.id.into_inner(), encode(sale)?);
        self.store.commit(batch).await?;
        Ok(())
    }
}
