//! Purchase repository and GL/GV billing position.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use cemtrade_core::billing::{
    BillingOverview, BillingService, PurchaseFilter, PurchaseSubCategory, PurchaseTransaction, Unit,
};
use cemtrade_core::ledger::LedgerError;
use cemtrade_shared::types::PurchaseId;

use super::settings::SettingsRepository;
use crate::error::RepositoryError;
use crate::records::{encode, fetch, fetch_all, require};
use crate::store::{Collection, EntityStore, WriteBatch};

/// Input for recording or editing a purchase.
#[derive(Debug, Clone)]
pub struct PurchaseInput {
    /// Item or brand.
    pub item: String,
    /// Billing arrangement.
    pub sub_category: PurchaseSubCategory,
    /// Quantity received; must be positive.
    pub quantity: Decimal,
    /// Quantity billed so far; must not be negative.
    pub billed_quantity: Decimal,
    /// Unit of both quantities.
    pub unit: Unit,
    /// Purchase date.
    pub date: NaiveDate,
    /// Delivery vehicle.
    pub vehicle_number: Option<String>,
    /// Free-text note.
    pub note: Option<String>,
}

impl PurchaseInput {
    fn into_purchase(self, id: PurchaseId) -> Result<PurchaseTransaction, LedgerError> {
        LedgerError::ensure_positive_quantity(self.quantity)?;
        if self.billed_quantity < Decimal::ZERO {
            return Err(LedgerError::NonPositiveQuantity(self.billed_quantity));
        }
        Ok(PurchaseTransaction {
            id,
            item: self.item,
            sub_category: self.sub_category,
            quantity: self.quantity,
            billed_quantity: self.billed_quantity,
            unit: self.unit,
            date: self.date,
            vehicle_number: self.vehicle_number,
            note: self.note,
        })
    }
}

/// Repository for purchases.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    store: Arc<dyn EntityStore>,
    settings: SettingsRepository,
}

impl PurchaseRepository {
    /// Creates a new purchase repository.
    #[must_use]
    pub const fn new(store: Arc<dyn EntityStore>, settings: SettingsRepository) -> Self {
        Self { store, settings }
    }

    /// Records a purchase.
    pub async fn record_purchase(&self, input: PurchaseInput) -> Result<PurchaseTransaction, RepositoryError> {
        let purchase = input.into_purchase(PurchaseId::new())?;
        self.put(&purchase).await?;
        info!(purchase_id = %purchase.id, item = %purchase.item, "Recorded purchase");
        Ok(purchase)
    }

    /// Replaces a purchase's fields.
    pub async fn update_purchase(
        &self,
        id: PurchaseId,
        input: PurchaseInput,
    ) -> Result<PurchaseTransaction, RepositoryError> {
        let _: PurchaseTransaction = require(self.store.as_ref(), Collection::Purchases, id.into_inner()).await?;
        let purchase = input.into_purchase(id)?;
        self.put(&purchase).await?;
        info!(purchase_id = %id, "Updated purchase");
        Ok(purchase)
    }

    /// Deletes a purchase.
    pub async fn delete_purchase(&self, id: PurchaseId) -> Result<(), RepositoryError> {
        let mut batch = WriteBatch::new();
        batch.delete(Collection::Purchases, id.into_inner());
        self.store.commit(batch).await?;
        info!(purchase_id = %id, "Deleted purchase");
        Ok(())
    }

    /// Returns the purchase, if it exists.
    pub async fn get_purchase(&self, id: PurchaseId) -> Result<Option<PurchaseTransaction>, RepositoryError> {
        fetch(self.store.as_ref(), Collection::Purchases, id.into_inner()).await
    }

    /// Lists purchases passing `filter`, in creation order.
    pub async fn list_purchases(&self, filter: &PurchaseFilter) -> Result<Vec<PurchaseTransaction>, RepositoryError> {
        let purchases: Vec<PurchaseTransaction> = fetch_all(self.store.as_ref(), Collection::Purchases).await?;
        Ok(purchases
            .into_iter()
            .filter(|purchase| filter.matches(purchase))
            .collect())
    }

    /// GL/GV position over all purchases and over those passing `filter`.
    pub async fn billing_overview(&self, filter: &PurchaseFilter) -> Result<BillingOverview, RepositoryError> {
        let purchases: Vec<PurchaseTransaction> = fetch_all(self.store.as_ref(), Collection::Purchases).await?;
        let bags_per_ton = self.settings.bags_per_ton().await?;
        Ok(BillingService::overview(&purchases, filter, bags_per_ton))
    }

    async fn put(&self, purchase: &PurchaseTransaction) -> Result<(), RepositoryError> {
        let mut batch = WriteBatch::new();
        batch.put(Collection::Purchases, purchase.id.into_inner(), encode(purchase)?);
        self.store.commit(batch).await?;
        Ok(())
    }
}
