//! Stock repository: shops and the Stock Quantity Reconciler.
//!
//! `StockItem.quantity` is only changed through store-side increments, one
//! per shop per logical change. A shop's status is derived on read.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{info, warn};

use cemtrade_core::ledger::LedgerError;
use cemtrade_core::stock::{
    StockAdjustment, StockEdit, StockItem, StockService, StockTransaction, StockTransactionType,
    TransferLegs, TransferRequest,
};
use cemtrade_shared::types::{ShopId, StockTransactionId, StockTransferId};

use crate::error::RepositoryError;
use crate::records::{encode, fetch, fetch_all, find, require};
use crate::store::{Collection, EntityStore, WriteBatch};

/// Field holding a shop's materialized quantity.
pub const QUANTITY_FIELD: &str = "quantity";

/// Input for creating a shop.
#[derive(Debug, Clone)]
pub struct CreateShopInput {
    /// Shop name.
    pub shop: String,
    /// Quantity on hand when the shop is added.
    pub quantity: Decimal,
    /// Unit the quantity is counted in.
    pub unit: String,
    /// Low-stock threshold.
    pub threshold: Decimal,
}

/// Input for updating a shop. `None` leaves a field unchanged; the quantity
/// only moves through stock movements.
#[derive(Debug, Clone, Default)]
pub struct UpdateShopInput {
    /// New name.
    pub shop: Option<String>,
    /// New unit.
    pub unit: Option<String>,
    /// New threshold.
    pub threshold: Option<Decimal>,
}

/// Input for recording or editing a stock movement.
#[derive(Debug, Clone)]
pub struct StockMovementInput {
    /// Shop whose quantity moves.
    pub shop_id: ShopId,
    /// Movement type.
    pub kind: StockTransactionType,
    /// Quantity; must be positive.
    pub quantity: Decimal,
    /// Movement date.
    pub date: NaiveDate,
    /// Product moved.
    pub product: Option<String>,
    /// Free-text note.
    pub note: Option<String>,
}

/// Input for moving stock between shops.
#[derive(Debug, Clone)]
pub struct TransferInput {
    /// Sending shop.
    pub from: ShopId,
    /// Receiving shop.
    pub to: ShopId,
    /// Quantity moved; must be positive.
    pub quantity: Decimal,
    /// Transfer date.
    pub date: NaiveDate,
    /// Product moved.
    pub product: Option<String>,
}

/// Repository for shops and stock movements.
#[derive(Debug, Clone)]
pub struct StockRepository {
    store: Arc<dyn EntityStore>,
}

impl StockRepository {
    /// Creates a new stock repository.
    #[must_use]
    pub const fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    // ========== Shops ==========

    /// Creates a shop.
    pub async fn create_shop(&self, input: CreateShopInput) -> Result<StockItem, RepositoryError> {
        let item = StockItem {
            id: ShopId::new(),
            shop: input.shop,
            quantity: input.quantity,
            unit: input.unit,
            threshold: input.threshold,
        };
        let mut batch = WriteBatch::new();
        batch.put(Collection::Stocks, item.id.into_inner(), encode(&item)?);
        self.store.commit(batch).await?;

        info!(shop_id = %item.id, shop = %item.shop, quantity = %item.quantity, "Created shop");
        Ok(item)
    }

    /// Updates a shop's name, unit or threshold.
    pub async fn update_shop(&self, id: ShopId, input: UpdateShopInput) -> Result<StockItem, RepositoryError> {
        let current = self.require_shop(id).await?;
        let mut batch = WriteBatch::new();
        batch.merge(
            Collection::Stocks,
            id.into_inner(),
            json!({
                "shop": input.shop.unwrap_or(current.shop),
                "unit": input.unit.unwrap_or(current.unit),
                "threshold": input.threshold.unwrap_or(current.threshold),
            }),
        );
        self.store.commit(batch).await?;

        info!(shop_id = %id, "Updated shop");
        self.require_shop(id).await
    }

    /// Returns the shop, if it exists.
    pub async fn get_shop(&self, id: ShopId) -> Result<Option<StockItem>, RepositoryError> {
        fetch(self.store.as_ref(), Collection::Stocks, id.into_inner()).await
    }

    /// Lists every shop in creation order.
    pub async fn list_shops(&self) -> Result<Vec<StockItem>, RepositoryError> {
        fetch_all(self.store.as_ref(), Collection::Stocks).await
    }

    /// Stages one signed change of a shop's quantity. Zero deltas stage nothing.
    pub fn stage_adjustment(batch: &mut WriteBatch, adjustment: &StockAdjustment) {
        batch.increment(
            Collection::Stocks,
            adjustment.shop_id.into_inner(),
            QUANTITY_FIELD,
            adjustment.delta,
        );
    }

    // ========== Movements ==========

    /// Records a movement and applies its delta to the shop.
    pub async fn record_movement(&self, input: StockMovementInput) -> Result<StockTransaction, RepositoryError> {
        LedgerError::ensure_positive_quantity(input.quantity)?;
        let shop = self.require_shop(input.shop_id).await?;
        let movement = StockTransaction {
            id: StockTransactionId::new(),
            shop_id: shop.id,
            kind: input.kind,
            quantity: input.quantity,
            unit: shop.unit,
            date: input.date,
            product: input.product,
            note: input.note,
            transfer_id: None,
        };

        let mut batch = WriteBatch::new();
        batch.put(Collection::StockTransactions, movement.id.into_inner(), encode(&movement)?);
        Self::stage_adjustment(
            &mut batch,
            &StockAdjustment::new(
                movement.shop_id,
                StockService::apply_delta(movement.kind, movement.quantity),
            ),
        );
        self.store.commit(batch).await?;

        info!(
            movement_id = %movement.id,
            shop_id = %movement.shop_id,
            kind = ?movement.kind,
            quantity = %movement.quantity,
            "Recorded stock movement"
        );
        Ok(movement)
    }

    /// Edits a movement with one net delta per affected shop.
    ///
    /// For a transfer leg only quantity, date, product and note may change;
    /// both legs follow the new quantity and date. Returns the records written.
    pub async fn update_movement(
        &self,
        id: StockTransactionId,
        input: StockMovementInput,
    ) -> Result<Vec<StockTransaction>, RepositoryError> {
        let old: StockTransaction =
            require(self.store.as_ref(), Collection::StockTransactions, id.into_inner()).await?;
        let edit = StockEdit {
            shop_id: input.shop_id,
            kind: input.kind,
            quantity: input.quantity,
        };

        let mut batch = WriteBatch::new();
        let updated: Vec<StockTransaction> = match old.transfer_id {
            Some(transfer_id) => {
                if edit.kind != old.kind || edit.shop_id != old.shop_id {
                    return Err(LedgerError::TransferLegEdit(old.id).into());
                }
                match self.transfer_legs(transfer_id).await? {
                    Some(legs) => {
                        let adjustments = StockService::plan_transfer_edit(&legs, input.quantity)?;
                        for adjustment in &adjustments {
                            Self::stage_adjustment(&mut batch, adjustment);
                        }
                        [legs.outbound, legs.inbound]
                            .into_iter()
                            .map(|leg| StockTransaction {
                                quantity: input.quantity,
                                date: input.date,
                                product: input.product.clone(),
                                note: if leg.id == id { input.note.clone() } else { leg.note.clone() },
                                ..leg
                            })
                            .collect()
                    }
                    None => {
                        warn!(transfer_id = %transfer_id, "Transfer leg without its partner; editing it alone");
                        vec![self.stage_single_edit(&mut batch, &old, &edit, &input).await?]
                    }
                }
            }
            None => vec![self.stage_single_edit(&mut batch, &old, &edit, &input).await?],
        };

        for movement in &updated {
            batch.put(Collection::StockTransactions, movement.id.into_inner(), encode(movement)?);
        }
        self.store.commit(batch).await?;

        info!(movement_id = %id, records = updated.len(), "Updated stock movement");
        Ok(updated)
    }

    /// Deletes a movement and reverses its delta. Deleting either leg of a
    /// transfer deletes and reverses both. Returns the number of records removed.
    pub async fn delete_movement(&self, id: StockTransactionId) -> Result<usize, RepositoryError> {
        let old: StockTransaction =
            require(self.store.as_ref(), Collection::StockTransactions, id.into_inner()).await?;

        let doomed = match old.transfer_id {
            Some(transfer_id) => {
                let legs = self.legs_of(transfer_id).await?;
                if legs.is_empty() { vec![old] } else { legs }
            }
            None => vec![old],
        };

        let mut batch = WriteBatch::new();
        for movement in &doomed {
            batch.delete(Collection::StockTransactions, movement.id.into_inner());
            Self::stage_adjustment(
                &mut batch,
                &StockAdjustment::new(
                    movement.shop_id,
                    StockService::reverse_delta(movement.kind, movement.quantity),
                ),
            );
        }
        self.store.commit(batch).await?;

        info!(movement_id = %id, records = doomed.len(), "Deleted stock movement");
        Ok(doomed.len())
    }

    /// Moves stock between two shops: a `Transfer Out` and a `Transfer In`
    /// sharing a `transferId`, plus both quantity changes, in one commit.
    pub async fn transfer_stock(&self, input: TransferInput) -> Result<TransferLegs, RepositoryError> {
        let from = self.require_shop(input.from).await?;
        let to = self.require_shop(input.to).await?;
        let legs = StockService::transfer_legs(&TransferRequest {
            from: &from,
            to: &to,
            quantity: input.quantity,
            date: input.date,
            product: input.product,
        })?;

        let mut batch = WriteBatch::new();
        for leg in [&legs.outbound, &legs.inbound] {
            batch.put(Collection::StockTransactions, leg.id.into_inner(), encode(leg)?);
        }
        for adjustment in &legs.adjustments() {
            Self::stage_adjustment(&mut batch, adjustment);
        }
        self.store.commit(batch).await?;

        info!(
            transfer_id = %legs.transfer_id,
            from = %from.shop,
            to = %to.shop,
            quantity = %input.quantity,
            "Transferred stock"
        );
        Ok(legs)
    }

    /// Lists movements in creation order, optionally for one shop.
    pub async fn list_movements(&self, shop_id: Option<ShopId>) -> Result<Vec<StockTransaction>, RepositoryError> {
        match shop_id {
            Some(shop_id) => {
                find(
                    self.store.as_ref(),
                    Collection::StockTransactions,
                    "shopId",
                    shop_id.into_inner(),
                )
                .await
            }
            None => fetch_all(self.store.as_ref(), Collection::StockTransactions).await,
        }
    }

    async fn stage_single_edit(
        &self,
        batch: &mut WriteBatch,
        old: &StockTransaction,
        edit: &StockEdit,
        input: &StockMovementInput,
    ) -> Result<StockTransaction, RepositoryError> {
        let adjustments = StockService::plan_edit(old, edit)?;
        let unit = if edit.shop_id == old.shop_id {
            old.unit.clone()
        } else {
            self.require_shop(edit.shop_id).await?.unit
        };
        for adjustment in &adjustments {
            Self::stage_adjustment(batch, adjustment);
        }
        Ok(StockTransaction {
            id: old.id,
            shop_id: edit.shop_id,
            kind: edit.kind,
            quantity: edit.quantity,
            unit,
            date: input.date,
            product: input.product.clone(),
            note: input.note.clone(),
            transfer_id: old.transfer_id,
        })
    }

    async fn legs_of(&self, transfer_id: StockTransferId) -> Result<Vec<StockTransaction>, RepositoryError> {
        find(
            self.store.as_ref(),
            Collection::StockTransactions,
            "transferId",
            transfer_id.into_inner(),
        )
        .await
    }

    async fn transfer_legs(&self, transfer_id: StockTransferId) -> Result<Option<TransferLegs>, RepositoryError> {
        let mut outbound = None;
        let mut inbound = None;
        for leg in self.legs_of(transfer_id).await? {
            match leg.kind {
                StockTransactionType::TransferOut => outbound = Some(leg),
                StockTransactionType::TransferIn => inbound = Some(leg),
                _ => {}
            }
        }
        Ok(outbound.zip(inbound).map(|(outbound, inbound)| TransferLegs {
            transfer_id,
            outbound,
            inbound,
        }))
    }

    async fn require_shop(&self, id: ShopId) -> Result<StockItem, RepositoryError> {
        require(self.store.as_ref(), Collection::Stocks, id.into_inner()).await
    }
}
