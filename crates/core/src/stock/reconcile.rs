//! Stock quantity reconciliation.
//!
//! Every create, edit, delete and transfer is reduced to at most one signed
//! delta per shop, so the shop's quantity is never read-modified-written twice
//! for one logical change.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cemtrade_shared::types::{ShopId, StockTransactionId, StockTransferId};

use super::types::{StockItem, StockTransaction, StockTransactionType};
use crate::ledger::LedgerError;

/// A signed change to one shop's quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    /// The shop to adjust.
    pub shop_id: ShopId,
    /// Signed delta added to the quantity.
    pub delta: Decimal,
}

impl StockAdjustment {
    /// Creates a new adjustment.
    #[must_use]
    pub const fn new(shop_id: ShopId, delta: Decimal) -> Self {
        Self { shop_id, delta }
    }
}

/// Requested change to an existing stock transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockEdit {
    /// Shop after the edit.
    pub shop_id: ShopId,
    /// Type after the edit.
    pub kind: StockTransactionType,
    /// Quantity after the edit.
    pub quantity: Decimal,
}

/// Input for moving stock between two shops.
#[derive(Debug, Clone)]
pub struct TransferRequest<'a> {
    /// Shop the stock leaves.
    pub from: &'a StockItem,
    /// Shop the stock arrives at.
    pub to: &'a StockItem,
    /// Quantity moved.
    pub quantity: Decimal,
    /// Transfer date, shared by both legs.
    pub date: NaiveDate,
    /// Product moved.
    pub product: Option<String>,
}

/// The two records of a transfer plus the quantity changes they cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferLegs {
    /// Shared transfer id.
    pub transfer_id: StockTransferId,
    /// `Transfer Out` on the sending shop.
    pub outbound: StockTransaction,
    /// `Transfer In` on the receiving shop.
    pub inbound: StockTransaction,
}

impl TransferLegs {
    /// Quantity changes for both shops.
    #[must_use]
    pub fn adjustments(&self) -> [StockAdjustment; 2] {
        [
            StockAdjustment::new(self.outbound.shop_id, self.outbound.delta()),
            StockAdjustment::new(self.inbound.shop_id, self.inbound.delta()),
        ]
    }
}

/// Stateless stock quantity rules.
pub struct StockService;

impl StockService {
    /// Signed delta for applying a movement.
    #[must_use]
    pub fn apply_delta(kind: StockTransactionType, quantity: Decimal) -> Decimal {
        kind.delta(quantity)
    }

    /// Signed delta for undoing a movement.
    #[must_use]
    pub fn reverse_delta(kind: StockTransactionType, quantity: Decimal) -> Decimal {
        -kind.delta(quantity)
    }

    /// Single net delta for editing a movement on the same shop.
    ///
    /// - both subtracting: `old - new`
    /// - both adding: `new - old`
    /// - crossing sets: revert old, then apply new
    #[must_use]
    pub fn net_edit_delta(
        old_kind: StockTransactionType,
        old_quantity: Decimal,
        new_kind: StockTransactionType,
        new_quantity: Decimal,
    ) -> Decimal {
        match (old_kind.is_additive(), new_kind.is_additive()) {
            (false, false) => old_quantity - new_quantity,
            (true, true) => new_quantity - old_quantity,
            _ => Self::reverse_delta(old_kind, old_quantity) + Self::apply_delta(new_kind, new_quantity),
        }
    }

    /// Plans the quantity adjustments for editing `old` into `edit`.
    ///
    /// Same shop yields one net adjustment; a move to another shop reverts the
    /// old shop and applies to the new one. Zero deltas are dropped.
    pub fn plan_edit(
        old: &StockTransaction,
        edit: &StockEdit,
    ) -> Result<Vec<StockAdjustment>, LedgerError> {
        LedgerError::ensure_positive_quantity(edit.quantity)?;
        if old.transfer_id.is_some() && (edit.kind != old.kind || edit.shop_id != old.shop_id) {
            return Err(LedgerError::TransferLegEdit(old.id));
        }

        let adjustments = if edit.shop_id == old.shop_id {
            vec![StockAdjustment::new(
                old.shop_id,
                Self::net_edit_delta(old.kind, old.quantity, edit.kind, edit.quantity),
            )]
        } else {
            vec![
                StockAdjustment::new(old.shop_id, Self::reverse_delta(old.kind, old.quantity)),
                StockAdjustment::new(edit.shop_id, Self::apply_delta(edit.kind, edit.quantity)),
            ]
        };

        Ok(adjustments
            .into_iter()
            .filter(|adjustment| !adjustment.delta.is_zero())
            .collect())
    }

    /// Builds both legs of a transfer with cross-referencing notes.
    pub fn transfer_legs(request: &TransferRequest<'_>) -> Result<TransferLegs, LedgerError> {
        if request.from.id == request.to.id {
            return Err(LedgerError::SameShopTransfer(request.from.id));
        }
        LedgerError::ensure_positive_quantity(request.quantity)?;

        let transfer_id = StockTransferId::new();
        let unit = request.from.unit.clone();
        let outbound = StockTransaction {
            id: StockTransactionId::new(),
            shop_id: request.from.id,
            kind: StockTransactionType::TransferOut,
            quantity: request.quantity,
            unit: unit.clone(),
            date: request.date,
            product: request.product.clone(),
            note: Some(format!("Transfer to {}", request.to.shop)),
            transfer_id: Some(transfer_id),
        };
        let inbound = StockTransaction {
            id: StockTransactionId::new(),
            shop_id: request.to.id,
            kind: StockTransactionType::TransferIn,
            quantity: request.quantity,
            unit,
            date: request.date,
            product: request.product.clone(),
            note: Some(format!("Transfer from {}", request.from.shop)),
            transfer_id: Some(transfer_id),
        };

        Ok(TransferLegs {
            transfer_id,
            outbound,
            inbound,
        })
    }

    /// Plans the adjustments for changing a transfer's quantity on both legs.
    pub fn plan_transfer_edit(
        legs: &TransferLegs,
        new_quantity: Decimal,
    ) -> Result<Vec<StockAdjustment>, LedgerError> {
        LedgerError::ensure_positive_quantity(new_quantity)?;
        Ok([&legs.outbound, &legs.inbound]
            .into_iter()
            .map(|leg| {
                StockAdjustment::new(
                    leg.shop_id,
                    Self::net_edit_delta(leg.kind, leg.quantity, leg.kind, new_quantity),
                )
            })
            .filter(|adjustment| !adjustment.delta.is_zero())
            .collect())
    }
}
