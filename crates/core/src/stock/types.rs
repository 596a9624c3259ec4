//! Shop stock items and stock movements.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cemtrade_shared::types::{ShopId, StockTransactionId, StockTransferId};

/// Stock level classification, derived from quantity and threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockStatus {
    /// Quantity is above the threshold.
    Normal,
    /// Quantity is at or below the threshold.
    #[serde(rename = "Low Stock")]
    LowStock,
}

impl StockStatus {
    /// Classifies a quantity against a threshold.
    #[must_use]
    pub fn classify(quantity: Decimal, threshold: Decimal) -> Self {
        if quantity > threshold {
            Self::Normal
        } else {
            Self::LowStock
        }
    }
}

/// A shop and the quantity of stock it holds.
///
/// `quantity` is a materialized running total changed only by signed deltas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockItem {
    /// Unique identifier.
    pub id: ShopId,
    /// Shop name.
    pub shop: String,
    /// Quantity on hand.
    pub quantity: Decimal,
    /// Unit the quantity is counted in.
    #[serde(default)]
    pub unit: String,
    /// Quantity at or below which the shop is "Low Stock".
    #[serde(default)]
    pub threshold: Decimal,
}

impl StockItem {
    /// Status derived from the current fields alone.
    #[must_use]
    pub fn status(&self) -> StockStatus {
        StockStatus::classify(self.quantity, self.threshold)
    }
}

/// Kind of stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockTransactionType {
    /// Stock sold from the shop.
    Sale,
    /// Stock dumped at the shop.
    Dump,
    /// New stock received.
    #[serde(rename = "Add Stock")]
    AddStock,
    /// Receiving leg of a transfer.
    #[serde(rename = "Transfer In")]
    TransferIn,
    /// Sending leg of a transfer.
    #[serde(rename = "Transfer Out")]
    TransferOut,
}

impl StockTransactionType {
    /// Returns true if this movement adds to the shop's quantity.
    ///
    /// `Add Stock`, `Transfer In` and `Dump` add; `Sale` and `Transfer Out` subtract.
    #[must_use]
    pub const fn is_additive(self) -> bool {
        matches!(self, Self::AddStock | Self::TransferIn | Self::Dump)
    }

    /// Returns true if this movement is one leg of a transfer.
    #[must_use]
    pub const fn is_transfer(self) -> bool {
        matches!(self, Self::TransferIn | Self::TransferOut)
    }

    /// Signed effect of moving `quantity` with this type.
    #[must_use]
    pub fn delta(self, quantity: Decimal) -> Decimal {
        if self.is_additive() { quantity } else { -quantity }
    }
}

/// A stock movement at one shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockTransaction {
    /// Unique identifier.
    pub id: StockTransactionId,
    /// Shop whose quantity moves.
    pub shop_id: ShopId,
    /// Movement type.
    #[serde(rename = "type")]
    pub kind: StockTransactionType,
    /// Unsigned quantity.
    pub quantity: Decimal,
    /// Unit the quantity is counted in.
    #[serde(default)]
    pub unit: String,
    /// Movement date.
    pub date: NaiveDate,
    /// Product moved.
    #[serde(default)]
    pub product: Option<String>,
    /// Free-text note.
    #[serde(default)]
    pub note: Option<String>,
    /// Shared id of the two legs of a transfer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_id: Option<StockTransferId>,
}

impl StockTransaction {
    /// Signed effect of this movement on its shop.
    #[must_use]
    pub fn delta(&self) -> Decimal {
        self.kind.delta(self.quantity)
    }
}
