//! Ledger error types for domain rule violations.
//!
//! Storage failures live in the persistence crate; this module only covers
//! inputs the ledger refuses to apply.

use rust_decimal::Decimal;
use thiserror::Error;

use cemtrade_shared::types::{AccountId, LedgerTransactionId, ShopId, StockTransactionId};

/// Errors that can occur while applying ledger rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Money amounts must be strictly positive.
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Stock quantities must be strictly positive.
    #[error("Quantity must be positive, got {0}")]
    NonPositiveQuantity(Decimal),

    /// Bags per ton must be strictly positive.
    #[error("Bags per ton must be positive, got {0}")]
    InvalidBagsPerTon(Decimal),

    // ========== Transfer Errors ==========
    /// Stock transfer source and destination are the same shop.
    #[error("Cannot transfer stock from shop {0} to itself")]
    SameShopTransfer(ShopId),

    /// Fund transfer source and destination are the same account.
    #[error("Cannot transfer funds from account {0} to itself")]
    SameAccountTransfer(AccountId),

    // ========== Ownership Errors ==========
    /// The ledger transaction is owned by a payment, expense or transfer.
    #[error("Ledger transaction {0} is linked to another record and cannot be edited directly")]
    LinkedEntryReadOnly(LedgerTransactionId),

    /// A transfer leg's type cannot change on its own.
    #[error("Stock transaction {0} is a transfer leg; edit the transfer instead")]
    TransferLegEdit(StockTransactionId),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveAmount(_) => "NON_POSITIVE_AMOUNT",
            Self::NonPositiveQuantity(_) => "NON_POSITIVE_QUANTITY",
            Self::InvalidBagsPerTon(_) => "INVALID_BAGS_PER_TON",
            Self::SameShopTransfer(_) => "SAME_SHOP_TRANSFER",
            Self::SameAccountTransfer(_) => "SAME_ACCOUNT_TRANSFER",
            Self::LinkedEntryReadOnly(_) => "LINKED_ENTRY_READ_ONLY",
            Self::TransferLegEdit(_) => "TRANSFER_LEG_EDIT",
        }
    }

    /// Ensures a money amount is strictly positive.
    pub fn ensure_positive_amount(amount: Decimal) -> Result<(), Self> {
        if amount > Decimal::ZERO {
            Ok(())
        } else {
            Err(Self::NonPositiveAmount(amount))
        }
    }

    /// Ensures a stock quantity is strictly positive.
    pub fn ensure_positive_quantity(quantity: Decimal) -> Result<(), Self> {
        if quantity > Decimal::ZERO {
            Ok(())
        } else {
            Err(Self::NonPositiveQuantity(quantity))
        }
    }
}
