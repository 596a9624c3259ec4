//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `ShopId` where an `AccountId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(CustomerId, "Unique identifier for a customer.");
typed_id!(SaleId, "Unique identifier for a sales transaction.");
typed_id!(PaymentId, "Unique identifier for a payment received from a customer.");
typed_id!(PurchaseId, "Unique identifier for a purchase transaction.");
typed_id!(ExpenseId, "Unique identifier for an expense transaction.");
typed_id!(ShopId, "Unique identifier for a shop's stock item.");
typed_id!(StockTransactionId, "Unique identifier for a stock transaction.");
typed_id!(StockTransferId, "Shared identifier linking the two legs of a stock transfer.");
typed_id!(AccountId, "Unique identifier for a cash or bank account.");
typed_id!(
    LedgerTransactionId,
    "Unique identifier for a general ledger transaction."
);
typed_id!(FundTransferId, "Shared identifier linking the two legs of a fund transfer.");
typed_id!(ProductId, "Unique identifier for a product.");
typed_id!(ReminderId, "Unique identifier for a payment reminder.");
