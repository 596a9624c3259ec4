//! Customer, sale and payment records.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cemtrade_shared::types::{AccountId, CustomerId, PaymentId, SaleId};

use crate::ledger::LinkedPosting;

/// A customer of the business.
///
/// The current balance is never stored; see `CustomerService::compute_balance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Unique identifier.
    pub id: CustomerId,
    /// Display name. Legacy sales and payments refer to customers by this name.
    pub name: String,
    /// Contact number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Date the customer was registered.
    #[serde(default)]
    pub register_date: Option<NaiveDate>,
    /// Balance owed (positive) or advanced (negative) on the opening date.
    #[serde(default)]
    pub opening_balance: Decimal,
    /// Date the opening balance refers to.
    #[serde(default)]
    pub opening_balance_date: Option<NaiveDate>,
    /// Free-form grouping, e.g. "Dealer" or "Contractor".
    #[serde(default)]
    pub category: Option<String>,
}

/// Records that belong to a customer, by id or (for legacy data) by name.
pub trait CustomerOwned {
    /// Stable customer reference, if the record has one.
    fn customer_id(&self) -> Option<CustomerId>;

    /// Customer name stored on legacy records.
    fn customer_name(&self) -> Option<&str>;

    /// Returns true if this record belongs to `customer`.
    ///
    /// Records with a `customer_id` match on it alone; records without one
    /// fall back to an exact (trimmed) name match.
    fn belongs_to(&self, customer: &Customer) -> bool {
        match self.customer_id() {
            Some(id) => id == customer.id,
            None => self
                .customer_name()
                .is_some_and(|name| name.trim() == customer.name.trim()),
        }
    }
}

/// A cement sale on credit. Does not move any account balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesTransaction {
    /// Unique identifier.
    pub id: SaleId,
    /// Owning customer.
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    /// Customer name, only meaningful on legacy records without `customer_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    /// Product description.
    #[serde(default)]
    pub product: String,
    /// Sale date.
    pub date: NaiveDate,
    /// Total billed to the customer.
    pub amount: Decimal,
    /// Selling price per bag.
    #[serde(default)]
    pub price_per_bag: Option<Decimal>,
    /// Cost price per bag.
    #[serde(default)]
    pub purchase_price: Option<Decimal>,
    /// Free-text note.
    #[serde(default)]
    pub note: Option<String>,
}

impl SalesTransaction {
    /// Number of bags implied by `amount / price_per_bag`.
    #[must_use]
    pub fn bags(&self) -> Option<Decimal> {
        self.price_per_bag
            .filter(|price| !price.is_zero())
            .and_then(|price| self.amount.checked_div(price))
    }

    /// Gross margin: `bags * (price_per_bag - purchase_price)`.
    #[must_use]
    pub fn margin(&self) -> Option<Decimal> {
        let price = self.price_per_bag?;
        let cost = self.purchase_price?;
        Some(self.bags()? * (price - cost))
    }
}

impl CustomerOwned for SalesTransaction {
    fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    fn customer_name(&self) -> Option<&str> {
        self.customer.as_deref()
    }
}

/// Money received from a customer into an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTransaction {
    /// Unique identifier.
    pub id: PaymentId,
    /// Paying customer.
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    /// Customer name, only meaningful on legacy records without `customer_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    /// Amount received.
    pub amount: Decimal,
    /// Date received.
    pub date: NaiveDate,
    /// Account that received the funds. Legacy payments may have none.
    #[serde(default)]
    pub account_id: Option<AccountId>,
    /// Display name of the receiving account.
    #[serde(default)]
    pub method: Option<String>,
    /// Free-text note.
    #[serde(default)]
    pub note: Option<String>,
}

impl PaymentTransaction {
    /// The account posting this payment owns, if an account was selected.
    #[must_use]
    pub fn posting(&self) -> Option<LinkedPosting> {
        self.account_id
            .map(|account_id| LinkedPosting::new(account_id, self.amount))
    }
}

impl CustomerOwned for PaymentTransaction {
    fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    fn customer_name(&self) -> Option<&str> {
        self.customer.as_deref()
    }
}
