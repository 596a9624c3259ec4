//! Cash and bank accounts.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cemtrade_shared::types::AccountId;

/// A cash drawer, bank account or wallet that money moves through.
///
/// `balance` is a materialized running total. It is only ever changed by
/// signed-delta adjustments; `opening_balance` plus the account's ledger
/// transactions is the source it can be re-derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Display name, also used as the payment "method".
    pub name: String,
    /// Free-form kind, e.g. "Cash" or "Bank".
    #[serde(rename = "type", default)]
    pub account_type: String,
    /// Materialized running balance.
    pub balance: Decimal,
    /// Balance on the opening date.
    #[serde(default)]
    pub opening_balance: Decimal,
    /// Date the opening balance refers to.
    #[serde(default)]
    pub opening_date: Option<NaiveDate>,
}

impl Account {
    /// Creates an account whose running balance starts at its opening balance.
    #[must_use]
    pub fn open(
        name: impl Into<String>,
        account_type: impl Into<String>,
        opening_balance: Decimal,
        opening_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            id: AccountId::new(),
            name: name.into(),
            account_type: account_type.into(),
            balance: opening_balance,
            opening_balance,
            opening_date,
        }
    }
}
