//! Expense records.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cemtrade_shared::types::{AccountId, ExpenseId};

use crate::ledger::LinkedPosting;

/// Money paid out of an account to a vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseTransaction {
    /// Unique identifier.
    pub id: ExpenseId,
    /// Who was paid.
    #[serde(default)]
    pub vendor: String,
    /// Expense category, e.g. "Fuel" or "Labour".
    #[serde(default)]
    pub item: String,
    /// Amount paid.
    pub amount: Decimal,
    /// Payment date.
    pub date: NaiveDate,
    /// Account the money left. Legacy expenses may have none.
    #[serde(default)]
    pub account_id: Option<AccountId>,
    /// Free-text note.
    #[serde(default)]
    pub note: Option<String>,
}

impl ExpenseTransaction {
    /// The account posting this expense owns, if an account was selected.
    #[must_use]
    pub fn posting(&self) -> Option<LinkedPosting> {
        self.account_id
            .map(|account_id| LinkedPosting::new(account_id, self.amount))
    }

    /// Description carried by the linked ledger entry.
    #[must_use]
    pub fn ledger_description(&self) -> String {
        match (self.vendor.trim(), self.item.trim()) {
            ("", "") => "Expense".to_string(),
            (vendor, "") => vendor.to_string(),
            ("", item) => item.to_string(),
            (vendor, item) => format!("{item} - {vendor}"),
        }
    }
}
