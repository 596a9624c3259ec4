//! General ledger transaction domain types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cemtrade_shared::types::{
    AccountId, ExpenseId, FundTransferId, LedgerTransactionId, PaymentId,
};

/// Type of ledger transaction against an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// Money received into the account (balance goes up).
    Credit,
    /// Money paid out of the account (balance goes down).
    Debit,
}

impl EntryType {
    /// Returns the signed effect of `amount` on the account balance.
    ///
    /// Credit adds, Debit subtracts.
    #[must_use]
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            Self::Credit => amount,
            Self::Debit => -amount,
        }
    }

    /// Returns the opposite entry type.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::Credit => Self::Debit,
            Self::Debit => Self::Credit,
        }
    }
}

/// Category shown on a ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LedgerCategory {
    /// Payment received from a customer.
    SalesPayment,
    /// Expense paid out of an account.
    Expense,
    /// One leg of a transfer between two accounts.
    FundTransfer,
    /// Free-form category entered by the user.
    Other(String),
}

impl LedgerCategory {
    /// Returns the display label stored in the record.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::SalesPayment => "Sales Payment",
            Self::Expense => "Expense",
            Self::FundTransfer => "Fund Transfer",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for LedgerCategory {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Sales Payment" => Self::SalesPayment,
            "Expense" => Self::Expense,
            "Fund Transfer" => Self::FundTransfer,
            _ => Self::Other(value),
        }
    }
}

impl From<LedgerCategory> for String {
    fn from(value: LedgerCategory) -> Self {
        match value {
            LedgerCategory::Other(label) => label,
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for LedgerCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Back-reference from a ledger transaction to the domain record that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkRef {
    /// Owned by a customer payment.
    Payment(PaymentId),
    /// Owned by an expense.
    Expense(ExpenseId),
    /// One of the two legs of a fund transfer.
    FundTransfer(FundTransferId),
}

impl LinkRef {
    /// Name of the back-reference field on the stored record.
    #[must_use]
    pub const fn field_name(&self) -> &'static str {
        match self {
            Self::Payment(_) => "paymentId",
            Self::Expense(_) => "expenseId",
            Self::FundTransfer(_) => "transferId",
        }
    }

    /// Raw value of the back-reference.
    #[must_use]
    pub const fn value(&self) -> Uuid {
        match self {
            Self::Payment(id) => id.0,
            Self::Expense(id) => id.0,
            Self::FundTransfer(id) => id.0,
        }
    }
}

impl std::fmt::Display for LinkRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.field_name(), self.value())
    }
}

/// A Credit/Debit entry against an account.
///
/// Entries carrying a back-reference are owned by their payment, expense or
/// fund transfer and move in lockstep with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalTransaction {
    /// Unique identifier.
    pub id: LedgerTransactionId,
    /// The account this entry moves money in or out of.
    pub account_id: AccountId,
    /// Credit or Debit.
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// Unsigned amount.
    pub amount: Decimal,
    /// Value date.
    pub date: NaiveDate,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Category label.
    pub category: LedgerCategory,
    /// Owning payment, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<PaymentId>,
    /// Owning expense, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expense_id: Option<ExpenseId>,
    /// Owning fund transfer, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_id: Option<FundTransferId>,
}

impl GlobalTransaction {
    /// Builds an entry owned by `link`.
    #[must_use]
    pub fn linked(
        link: LinkRef,
        account_id: AccountId,
        entry_type: EntryType,
        amount: Decimal,
        date: NaiveDate,
        description: String,
        category: LedgerCategory,
    ) -> Self {
        let mut entry = Self {
            id: LedgerTransactionId::new(),
            account_id,
            entry_type,
            amount,
            date,
            description,
            category,
            payment_id: None,
            expense_id: None,
            transfer_id: None,
        };
        match link {
            LinkRef::Payment(id) => entry.payment_id = Some(id),
            LinkRef::Expense(id) => entry.expense_id = Some(id),
            LinkRef::FundTransfer(id) => entry.transfer_id = Some(id),
        }
        entry
    }

    /// Returns the signed effect on the account balance (Credit +, Debit -).
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.entry_type.signed(self.amount)
    }

    /// Returns the owning record, if this entry is linked.
    #[must_use]
    pub fn link(&self) -> Option<LinkRef> {
        self.payment_id
            .map(LinkRef::Payment)
            .or_else(|| self.expense_id.map(LinkRef::Expense))
            .or_else(|| self.transfer_id.map(LinkRef::FundTransfer))
    }

    /// Returns true if a domain record owns this entry.
    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.link().is_some()
    }
}
