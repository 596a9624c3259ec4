//! Account balance arithmetic.
//!
//! The adjuster's contract is a single signed delta per logical event:
//! `+amount` for a Credit, `-amount` for a Debit, the inverse on reversal,
//! and one net delta on edit.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cemtrade_shared::types::AccountId;

use super::entry::GlobalTransaction;

/// A signed change to one account's running balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceAdjustment {
    /// The account to adjust.
    pub account_id: AccountId,
    /// Signed delta added to the balance.
    pub delta: Decimal,
}

impl BalanceAdjustment {
    /// Creates a new adjustment.
    #[must_use]
    pub const fn new(account_id: AccountId, delta: Decimal) -> Self {
        Self { account_id, delta }
    }

    /// Returns the adjustment that undoes this one.
    #[must_use]
    pub fn inverse(self) -> Self {
        Self {
            account_id: self.account_id,
            delta: -self.delta,
        }
    }

    /// Returns true if applying this adjustment changes nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.delta.is_zero()
    }
}

/// Difference between an account's stored balance and its ledger-derived balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDrift {
    /// The account checked.
    pub account_id: AccountId,
    /// The materialized balance on the account record.
    pub stored: Decimal,
    /// Opening balance plus all ledger transactions.
    pub derived: Decimal,
}

impl BalanceDrift {
    /// Delta that brings the stored balance back to the derived one.
    #[must_use]
    pub fn correction(&self) -> Decimal {
        self.derived - self.stored
    }

    /// Returns true if the stored balance disagrees with the ledger.
    #[must_use]
    pub fn is_drifted(&self) -> bool {
        !self.correction().is_zero()
    }
}

/// Running balance information for one line of a statement.
///
/// - previous_balance: balance before this line
/// - current_balance: balance after this line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningBalance {
    /// Position of the line, starting at 1.
    pub sequence: u64,
    /// Balance before this line.
    pub previous_balance: Decimal,
    /// Balance after this line.
    pub current_balance: Decimal,
}

impl RunningBalance {
    /// Creates the running balance for the first line after an opening balance.
    #[must_use]
    pub fn first_entry(opening: Decimal, change: Decimal) -> Self {
        Self {
            sequence: 1,
            previous_balance: opening,
            current_balance: opening + change,
        }
    }

    /// Creates the running balance following `previous`.
    ///
    /// - current_balance[N] = previous_balance[N] + change
    /// - previous_balance[N] = current_balance[N-1]
    #[must_use]
    pub fn next_entry(previous: &Self, change: Decimal) -> Self {
        Self {
            sequence: previous.sequence + 1,
            previous_balance: previous.current_balance,
            current_balance: previous.current_balance + change,
        }
    }
}

/// Stateless account balance rules.
pub struct BalanceService;

impl BalanceService {
    /// Derives an account balance from its opening balance and ledger entries.
    ///
    /// Entries for other accounts are ignored, so the full collection can be passed in.
    #[must_use]
    pub fn derive<'a, I>(account_id: AccountId, opening_balance: Decimal, entries: I) -> Decimal
    where
        I: IntoIterator<Item = &'a GlobalTransaction>,
    {
        entries
            .into_iter()
            .filter(|entry| entry.account_id == account_id)
            .fold(opening_balance, |acc, entry| acc + entry.signed_amount())
    }

    /// Compares a stored balance against the ledger-derived one.
    #[must_use]
    pub fn check_drift<'a, I>(
        account_id: AccountId,
        stored: Decimal,
        opening_balance: Decimal,
        entries: I,
    ) -> BalanceDrift
    where
        I: IntoIterator<Item = &'a GlobalTransaction>,
    {
        BalanceDrift {
            account_id,
            stored,
            derived: Self::derive(account_id, opening_balance, entries),
        }
    }

    /// Merges adjustments for the same account and drops zero deltas.
    ///
    /// Order of first appearance is preserved.
    #[must_use]
    pub fn coalesce(adjustments: impl IntoIterator<Item = BalanceAdjustment>) -> Vec<BalanceAdjustment> {
        let mut merged: Vec<BalanceAdjustment> = Vec::new();
        for adjustment in adjustments {
            match merged
                .iter_mut()
                .find(|existing| existing.account_id == adjustment.account_id)
            {
                Some(existing) => existing.delta += adjustment.delta,
                None => merged.push(adjustment),
            }
        }
        merged.retain(|adjustment| !adjustment.is_noop());
        merged
    }
}
