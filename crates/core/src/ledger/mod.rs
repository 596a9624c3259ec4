//! Account ledger logic.
//!
//! This module implements the rules behind every account balance change:
//! - Ledger transactions (credits and debits) and their back-references
//! - Signed-delta balance adjustments and drift detection
//! - Net-delta planning for edits of linked records
//! - Error types for ledger rule violations

pub mod account;
pub mod balance;
pub mod entry;
pub mod error;
pub mod linked;

pub use account::Account;
pub use balance::{BalanceAdjustment, BalanceDrift, BalanceService, RunningBalance};
pub use entry::{EntryType, GlobalTransaction, LedgerCategory, LinkRef};
pub use error::LedgerError;
pub use linked::{LinkAction, LinkedEditPlan, LinkedEditService, LinkedPosting};
