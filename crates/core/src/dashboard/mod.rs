//! Dashboard snapshot.
//!
//! This module aggregates the live collections into the figures shown on the
//! dashboard:
//! - Receivables and advances from derived customer balances
//! - Cash across accounts
//! - Day and month-to-date sales, collections, expenses and margin
//! - Low-stock shops, reminders and the GL/GV position

pub mod service;
pub mod types;

pub use service::DashboardService;
pub use types::*;
