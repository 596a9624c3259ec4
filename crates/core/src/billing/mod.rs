//! Purchases and GL/GV billing reconciliation.

pub mod reconcile;
pub mod types;


pub use reconcile::{BillingOverview, BillingService, BillingStatus, BillingSummary};
pub use types::{PurchaseFilter, PurchaseSubCategory, PurchaseTransaction, Unit};
