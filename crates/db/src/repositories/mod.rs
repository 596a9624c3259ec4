//! Repository abstractions for data access.
//!
//! Repositories turn domain operations into write batches against an
//! [`EntityStore`], committing each logical change exactly once.

pub mod account;
pub mod customer;
pub mod dashboard;
pub mod expense;
pub mod ledger;
pub mod payment;
pub mod product;
pub mod purchase;
pub mod reminder;
pub mod sales;
pub mod settings;
pub mod stock;

use std::sync::Arc;

use cemtrade_core::settings::BagsPerTon;

use crate::store::EntityStore;

pub use account::{AccountRepository, CreateAccountInput, UpdateAccountInput};
pub use customer::{
    BackfillReport, CreateCustomerInput, CustomerRepository, LegacyRecord, UpdateCustomerInput,
};
pub use dashboard::DashboardRepository;
pub use expense::{ExpenseInput, ExpenseRepository};
pub use ledger::{FundTransfer, FundTransferInput, LedgerEntryInput, LedgerRepository, LinkedEntryDetails};
pub use payment::{PaymentInput, PaymentRepository};
pub use product::ProductRepository;
pub use purchase::{PurchaseInput, PurchaseRepository};
pub use reminder::{ReminderInput, ReminderRepository};
pub use sales::{SaleInput, SalesRepository};
pub use settings::{SETTINGS_ID, SettingsRepository};
pub use stock::{CreateShopInput, StockMovementInput, StockRepository, TransferInput, UpdateShopInput};

/// Every repository, sharing one store.
#[derive(Debug, Clone)]
pub struct Repositories {
    /// Accounts and balance adjustment.
    pub accounts: AccountRepository,
    /// Ledger transactions, linked and manual.
    pub ledger: LedgerRepository,
    /// Customers and derived balances.
    pub customers: CustomerRepository,
    /// Sales.
    pub sales: SalesRepository,
    /// Customer payments.
    pub payments: PaymentRepository,
    /// Expenses.
    pub expenses: ExpenseRepository,
    /// Purchases and GL/GV billing.
    pub purchases: PurchaseRepository,
    /// Shops and stock movements.
    pub stock: StockRepository,
    /// Reminders.
    pub reminders: ReminderRepository,
    /// Products.
    pub products: ProductRepository,
    /// Settings document.
    pub settings: SettingsRepository,
    /// Dashboard.
    pub dashboard: DashboardRepository,
}

impl Repositories {
    /// Builds every repository over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn EntityStore>, default_bags_per_ton: BagsPerTon) -> Self {
        let settings = SettingsRepository::new(store.clone(), default_bags_per_ton);
        Self {
            accounts: AccountRepository::new(store.clone()),
            ledger: LedgerRepository::new(store.clone()),
            customers: CustomerRepository::new(store.clone()),
            sales: SalesRepository::new(store.clone()),
            payments: PaymentRepository::new(store.clone()),
            expenses: ExpenseRepository::new(store.clone()),
            purchases: PurchaseRepository::new(store.clone(), settings.clone()),
            stock: StockRepository::new(store.clone()),
            reminders: ReminderRepository::new(store.clone()),
            products: ProductRepository::new(store.clone()),
            dashboard: DashboardRepository::new(store, settings.clone()),
            settings,
        }
    }
}
