//! Dashboard snapshot over the live collections.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use cemtrade_core::billing::PurchaseTransaction;
use cemtrade_core::customer::{Customer, PaymentTransaction, SalesTransaction};
use cemtrade_core::dashboard::{DashboardInput, DashboardService, DashboardSnapshot};
use cemtrade_core::expense::ExpenseTransaction;
use cemtrade_core::ledger::Account;
use cemtrade_core::reminder::Reminder;
use cemtrade_core::stock::StockItem;

use super::settings::SettingsRepository;
use crate::error::RepositoryError;
use crate::records::fetch_all;
use crate::store::{Collection, EntityStore};

/// Repository that assembles the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardRepository {
    store: Arc<dyn EntityStore>,
    settings: SettingsRepository,
}

impl DashboardRepository {
    /// Creates a new dashboard repository.
    #[must_use]
    pub const fn new(store: Arc<dyn EntityStore>, settings: SettingsRepository) -> Self {
        Self { store, settings }
    }

    /// Computes the dashboard as of `today`.
    pub async fn snapshot(&self, today: NaiveDate) -> Result<DashboardSnapshot, RepositoryError> {
        let store = self.store.as_ref();
        let customers: Vec<Customer> = fetch_all(store, Collection::Customers).await?;
        let sales: Vec<SalesTransaction> = fetch_all(store, Collection::Sales).await?;
        let payments: Vec<PaymentTransaction> = fetch_all(store, Collection::Payments).await?;
        let expenses: Vec<ExpenseTransaction> = fetch_all(store, Collection::Expenses).await?;
        let accounts: Vec<Account> = fetch_all(store, Collection::Accounts).await?;
        let stocks: Vec<StockItem> = fetch_all(store, Collection::Stocks).await?;
        let purchases: Vec<PurchaseTransaction> = fetch_all(store, Collection::Purchases).await?;
        let reminders: Vec<Reminder> = fetch_all(store, Collection::Reminders).await?;
        let bags_per_ton = self.settings.bags_per_ton().await?;

        debug!(
            customers = customers.len(),
            sales = sales.len(),
            payments = payments.len(),
            "Building dashboard snapshot"
        );
        Ok(DashboardService::build(&DashboardInput {
            today,
            customers: &customers,
            sales: &sales,
            payments: &payments,
            expenses: &expenses,
            accounts: &accounts,
            stocks: &stocks,
            purchases: &purchases,
            reminders: &reminders,
            bags_per_ton,
        }))
    }
}
