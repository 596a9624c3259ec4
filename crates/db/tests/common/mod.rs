//! Shared fixtures for repository integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use cemtrade_core::customer::Customer;
use cemtrade_core::ledger::Account;
use cemtrade_core::settings::BagsPerTon;
use cemtrade_core::stock::StockItem;
use cemtrade_db::repositories::{CreateAccountInput, CreateCustomerInput, CreateShopInput};
use cemtrade_db::{Collection, EntityStore, MemoryStore, Repositories};
use cemtrade_shared::types::{AccountId, ShopId};

/// A fresh in-memory store with every repository wired to it.
pub struct Harness {
    pub store: Arc<dyn EntityStore>,
    pub repos: Repositories,
}

impl Harness {
    pub fn new() -> Self {
        let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());
        let repos = Repositories::new(store.clone(), BagsPerTon::default());
        Self { store, repos }
    }

    pub async fn account(&self, name: &str, opening: Decimal) -> Account {
        self.repos
            .accounts
            .create_account(CreateAccountInput {
                name: name.to_string(),
                account_type: "Cash".to_string(),
                opening_balance: opening,
                opening_date: Some(day(1)),
            })
            .await
            .unwrap()
    }

    pub async fn balance(&self, id: AccountId) -> Decimal {
        self.repos
            .accounts
            .get_account(id)
            .await
            .unwrap()
            .unwrap()
            .balance
    }

    pub async fn customer(&self, name: &str, opening: Decimal) -> Customer {
        self.repos
            .customers
            .create_customer(CreateCustomerInput {
                name: name.to_string(),
                opening_balance: opening,
                ..CreateCustomerInput::default()
            })
            .await
            .unwrap()
    }

    pub async fn shop(&self, name: &str, quantity: Decimal, threshold: Decimal) -> StockItem {
        self.repos
            .stock
            .create_shop(CreateShopInput {
                shop: name.to_string(),
                quantity,
                unit: "bags".to_string(),
                threshold,
            })
            .await
            .unwrap()
    }

    pub async fn quantity(&self, id: ShopId) -> Decimal {
        self.repos.stock.get_shop(id).await.unwrap().unwrap().quantity
    }

    pub async fn count(&self, collection: Collection) -> usize {
        self.store.list(collection).await.unwrap().len()
    }
}

/// A day in June 2024.
pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}
