//! Demo data seeder for Cemtrade development and testing.
//!
//! Seeds shops, accounts, customers, sales, payments, expenses, purchases and
//! reminders through the repositories, then checks every account against its
//! ledger and logs the resulting dashboard. Writes to the SQL database when
//! `database.url` is configured, otherwise to an in-memory store.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Datelike, Days, Local, NaiveDate};
use rust_decimal::Decimal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cemtrade_core::billing::{PurchaseSubCategory, Unit};
use cemtrade_core::settings::BagsPerTon;
use cemtrade_core::stock::StockTransactionType;
use cemtrade_db::repositories::{
    CreateAccountInput, CreateCustomerInput, CreateShopInput, ExpenseInput, FundTransferInput,
    PaymentInput, PurchaseInput, ReminderInput, SaleInput, StockMovementInput, TransferInput,
};
use cemtrade_db::{EntityStore, MemoryStore, Repositories, SqlStore};
use cemtrade_shared::AppConfig;
use cemtrade_shared::types::format_amount;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let bags_per_ton = BagsPerTon::new(config.ledger.bags_per_ton)
        .context("ledger.bags_per_ton must be positive")?;
    let today = config
        .seed
        .reference_date
        .unwrap_or_else(|| Local::now().date_naive());

    let store: Arc<dyn EntityStore> = match &config.database {
        Some(database) => Arc::new(
            SqlStore::connect(database)
                .await
                .context("Failed to connect to database")?,
        ),
        None => {
            info!("No database configured, seeding an in-memory store");
            Arc::new(MemoryStore::new())
        }
    };
    let repos = Repositories::new(store, bags_per_ton);

    info!(%today, "Seeding demo data");
    seed(&repos, &config.seed.shops, today).await?;

    for drift in repos.accounts.find_drifted().await? {
        warn!(account_id = %drift.account_id, stored = %drift.stored, derived = %drift.derived, "Seeded account drifted");
    }

    let dashboard = repos.dashboard.snapshot(today).await?;
    info!(
        receivable = %format_amount(dashboard.total_receivable),
        advances = %format_amount(dashboard.total_advances),
        cash = %format_amount(dashboard.total_cash),
        month_sales = %format_amount(dashboard.month_to_date.sales),
        month_margin = %format_amount(dashboard.month_to_date.margin),
        low_stock = dashboard.low_stock.len(),
        overdue = dashboard.overdue_reminders.len(),
        gl_gv_net_bags = %dashboard.billing.net_bags,
        gl_gv_status = ?dashboard.billing.status,
        "Seeding complete"
    );
    Ok(())
}

fn days_ago(today: NaiveDate, days: u64) -> NaiveDate {
    today.checked_sub_days(Days::new(days)).unwrap_or(today)
}

async fn seed(repos: &Repositories, shops: &[String], today: NaiveDate) -> Result<()> {
    let month_start = today.with_day(1).unwrap_or(today);

    // ========== Shops ==========
    let mut shop_ids = Vec::with_capacity(shops.len());
    for name in shops {
        let shop = repos
            .stock
            .create_shop(CreateShopInput {
                shop: name.clone(),
                quantity: Decimal::from(400),
                unit: "bags".to_string(),
                threshold: Decimal::from(50),
            })
            .await?;
        shop_ids.push(shop.id);
    }
    if let [main, other, ..] = shop_ids.as_slice() {
        repos
            .stock
            .transfer_stock(TransferInput {
                from: *main,
                to: *other,
                quantity: Decimal::from(60),
                date: month_start,
                product: Some("OPC 50kg".to_string()),
            })
            .await?;
    }
    if let Some(main) = shop_ids.first() {
        repos
            .stock
            .record_movement(StockMovementInput {
                shop_id: *main,
                kind: StockTransactionType::Sale,
                quantity: Decimal::from(300),
                date: today,
                product: Some("OPC 50kg".to_string()),
                note: None,
            })
            .await?;
    }

    // ========== Accounts ==========
    let cash = repos
        .accounts
        .create_account(CreateAccountInput {
            name: "Cash in Hand".to_string(),
            account_type: "Cash".to_string(),
            opening_balance: Decimal::from(250_000),
            opening_date: Some(month_start),
        })
        .await?;
    let bank = repos
        .accounts
        .create_account(CreateAccountInput {
            name: "Meezan Bank".to_string(),
            account_type: "Bank".to_string(),
            opening_balance: Decimal::from(1_000_000),
            opening_date: Some(month_start),
        })
        .await?;
    repos
        .ledger
        .transfer_funds(FundTransferInput {
            from: cash.id,
            to: bank.id,
            amount: Decimal::from(100_000),
            date: month_start,
            description: Some("Cash deposit".to_string()),
        })
        .await?;

    // ========== Customers, sales and payments ==========
    let customers = [
        ("Ali Traders", Decimal::from(45_000)),
        ("Baba Builders", Decimal::ZERO),
        ("Khan & Sons", Decimal::from(-10_000)),
    ];
    for (index, (name, opening)) in (0u64..).zip(customers) {
        let customer = repos
            .customers
            .create_customer(CreateCustomerInput {
                name: name.to_string(),
                register_date: Some(month_start),
                opening_balance: opening,
                opening_balance_date: Some(month_start),
                ..CreateCustomerInput::default()
            })
            .await?;

        let bags = Decimal::from(100 + 50 * index);
        repos
            .sales
            .record_sale(SaleInput {
                customer_id: customer.id,
                product: "OPC 50kg".to_string(),
                date: days_ago(today, index),
                amount: bags * Decimal::from(1_250),
                price_per_bag: Some(Decimal::from(1_250)),
                purchase_price: Some(Decimal::from(1_180)),
                note: None,
            })
            .await?;
        repos
            .payments
            .record_payment(PaymentInput {
                customer_id: customer.id,
                amount: Decimal::from(50_000),
                date: today,
                account_id: Some(if index % 2 == 0 { cash.id } else { bank.id }),
                note: None,
            })
            .await?;
        repos
            .reminders
            .create_reminder(ReminderInput {
                customer: name.to_string(),
                amount: Decimal::from(25_000),
                due_date: days_ago(today, 3)
                    .checked_add_days(Days::new(3 * index))
                    .unwrap_or(today),
                note: None,
            })
            .await?;
    }

    // ========== Expenses ==========
    repos
        .expenses
        .record_expense(ExpenseInput {
            vendor: "Shell".to_string(),
            item: "Diesel".to_string(),
            amount: Decimal::from(18_500),
            date: today,
            account_id: Some(cash.id),
            note: None,
        })
        .await?;
    repos
        .expenses
        .record_expense(ExpenseInput {
            vendor: "Landlord".to_string(),
            item: "Shop rent".to_string(),
            amount: Decimal::from(60_000),
            date: month_start,
            account_id: Some(bank.id),
            note: None,
        })
        .await?;

    // ========== Purchases ==========
    let purchases = [
        ("Lucky", PurchaseSubCategory::Gl, 20, 15, Unit::Tons),
        ("Bestway", PurchaseSubCategory::Gv, 300, 340, Unit::Bags),
        ("DG Khan", PurchaseSubCategory::Direct, 500, 500, Unit::Bags),
    ];
    for (item, sub_category, quantity, billed, unit) in purchases {
        repos
            .purchases
            .record_purchase(PurchaseInput {
                item: item.to_string(),
                sub_category,
                quantity: Decimal::from(quantity),
                billed_quantity: Decimal::from(billed),
                unit,
                date: month_start,
                vehicle_number: None,
                note: None,
            })
            .await?;
    }

    repos.products.create_product("OPC 50kg", Some("Cement".to_string())).await?;
    repos.products.create_product("SRC 50kg", Some("Cement".to_string())).await?;
    Ok(())
}
