//! Dashboard data types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cemtrade_shared::types::{ReminderId, ShopId};

use crate::billing::{BillingSummary, PurchaseTransaction};
use crate::customer::{Customer, PaymentTransaction, SalesTransaction};
use crate::expense::ExpenseTransaction;
use crate::ledger::Account;
use crate::reminder::Reminder;
use crate::settings::BagsPerTon;
use crate::stock::StockItem;

/// Everything the dashboard is computed from.
#[derive(Debug, Clone, Copy)]
pub struct DashboardInput<'a> {
    /// Day the snapshot is taken.
    pub today: NaiveDate,
    /// All customers.
    pub customers: &'a [Customer],
    /// All sales.
    pub sales: &'a [SalesTransaction],
    /// All payments.
    pub payments: &'a [PaymentTransaction],
    /// All expenses.
    pub expenses: &'a [ExpenseTransaction],
    /// All accounts.
    pub accounts: &'a [Account],
    /// All shops.
    pub stocks: &'a [StockItem],
    /// All purchases.
    pub purchases: &'a [PurchaseTransaction],
    /// All reminders.
    pub reminders: &'a [Reminder],
    /// Conversion used for the GL/GV position.
    pub bags_per_ton: BagsPerTon,
}

/// Money figures for one window of time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTotals {
    /// Sales booked.
    pub sales: Decimal,
    /// Payments received.
    pub collections: Decimal,
    /// Expenses paid.
    pub expenses: Decimal,
    /// Gross margin on sales with both prices recorded.
    pub margin: Decimal,
}

/// A shop at or below its threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockShop {
    /// The shop.
    pub shop_id: ShopId,
    /// Shop name.
    pub shop: String,
    /// Quantity on hand.
    pub quantity: Decimal,
    /// Configured threshold.
    pub threshold: Decimal,
}

/// A reminder as listed on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderLine {
    /// The reminder.
    pub id: ReminderId,
    /// Customer name.
    pub customer: String,
    /// Amount to collect.
    pub amount: Decimal,
    /// Due date.
    pub due_date: NaiveDate,
}

impl From<&Reminder> for ReminderLine {
    fn from(reminder: &Reminder) -> Self {
        Self {
            id: reminder.id,
            customer: reminder.customer.clone(),
            amount: reminder.amount,
            due_date: reminder.due_date,
        }
    }
}

/// Dashboard figures as of one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    /// Day the snapshot was taken.
    pub as_of: NaiveDate,
    /// Sum of what customers owe.
    pub total_receivable: Decimal,
    /// Sum of what customers have paid in advance.
    pub total_advances: Decimal,
    /// Sum of all account balances.
    pub total_cash: Decimal,
    /// Figures for `as_of` alone.
    pub today: PeriodTotals,
    /// Figures from the first of the month up to `as_of`.
    pub month_to_date: PeriodTotals,
    /// Shops at or below threshold, by name.
    pub low_stock: Vec<LowStockShop>,
    /// Open reminders past their due date, oldest first.
    pub overdue_reminders: Vec<ReminderLine>,
    /// Open reminders due today or later, soonest first.
    pub upcoming_reminders: Vec<ReminderLine>,
    /// GL/GV position over every purchase.
    pub billing: BillingSummary,
}
