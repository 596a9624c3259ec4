//! Dashboard aggregation.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use super::types::{DashboardInput, DashboardSnapshot, LowStockShop, PeriodTotals, ReminderLine};
use crate::billing::BillingService;
use crate::customer::CustomerService;
use crate::reminder::ReminderStatus;
use crate::stock::StockStatus;

/// Stateless dashboard aggregation.
pub struct DashboardService;

impl DashboardService {
    /// Builds the dashboard snapshot from the full collections.
    #[must_use]
    pub fn build(input: &DashboardInput<'_>) -> DashboardSnapshot {
        let today = input.today;

        let (total_receivable, total_advances) = input
            .customers
            .iter()
            .map(|customer| CustomerService::compute_balance(customer, input.sales, input.payments))
            .fold((Decimal::ZERO, Decimal::ZERO), |(due, advance), balance| {
                (due + balance.amount_due(), advance + balance.advance())
            });

        let mut low_stock: Vec<LowStockShop> = input
            .stocks
            .iter()
            .filter(|item| item.status() == StockStatus::LowStock)
            .map(|item| LowStockShop {
                shop_id: item.id,
                shop: item.shop.clone(),
                quantity: item.quantity,
                threshold: item.threshold,
            })
            .collect();
        low_stock.sort_by(|a, b| a.shop.cmp(&b.shop));

        let mut overdue_reminders = Vec::new();
        let mut upcoming_reminders = Vec::new();
        for reminder in input.reminders {
            match reminder.status(today) {
                ReminderStatus::Overdue => overdue_reminders.push(ReminderLine::from(reminder)),
                ReminderStatus::Upcoming => upcoming_reminders.push(ReminderLine::from(reminder)),
                ReminderStatus::Completed => {}
            }
        }
        overdue_reminders.sort_by_key(|line| line.due_date);
        upcoming_reminders.sort_by_key(|line| line.due_date);

        DashboardSnapshot {
            as_of: today,
            total_receivable,
            total_advances,
            total_cash: input.accounts.iter().map(|account| account.balance).sum(),
            today: Self::period_totals(input, |date| date == today),
            month_to_date: Self::period_totals(input, |date| Self::in_month_to_date(date, today)),
            low_stock,
            overdue_reminders,
            upcoming_reminders,
            billing: BillingService::summarize(input.purchases, input.bags_per_ton),
        }
    }

    /// Returns true if `date` falls between the first of `today`'s month and `today`.
    #[must_use]
    pub fn in_month_to_date(date: NaiveDate, today: NaiveDate) -> bool {
        date.year() == today.year() && date.month() == today.month() && date <= today
    }

    fn period_totals(input: &DashboardInput<'_>, in_window: impl Fn(NaiveDate) -> bool) -> PeriodTotals {
        let window_sales = input.sales.iter().filter(|sale| in_window(sale.date));

        PeriodTotals {
            sales: window_sales.clone().map(|sale| sale.amount).sum(),
            collections: input
                .payments
                .iter()
                .filter(|payment| in_window(payment.date))
                .map(|payment| payment.amount)
                .sum(),
            expenses: input
                .expenses
                .iter()
                .filter(|expense| in_window(expense.date))
                .map(|expense| expense.amount)
                .sum(),
            margin: window_sales.filter_map(|sale| sale.margin()).sum(),
        }
    }
}
