//! Customer balance derivation.
//!
//! A customer's balance is always recomputed from the opening balance, the
//! customer's sales and the customer's payments. It is never cached.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cemtrade_shared::types::CustomerId;

use super::types::{Customer, CustomerOwned, PaymentTransaction, SalesTransaction};
use crate::ledger::RunningBalance;

/// A customer's derived balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerBalance {
    /// The customer.
    pub customer_id: CustomerId,
    /// Opening balance.
    pub opening: Decimal,
    /// Lifetime sales.
    pub sales_total: Decimal,
    /// Lifetime payments.
    pub payments_total: Decimal,
    /// `opening + sales_total - payments_total`.
    pub balance: Decimal,
}

impl CustomerBalance {
    /// Amount the customer owes, zero if they are in advance.
    #[must_use]
    pub fn amount_due(&self) -> Decimal {
        self.balance.max(Decimal::ZERO)
    }

    /// Amount the customer has paid in advance, zero if they owe.
    #[must_use]
    pub fn advance(&self) -> Decimal {
        (-self.balance).max(Decimal::ZERO)
    }
}

/// Kind of statement line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatementLineKind {
    /// A sale, increases what the customer owes.
    Sale,
    /// A payment, decreases what the customer owes.
    Payment,
}

/// One line of a customer statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLine {
    /// Sale or payment.
    pub kind: StatementLineKind,
    /// Id of the underlying record.
    pub record_id: Uuid,
    /// Record date.
    pub date: NaiveDate,
    /// Product for sales, method for payments.
    pub description: String,
    /// Signed change to the balance.
    pub change: Decimal,
    /// Balance before and after this line.
    pub running: RunningBalance,
}

/// Chronological statement for one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerStatement {
    /// The customer.
    pub customer_id: CustomerId,
    /// Opening balance the statement starts from.
    pub opening: Decimal,
    /// Lines ordered by date, sales before payments on the same day.
    pub lines: Vec<StatementLine>,
    /// Balance after the last line.
    pub closing: Decimal,
}

/// Outcome of resolving a legacy customer name to an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacyNameMatch {
    /// Exactly one customer has this name.
    Unique(CustomerId),
    /// Several customers share the name; nothing can be assigned.
    Ambiguous(Vec<CustomerId>),
    /// No customer has this name.
    Unmatched,
}

/// Stateless customer balance rules.
pub struct CustomerService;

impl CustomerService {
    /// Computes `opening + Σ sales - Σ payments` for `customer`.
    ///
    /// The full sales and payments collections can be passed in; records for
    /// other customers are filtered out.
    #[must_use]
    pub fn compute_balance<'a, S, P>(customer: &Customer, sales: S, payments: P) -> CustomerBalance
    where
        S: IntoIterator<Item = &'a SalesTransaction>,
        P: IntoIterator<Item = &'a PaymentTransaction>,
    {
        let sales_total: Decimal = sales
            .into_iter()
            .filter(|sale| sale.belongs_to(customer))
            .map(|sale| sale.amount)
            .sum();
        let payments_total: Decimal = payments
            .into_iter()
            .filter(|payment| payment.belongs_to(customer))
            .map(|payment| payment.amount)
            .sum();

        CustomerBalance {
            customer_id: customer.id,
            opening: customer.opening_balance,
            sales_total,
            payments_total,
            balance: customer.opening_balance + sales_total - payments_total,
        }
    }

    /// Builds a chronological statement with a running balance.
    #[must_use]
    pub fn statement<'a, S, P>(customer: &Customer, sales: S, payments: P) -> CustomerStatement
    where
        S: IntoIterator<Item = &'a SalesTransaction>,
        P: IntoIterator<Item = &'a PaymentTransaction>,
    {
        let mut rows: Vec<(NaiveDate, StatementLineKind, Uuid, String, Decimal)> = sales
            .into_iter()
            .filter(|sale| sale.belongs_to(customer))
            .map(|sale| {
                (
                    sale.date,
                    StatementLineKind::Sale,
                    sale.id.into_inner(),
                    sale.product.clone(),
                    sale.amount,
                )
            })
            .chain(
                payments
                    .into_iter()
                    .filter(|payment| payment.belongs_to(customer))
                    .map(|payment| {
                        (
                            payment.date,
                            StatementLineKind::Payment,
                            payment.id.into_inner(),
                            payment.method.clone().unwrap_or_default(),
                            -payment.amount,
                        )
                    }),
            )
            .collect();
        rows.sort_by(|a, b| (a.0, a.1, a.2).cmp(&(b.0, b.1, b.2)));

        let mut lines = Vec::with_capacity(rows.len());
        let mut previous: Option<RunningBalance> = None;
        for (date, kind, record_id, description, change) in rows {
            let running = match &previous {
                Some(prev) => RunningBalance::next_entry(prev, change),
                None => RunningBalance::first_entry(customer.opening_balance, change),
            };
            previous = Some(running);
            lines.push(StatementLine {
                kind,
                record_id,
                date,
                description,
                change,
                running,
            });
        }

        CustomerStatement {
            customer_id: customer.id,
            opening: customer.opening_balance,
            closing: previous.map_or(customer.opening_balance, |rb| rb.current_balance),
            lines,
        }
    }

    /// Resolves a legacy customer name against the customer list.
    #[must_use]
    pub fn resolve_legacy_name<'a, I>(name: &str, customers: I) -> LegacyNameMatch
    where
        I: IntoIterator<Item = &'a Customer>,
    {
        let wanted = name.trim();
        let matches: Vec<CustomerId> = customers
            .into_iter()
            .filter(|customer| customer.name.trim() == wanted)
            .map(|customer| customer.id)
            .collect();

        match matches.as_slice() {
            [] => LegacyNameMatch::Unmatched,
            [only] => LegacyNameMatch::Unique(*only),
            _ => LegacyNameMatch::Ambiguous(matches),
        }
    }
}
