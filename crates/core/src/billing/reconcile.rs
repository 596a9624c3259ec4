//! GL/GV billing reconciliation.
//!
//! A read-side aggregation over purchases: how many bags were received under
//! GL/GV arrangements versus how many have been billed. Nothing is stored, so
//! the figure cannot drift, but it only covers the purchases it is given.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{PurchaseFilter, PurchaseTransaction, Unit};
use crate::settings::BagsPerTon;

/// Direction of the GL/GV position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillingStatus {
    /// More received than billed (or exactly even).
    Unbilled,
    /// More billed than received.
    Advance,
}

/// Aggregated GL/GV position over a set of purchases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingSummary {
    /// Bags received under GL/GV.
    pub total_purchased_bags: Decimal,
    /// Bags billed under GL/GV.
    pub total_billed_bags: Decimal,
    /// `total_purchased_bags - total_billed_bags`.
    pub net_bags: Decimal,
    /// `Unbilled` if `net_bags >= 0`, else `Advance`.
    pub status: BillingStatus,
    /// `|net_bags| / bags_per_ton`.
    pub tons: Decimal,
}

/// The position across all purchases next to the position of the current view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingOverview {
    /// Every GL/GV purchase.
    pub global: BillingSummary,
    /// Only the GL/GV purchases passing the active filter.
    pub filtered: BillingSummary,
}

/// Stateless GL/GV billing rules.
pub struct BillingService;

impl BillingService {
    /// Converts a quantity to bags. Tons are multiplied out; every other unit counts as-is.
    #[must_use]
    pub fn to_bags(quantity: Decimal, unit: &Unit, bags_per_ton: BagsPerTon) -> Decimal {
        match unit {
            Unit::Tons => quantity * bags_per_ton.get(),
            Unit::Bags | Unit::Other(_) => quantity,
        }
    }

    /// Aggregates the GL/GV position over `purchases`. Direct purchases are skipped.
    #[must_use]
    pub fn summarize<'a, I>(purchases: I, bags_per_ton: BagsPerTon) -> BillingSummary
    where
        I: IntoIterator<Item = &'a PurchaseTransaction>,
    {
        let (total_purchased_bags, total_billed_bags) = purchases
            .into_iter()
            .filter(|purchase| purchase.sub_category.is_tracked())
            .fold((Decimal::ZERO, Decimal::ZERO), |(bought, billed), purchase| {
                (
                    bought + Self::to_bags(purchase.quantity, &purchase.unit, bags_per_ton),
                    billed + Self::to_bags(purchase.billed_quantity, &purchase.unit, bags_per_ton),
                )
            });

        let net_bags = total_purchased_bags - total_billed_bags;
        let status = if net_bags >= Decimal::ZERO {
            BillingStatus::Unbilled
        } else {
            BillingStatus::Advance
        };

        BillingSummary {
            total_purchased_bags,
            total_billed_bags,
            net_bags,
            status,
            tons: net_bags.abs() / bags_per_ton.get(),
        }
    }

    /// Computes both the global and the filter-scoped position.
    #[must_use]
    pub fn overview(
        purchases: &[PurchaseTransaction],
        filter: &PurchaseFilter,
        bags_per_ton: BagsPerTon,
    ) -> BillingOverview {
        BillingOverview {
            global: Self::summarize(purchases, bags_per_ton),
            filtered: Self::summarize(
                purchases.iter().filter(|purchase| filter.matches(purchase)),
                bags_per_ton,
            ),
        }
    }
}
