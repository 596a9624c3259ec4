//! Purchase records and filters.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cemtrade_shared::types::PurchaseId;

/// How a purchase is billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PurchaseSubCategory {
    /// Billed on delivery; not tracked by reconciliation.
    Direct,
    /// GL arrangement, tracked for unbilled/advance stock.
    #[serde(rename = "GL")]
    Gl,
    /// GV arrangement, tracked for unbilled/advance stock.
    #[serde(rename = "GV")]
    Gv,
}

impl PurchaseSubCategory {
    /// Returns true for the GL/GV arrangements that take part in billing reconciliation.
    #[must_use]
    pub const fn is_tracked(self) -> bool {
        matches!(self, Self::Gl | Self::Gv)
    }
}

/// Unit a purchase quantity is recorded in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Unit {
    /// Bags.
    Bags,
    /// Tons; converted with the bags-per-ton setting.
    Tons,
    /// Any other unit, counted as-is.
    Other(String),
}

impl From<String> for Unit {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "bags" | "bag" => Self::Bags,
            "tons" | "ton" => Self::Tons,
            _ => Self::Other(value),
        }
    }
}

impl From<Unit> for String {
    fn from(value: Unit) -> Self {
        match value {
            Unit::Bags => "bags".to_string(),
            Unit::Tons => "tons".to_string(),
            Unit::Other(label) => label,
        }
    }
}

/// Cement bought from a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseTransaction {
    /// Unique identifier.
    pub id: PurchaseId,
    /// Item or brand purchased.
    pub item: String,
    /// Billing arrangement.
    pub sub_category: PurchaseSubCategory,
    /// Quantity received.
    pub quantity: Decimal,
    /// Quantity billed so far.
    #[serde(default)]
    pub billed_quantity: Decimal,
    /// Unit of both quantities.
    pub unit: Unit,
    /// Purchase date.
    pub date: NaiveDate,
    /// Delivery vehicle.
    #[serde(default)]
    pub vehicle_number: Option<String>,
    /// Free-text note.
    #[serde(default)]
    pub note: Option<String>,
}

/// Criteria the purchases screen filters by.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurchaseFilter {
    /// Brand, matched case-insensitively against `item`.
    pub brand: Option<String>,
    /// Earliest date, inclusive.
    pub date_from: Option<NaiveDate>,
    /// Latest date, inclusive.
    pub date_to: Option<NaiveDate>,
    /// Free-text search over item, vehicle number and note.
    pub search: Option<String>,
}

impl PurchaseFilter {
    /// Returns true if no criterion is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.brand.is_none() && self.date_from.is_none() && self.date_to.is_none() && self.search.is_none()
    }

    /// Returns true if `purchase` passes every criterion.
    #[must_use]
    pub fn matches(&self, purchase: &PurchaseTransaction) -> bool {
        if let Some(brand) = &self.brand {
            if !purchase.item.to_lowercase().contains(&brand.to_lowercase()) {
                return false;
            }
        }
        if self.date_from.is_some_and(|from| purchase.date < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| purchase.date > to) {
            return false;
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let haystacks = [
                Some(purchase.item.as_str()),
                purchase.vehicle_number.as_deref(),
                purchase.note.as_deref(),
            ];
            if !haystacks
                .into_iter()
                .flatten()
                .any(|text| text.to_lowercase().contains(&needle))
            {
                return false;
            }
        }
        true
    }
}
