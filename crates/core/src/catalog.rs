//! Product reference data.

use serde::{Deserialize, Serialize};

use cemtrade_shared::types::ProductId;

/// A product offered for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier.
    pub id: ProductId,
    /// Product name, e.g. "OPC 50kg".
    pub name: String,
    /// Grouping, e.g. "Cement".
    #[serde(default)]
    pub category: Option<String>,
}
