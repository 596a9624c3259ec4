//! Shop stock levels and stock movements.

pub mod reconcile;
pub mod types;


pub use reconcile::{StockAdjustment, StockEdit, StockService, TransferLegs, TransferRequest};
pub use types::{StockItem, StockStatus, StockTransaction, StockTransactionType};
