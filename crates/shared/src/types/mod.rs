//! Common types used across the workspace.

pub mod id;
pub mod money;

pub use id::*;
pub use money::{MoneyParseError, format_amount, format_grouped, parse_amount};
