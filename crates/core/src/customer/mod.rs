//! Customers, their sales and payments, and derived balances.

pub mod balance;
pub mod types;


pub use balance::{
    CustomerBalance, CustomerService, CustomerStatement, LegacyNameMatch, StatementLine,
    StatementLineKind,
};
pub use types::{Customer, CustomerOwned, PaymentTransaction, SalesTransaction};
