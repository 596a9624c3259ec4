//! Core business logic for Cemtrade.
//!
//! This crate contains pure business logic with ZERO storage dependencies.
//! All domain types, balance rules, and calculations live here; the `db`
//! crate turns the plans computed here into atomic writes.
//!
//! # Modules
//!
//! - `ledger` - Accounts, ledger transactions and balance adjustment rules
//! - `customer` - Customers, sales, payments and derived balances
//! - `stock` - Shop quantities and stock movement reconciliation
//! - `billing` - Purchases and GL/GV billing reconciliation
//! - `dashboard` - Aggregated dashboard figures
//! - `auth` - Argon2id hashing for the reports password

pub mod auth;
pub mod billing;
pub mod catalog;
pub mod customer;
pub mod dashboard;
pub mod expense;
pub mod ledger;
pub mod reminder;
pub mod settings;
pub mod stock;
