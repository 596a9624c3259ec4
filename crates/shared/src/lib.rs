//! Shared types and configuration for Cemtrade.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Decimal parsing and formatting at the presentation boundary
//! - Configuration management

pub mod config;
pub mod types;

pub use config::AppConfig;
