//! Entity store and repositories.
//!
//! This crate provides:
//! - The `EntityStore` interface over named collections, with atomic batches
//!   and per-collection change notification
//! - An in-memory store, and a `SeaORM` store for Postgres or SQLite
//! - Repositories that apply every domain mutation as one atomic batch

pub mod entities;
pub mod error;
mod records;
pub mod repositories;
pub mod store;

pub use error::{RepositoryError, StoreError};
pub use repositories::Repositories;
pub use store::{Collection, EntityStore, MemoryStore, SqlStore, WriteBatch};
