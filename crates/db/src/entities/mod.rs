//! `SeaORM` entities backing [`SqlStore`](crate::store::SqlStore).

#![allow(missing_docs)]

pub mod entity_records;
