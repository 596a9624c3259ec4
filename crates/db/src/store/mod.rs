//! The entity store interface.
//!
//! Records live in named collections as JSON objects. Every multi-record
//! mutation goes through [`EntityStore::commit`], which applies a
//! [`WriteBatch`] all-or-nothing.

pub mod memory;
pub mod sql;
pub mod subscription;

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tokio::sync::watch;
use uuid::Uuid;

use cemtrade_shared::types::parse_amount;

use crate::error::StoreError;

pub use memory::MemoryStore;
pub use sql::SqlStore;
pub use subscription::{OrderBy, SubscriptionHandle, subscribe_to_collection};

/// Field the store stamps on every record at creation.
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Named collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    /// Customers.
    Customers,
    /// Sales transactions.
    Sales,
    /// Customer payments.
    Payments,
    /// Purchase transactions.
    Purchases,
    /// Expense transactions.
    Expenses,
    /// Shops and their stock quantity.
    Stocks,
    /// Stock movements.
    StockTransactions,
    /// Cash and bank accounts.
    Accounts,
    /// Ledger transactions.
    GlobalTransactions,
    /// Product reference data.
    Products,
    /// Payment reminders.
    Reminders,
    /// The singleton settings document.
    Settings,
}

impl Collection {
    /// Every collection, in declaration order.
    pub const ALL: [Self; 12] = [
        Self::Customers,
        Self::Sales,
        Self::Payments,
        Self::Purchases,
        Self::Expenses,
        Self::Stocks,
        Self::StockTransactions,
        Self::Accounts,
        Self::GlobalTransactions,
        Self::Products,
        Self::Reminders,
        Self::Settings,
    ];

    /// Storage name of the collection.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customers => "customers",
            Self::Sales => "sales",
            Self::Payments => "payments",
            Self::Purchases => "purchases",
            Self::Expenses => "expenses",
            Self::Stocks => "stocks",
            Self::StockTransactions => "stockTransactions",
            Self::Accounts => "accounts",
            Self::GlobalTransactions => "globalTransactions",
            Self::Products => "products",
            Self::Reminders => "reminders",
            Self::Settings => "settings",
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One write inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Insert a record, or replace it if the id exists.
    Put {
        /// Target collection.
        collection: Collection,
        /// Record id.
        id: Uuid,
        /// Full record; must be a JSON object.
        record: Value,
    },
    /// Shallow-merge fields into an existing record.
    Merge {
        /// Target collection.
        collection: Collection,
        /// Record id; must exist.
        id: Uuid,
        /// Fields to overwrite; must be a JSON object.
        fields: Value,
    },
    /// Remove an existing record.
    Delete {
        /// Target collection.
        collection: Collection,
        /// Record id; must exist.
        id: Uuid,
    },
    /// Add a signed delta to a decimal field of an existing record.
    Increment {
        /// Target collection.
        collection: Collection,
        /// Record id; must exist.
        id: Uuid,
        /// Decimal field to adjust. A missing field counts as zero.
        field: String,
        /// Signed delta.
        delta: Decimal,
    },
}

impl WriteOp {
    /// Collection the operation writes to.
    #[must_use]
    pub const fn collection(&self) -> Collection {
        match self {
            Self::Put { collection, .. }
            | Self::Merge { collection, .. }
            | Self::Delete { collection, .. }
            | Self::Increment { collection, .. } => *collection,
        }
    }

    /// Id of the record the operation writes.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        match self {
            Self::Put { id, .. }
            | Self::Merge { id, .. }
            | Self::Delete { id, .. }
            | Self::Increment { id, .. } => *id,
        }
    }

    /// Computes what the operation leaves behind, given the stored record.
    ///
    /// `None` on the way out means the record is deleted. Every store backend
    /// applies ops through this so they agree on stamping and validation.
    pub(crate) fn apply_to(
        self,
        current: Option<Map<String, Value>>,
    ) -> Result<Option<Map<String, Value>>, StoreError> {
        let collection = self.collection();
        let id = self.id();
        let missing = || StoreError::NotFound { collection, id };

        match self {
            Self::Put { record, .. } => {
                let mut record = into_object(collection, record)?;
                record.insert("id".to_string(), Value::String(id.to_string()));
                let created_at = current
                    .and_then(|mut existing| existing.remove(CREATED_AT_FIELD))
                    .or_else(|| record.remove(CREATED_AT_FIELD))
                    .unwrap_or_else(|| Value::String(Utc::now().to_rfc3339()));
                record.insert(CREATED_AT_FIELD.to_string(), created_at);
                Ok(Some(record))
            }
            Self::Merge { fields, .. } => {
                let fields = into_object(collection, fields)?;
                let mut record = current.ok_or_else(missing)?;
                for (key, value) in fields {
                    if key != "id" && key != CREATED_AT_FIELD {
                        record.insert(key, value);
                    }
                }
                Ok(Some(record))
            }
            Self::Delete { .. } => {
                current.ok_or_else(missing)?;
                Ok(None)
            }
            Self::Increment { field, delta, .. } => {
                let mut record = current.ok_or_else(missing)?;
                let value = decimal_field(&record, collection, id, &field)?;
                record.insert(field, Value::String((value + delta).to_string()));
                Ok(Some(record))
            }
        }
    }
}

/// Reads a decimal field. Accepts decimal strings with or without thousands
/// separators and JSON numbers; a missing field counts as zero.
fn decimal_field(
    record: &Map<String, Value>,
    collection: Collection,
    id: Uuid,
    field: &str,
) -> Result<Decimal, StoreError> {
    let not_numeric = || StoreError::NotNumeric {
        collection,
        id,
        field: field.to_string(),
    };
    match record.get(field) {
        None | Some(Value::Null) => Ok(Decimal::ZERO),
        Some(Value::String(raw)) => parse_amount(raw).map_err(|_| not_numeric()),
        Some(Value::Number(number)) => Decimal::from_str(&number.to_string())
            .or_else(|_| Decimal::from_scientific(&number.to_string()))
            .map_err(|_| not_numeric()),
        Some(_) => Err(not_numeric()),
    }
}

fn into_object(collection: Collection, value: Value) -> Result<Map<String, Value>, StoreError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidRecord {
            collection,
            reason: format!("expected a JSON object, got {other}"),
        }),
    }
}

/// Ordered list of writes committed as one unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages an insert-or-replace.
    pub fn put(&mut self, collection: Collection, id: Uuid, record: Value) -> &mut Self {
        self.ops.push(WriteOp::Put {
            collection,
            id,
            record,
        });
        self
    }

    /// Stages a shallow merge.
    pub fn merge(&mut self, collection: Collection, id: Uuid, fields: Value) -> &mut Self {
        self.ops.push(WriteOp::Merge {
            collection,
            id,
            fields,
        });
        self
    }

    /// Stages a delete.
    pub fn delete(&mut self, collection: Collection, id: Uuid) -> &mut Self {
        self.ops.push(WriteOp::Delete { collection, id });
        self
    }

    /// Stages a signed increment. Zero deltas are not staged.
    pub fn increment(
        &mut self,
        collection: Collection,
        id: Uuid,
        field: impl Into<String>,
        delta: Decimal,
    ) -> &mut Self {
        if !delta.is_zero() {
            self.ops.push(WriteOp::Increment {
                collection,
                id,
                field: field.into(),
                delta,
            });
        }
        self
    }

    /// Staged operations, in order.
    #[must_use]
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Number of staged operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if nothing is staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Distinct collections touched by the batch, sorted.
    #[must_use]
    pub fn collections(&self) -> Vec<Collection> {
        let mut touched: Vec<Collection> = self.ops.iter().map(WriteOp::collection).collect();
        touched.sort_unstable();
        touched.dedup();
        touched
    }

    pub(crate) fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// Durable storage with change notification per collection.
#[async_trait]
pub trait EntityStore: Send + Sync + std::fmt::Debug {
    /// Returns the record with `id`, if any.
    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Value>, StoreError>;

    /// Returns every record in creation order.
    async fn list(&self, collection: Collection) -> Result<Vec<Value>, StoreError>;

    /// Returns the records whose `field` equals `value`, in creation order.
    async fn find_by(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>, StoreError>;

    /// Applies every operation of `batch`, or none of them.
    ///
    /// Every target is validated before anything becomes visible; a failed
    /// commit leaves the store unchanged.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    /// Receiver whose value changes after every commit touching `collection`.
    fn watch(&self, collection: Collection) -> watch::Receiver<u64>;

    /// Persists a new record and returns its id.
    ///
    /// An `id` field already on the record is kept; otherwise a UUID v7 is assigned.
    async fn create(&self, collection: Collection, record: Value) -> Result<Uuid, StoreError> {
        let id = match record.get("id") {
            None | Some(Value::Null) => Uuid::now_v7(),
            Some(Value::String(raw)) => {
                Uuid::parse_str(raw).map_err(|err| StoreError::InvalidRecord {
                    collection,
                    reason: format!("bad id '{raw}': {err}"),
                })?
            }
            Some(other) => {
                return Err(StoreError::InvalidRecord {
                    collection,
                    reason: format!("id must be a string, got {other}"),
                });
            }
        };
        let mut batch = WriteBatch::new();
        batch.put(collection, id, record);
        self.commit(batch).await?;
        Ok(id)
    }

    /// Merges `fields` into an existing record.
    async fn update(&self, collection: Collection, id: Uuid, fields: Value) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.merge(collection, id, fields);
        self.commit(batch).await
    }

    /// Deletes an existing record.
    async fn delete(&self, collection: Collection, id: Uuid) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.delete(collection, id);
        self.commit(batch).await
    }
}
