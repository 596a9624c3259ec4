//! In-memory entity store.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{RwLock, watch};
use tracing::debug;
use uuid::Uuid;

use super::{Collection, EntityStore, WriteBatch, WriteOp};
use crate::error::StoreError;

#[derive(Debug, Clone)]
struct Row {
    seq: u64,
    record: Map<String, Value>,
}

#[derive(Debug, Clone, Default)]
struct Table {
    rows: HashMap<Uuid, Row>,
}

impl Table {
    fn ordered(&self) -> Vec<&Row> {
        let mut rows: Vec<&Row> = self.rows.values().collect();
        rows.sort_by_key(|row| row.seq);
        rows
    }
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<Collection, Table>,
    next_seq: u64,
}

/// Entity store kept entirely in memory.
///
/// All collections sit behind one `RwLock`, so a commit is serialized against
/// every other write and an `Increment` cannot lose an update.
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<State>,
    revisions: Vec<watch::Sender<u64>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            revisions: Collection::ALL
                .iter()
                .map(|_| watch::channel(0).0)
                .collect(),
        }
    }

    fn notify(&self, collection: Collection) {
        if let Some(sender) = self.revisions.get(collection.index()) {
            sender.send_modify(|revision| *revision += 1);
        }
    }
}

fn apply(
    tables: &mut HashMap<Collection, Table>,
    next_seq: &mut u64,
    op: WriteOp,
) -> Result<(), StoreError> {
    let id = op.id();
    let table = tables.entry(op.collection()).or_default();
    let current = table.rows.get(&id).map(|row| row.record.clone());

    match op.apply_to(current)? {
        Some(record) => match table.rows.get_mut(&id) {
            Some(row) => row.record = record,
            None => {
                *next_seq += 1;
                table.rows.insert(
                    id,
                    Row {
                        seq: *next_seq,
                        record,
                    },
                );
            }
        },
        None => {
            table.rows.remove(&id);
        }
    }
    Ok(())
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Value>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .tables
            .get(&collection)
            .and_then(|table| table.rows.get(&id))
            .map(|row| Value::Object(row.record.clone())))
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .tables
            .get(&collection)
            .map(|table| {
                table
                    .ordered()
                    .into_iter()
                    .map(|row| Value::Object(row.record.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_by(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .tables
            .get(&collection)
            .map(|table| {
                table
                    .ordered()
                    .into_iter()
                    .filter(|row| row.record.get(field) == Some(value))
                    .map(|row| Value::Object(row.record.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let touched = batch.collections();

        {
            let mut state = self.state.write().await;

            // Stage on copies of the touched tables; swap them in only if every op applied.
            let mut staged: HashMap<Collection, Table> = touched
                .iter()
                .map(|collection| {
                    (
                        *collection,
                        state.tables.get(collection).cloned().unwrap_or_default(),
                    )
                })
                .collect();
            let mut next_seq = state.next_seq;
            let op_count = batch.len();

            for op in batch.into_ops() {
                apply(&mut staged, &mut next_seq, op)?;
            }

            state.tables.extend(staged);
            state.next_seq = next_seq;
            debug!(ops = op_count, collections = ?touched, "Committed write batch");
        }

        for collection in touched {
            self.notify(collection);
        }
        Ok(())
    }

    fn watch(&self, collection: Collection) -> watch::Receiver<u64> {
        match self.revisions.get(collection.index()) {
            Some(sender) => sender.subscribe(),
            None => watch::channel(0).1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CREATED_AT_FIELD;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::str::FromStr;

    fn balance(record: &Value) -> Decimal {
        Decimal::from_str(record["balance"].as_str().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_create_stamps_id_and_created_at() {
        let store = MemoryStore::new();
        let id = store
            .create(Collection::Products, json!({ "name": "OPC 50kg" }))
            .await
            .unwrap();

        let record = store.get(Collection::Products, id).await.unwrap().unwrap();
        assert_eq!(record["id"], json!(id.to_string()));
        assert!(record[CREATED_AT_FIELD].is_string());
        assert_eq!(record["name"], "OPC 50kg");
    }

    #[tokio::test]
    async fn test_create_keeps_supplied_id() {
        let store = MemoryStore::new();
        let id = Uuid::now_v7();
        let created = store
            .create(Collection::Products, json!({ "id": id.to_string(), "name": "SRC" }))
            .await
            .unwrap();
        assert_eq!(created, id);

        let err = store
            .create(Collection::Products, json!({ "id": 42 }))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_RECORD");
    }

    #[tokio::test]
    async fn test_update_merges_shallowly() {
        let store = MemoryStore::new();
        let id = store
            .create(Collection::Customers, json!({ "name": "Ali", "phone": "0300" }))
            .await
            .unwrap();
        store
            .update(Collection::Customers, id, json!({ "phone": "0311", "id": "ignored" }))
            .await
            .unwrap();

        let record = store.get(Collection::Customers, id).await.unwrap().unwrap();
        assert_eq!(record["name"], "Ali");
        assert_eq!(record["phone"], "0311");
        assert_eq!(record["id"], json!(id.to_string()));
    }

    #[tokio::test]
    async fn test_list_is_in_creation_order() {
        let store = MemoryStore::new();
        for name in ["c", "a", "b"] {
            store
                .create(Collection::Products, json!({ "name": name }))
                .await
                .unwrap();
        }
        let names: Vec<_> = store
            .list(Collection::Products)
            .await
            .unwrap()
            .into_iter()
            .map(|record| record["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_increment_reads_legacy_formats() {
        let store = MemoryStore::new();
        let id = store
            .create(Collection::Accounts, json!({ "name": "Cash", "balance": "12,500.50" }))
            .await
            .unwrap();
        let numeric = store
            .create(Collection::Accounts, json!({ "name": "Bank", "balance": 100 }))
            .await
            .unwrap();
        let missing = store
            .create(Collection::Accounts, json!({ "name": "Wallet" }))
            .await
            .unwrap();

        let mut batch = WriteBatch::new();
        batch
            .increment(Collection::Accounts, id, "balance", dec!(-500.50))
            .increment(Collection::Accounts, numeric, "balance", dec!(0.25))
            .increment(Collection::Accounts, missing, "balance", dec!(10));
        store.commit(batch).await.unwrap();

        for (account, expected) in [(id, dec!(12000)), (numeric, dec!(100.25)), (missing, dec!(10))] {
            let record = store.get(Collection::Accounts, account).await.unwrap().unwrap();
            assert_eq!(balance(&record), expected);
        }
    }

    #[tokio::test]
    async fn test_failed_commit_changes_nothing() {
        let store = MemoryStore::new();
        let account = store
            .create(Collection::Accounts, json!({ "name": "Cash", "balance": "100" }))
            .await
            .unwrap();
        let revisions = store.watch(Collection::Accounts);
        let before = *revisions.borrow();

        let ghost = Uuid::now_v7();
        let mut batch = WriteBatch::new();
        batch
            .put(Collection::Payments, Uuid::now_v7(), json!({ "amount": "50" }))
            .increment(Collection::Accounts, account, "balance", dec!(50))
            .increment(Collection::Accounts, ghost, "balance", dec!(50));

        let err = store.commit(batch).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::NotFound {
                collection: Collection::Accounts,
                id: ghost
            }
        );

        let record = store.get(Collection::Accounts, account).await.unwrap().unwrap();
        assert_eq!(balance(&record), dec!(100));
        assert!(store.list(Collection::Payments).await.unwrap().is_empty());
        assert_eq!(*revisions.borrow(), before);
    }

    #[tokio::test]
    async fn test_increment_rejects_non_numeric_field() {
        let store = MemoryStore::new();
        let id = store
            .create(Collection::Stocks, json!({ "shop": "Main", "quantity": "lots" }))
            .await
            .unwrap();
        let mut batch = WriteBatch::new();
        batch.increment(Collection::Stocks, id, "quantity", dec!(1));

        let err = store.commit(batch).await.unwrap_err();
        assert_eq!(err.error_code(), "NOT_NUMERIC");
    }

    #[tokio::test]
    async fn test_concurrent_increments_do_not_lose_updates() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let id = store
            .create(Collection::Accounts, json!({ "name": "Cash", "balance": "0" }))
            .await
            .unwrap();

        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    let mut batch = WriteBatch::new();
                    batch.increment(Collection::Accounts, id, "balance", dec!(10));
                    store.commit(batch).await
                })
            })
            .collect();
        for result in futures::future::join_all(tasks).await {
            result.unwrap().unwrap();
        }

        let record = store.get(Collection::Accounts, id).await.unwrap().unwrap();
        assert_eq!(balance(&record), dec!(500));
    }

    #[tokio::test]
    async fn test_find_by_and_delete() {
        let store = MemoryStore::new();
        let payment = Uuid::now_v7().to_string();
        store
            .create(Collection::GlobalTransactions, json!({ "paymentId": payment }))
            .await
            .unwrap();
        store
            .create(Collection::GlobalTransactions, json!({ "expenseId": "x" }))
            .await
            .unwrap();

        let found = store
            .find_by(Collection::GlobalTransactions, "paymentId", &json!(payment))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        let id = Uuid::parse_str(found[0]["id"].as_str().unwrap()).unwrap();
        store.delete(Collection::GlobalTransactions, id).await.unwrap();
        let err = store.delete(Collection::GlobalTransactions, id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
