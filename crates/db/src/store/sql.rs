//! Entity store on a SQL database through `SeaORM`.
//!
//! Every collection shares the `entity_records` table, one JSON document per
//! row. A commit runs in one database transaction and locks each row it
//! rewrites, so concurrent increments on Postgres serialize instead of
//! losing updates.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection,
    DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Schema, Set,
    TransactionTrait,
};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info};
use uuid::Uuid;

use cemtrade_shared::config::DatabaseConfig;

use super::{Collection, EntityStore, WriteBatch, WriteOp};
use crate::entities::entity_records;
use crate::error::StoreError;

/// Entity store persisted in Postgres or SQLite.
///
/// Change notification covers commits made through this instance only.
#[derive(Debug)]
pub struct SqlStore {
    db: DatabaseConnection,
    revisions: Vec<watch::Sender<u64>>,
}

impl SqlStore {
    /// Wraps an open connection. Call [`migrate`](Self::migrate) before first use.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            revisions: Collection::ALL
                .iter()
                .map(|_| watch::channel(0).0)
                .collect(),
        }
    }

    /// Connects using the pool settings from configuration and creates the
    /// table if it is missing.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let mut options = ConnectOptions::new(config.url.clone());
        options
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .sqlx_logging(false);
        let store = Self::new(Database::connect(options).await?);
        store.migrate().await?;
        Ok(store)
    }

    /// Creates the `entity_records` table if it does not exist.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        let backend = self.db.get_database_backend();
        let statement = Schema::new(backend)
            .create_table_from_entity(entity_records::Entity)
            .if_not_exists()
            .to_owned();
        self.db.execute(backend.build(&statement)).await?;
        info!(backend = ?backend, "Entity store schema ready");
        Ok(())
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    fn notify(&self, collection: Collection) {
        if let Some(sender) = self.revisions.get(collection.index()) {
            sender.send_modify(|revision| *revision += 1);
        }
    }

    async fn rows(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
        Ok(entity_records::Entity::find()
            .filter(entity_records::Column::Collection.eq(collection.as_str()))
            .order_by_asc(entity_records::Column::Seq)
            .order_by_asc(entity_records::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|row| row.record)
            .collect())
    }
}

fn key(collection: Collection, id: Uuid) -> (String, Uuid) {
    (collection.as_str().to_string(), id)
}

async fn next_seq(txn: &DatabaseTransaction) -> Result<i64, StoreError> {
    let max: Option<Option<i64>> = entity_records::Entity::find()
        .select_only()
        .column_as(entity_records::Column::Seq.max(), "max_seq")
        .into_tuple()
        .one(txn)
        .await?;
    Ok(max.flatten().unwrap_or(0) + 1)
}

async fn apply(txn: &DatabaseTransaction, seq: &mut i64, op: WriteOp) -> Result<(), StoreError> {
    let collection = op.collection();
    let id = op.id();
    let existing = entity_records::Entity::find_by_id(key(collection, id))
        .lock_exclusive()
        .one(txn)
        .await?;
    let current = existing
        .as_ref()
        .and_then(|row| row.record.as_object().cloned());

    match (op.apply_to(current)?, existing) {
        (Some(record), Some(row)) => {
            let mut row: entity_records::ActiveModel = row.into();
            row.record = Set(Value::Object(record));
            row.update(txn).await?;
        }
        (Some(record), None) => {
            let row = entity_records::ActiveModel {
                collection: Set(collection.as_str().to_string()),
                id: Set(id),
                seq: Set(*seq),
                record: Set(Value::Object(record)),
            };
            *seq += 1;
            entity_records::Entity::insert(row)
                .exec_without_returning(txn)
                .await?;
        }
        (None, _) => {
            entity_records::Entity::delete_by_id(key(collection, id))
                .exec(txn)
                .await?;
        }
    }
    Ok(())
}

async fn apply_all(txn: &DatabaseTransaction, ops: Vec<WriteOp>) -> Result<(), StoreError> {
    let mut seq = next_seq(txn).await?;
    for op in ops {
        apply(txn, &mut seq, op).await?;
    }
    Ok(())
}

#[async_trait]
impl EntityStore for SqlStore {
    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Value>, StoreError> {
        Ok(entity_records::Entity::find_by_id(key(collection, id))
            .one(&self.db)
            .await?
            .map(|row| row.record))
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
        self.rows(collection).await
    }

    async fn find_by(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>, StoreError> {
        // Matched in process so Postgres and SQLite compare JSON the same way.
        Ok(self
            .rows(collection)
            .await?
            .into_iter()
            .filter(|record| record.get(field) == Some(value))
            .collect())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let touched = batch.collections();
        let op_count = batch.len();

        let txn = self.db.begin().await?;
        if let Err(err) = apply_all(&txn, batch.into_ops()).await {
            txn.rollback().await?;
            return Err(err);
        }
        txn.commit().await?;
        debug!(ops = op_count, collections = ?touched, "Committed write batch");

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
