//! Typed access to JSON records.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::store::{Collection, EntityStore};

pub(crate) fn encode<T: Serialize>(record: &T) -> Result<Value, RepositoryError> {
    Ok(serde_json::to_value(record)?)
}

pub(crate) fn decode<T: DeserializeOwned>(record: Value) -> Result<T, RepositoryError> {
    Ok(serde_json::from_value(record)?)
}

pub(crate) async fn fetch<T: DeserializeOwned>(
    store: &dyn EntityStore,
    collection: Collection,
    id: Uuid,
) -> Result<Option<T>, RepositoryError> {
    store.get(collection, id).await?.map(decode).transpose()
}

/// Like [`fetch`], but a missing record is a stale reference.
pub(crate) async fn require<T: DeserializeOwned>(
    store: &dyn EntityStore,
    collection: Collection,
    id: Uuid,
) -> Result<T, RepositoryError> {
    fetch(store, collection, id)
        .await?
        .ok_or(RepositoryError::stale(collection, id))
}

pub(crate) async fn fetch_all<T: DeserializeOwned>(
    store: &dyn EntityStore,
    collection: Collection,
) -> Result<Vec<T>, RepositoryError> {
    store
        .list(collection)
        .await?
        .into_iter()
        .map(decode)
        .collect()
}

pub(crate) async fn find<T: DeserializeOwned>(
    store: &dyn EntityStore,
    collection: Collection,
    field: &str,
    value: Uuid,
) -> Result<Vec<T>, RepositoryError> {
    store
        .find_by(collection, field, &Value::String(value.to_string()))
        .await?
        .into_iter()
        .map(decode)
        .collect()
}
