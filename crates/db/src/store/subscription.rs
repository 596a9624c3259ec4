//! Push-based live views of a collection.

use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use cemtrade_shared::types::parse_amount;

use super::{Collection, EntityStore};

/// Ordering applied to each snapshot pushed to a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Field to sort on.
    pub field: String,
    /// Largest first when true.
    pub descending: bool,
}

impl OrderBy {
    /// Ascending order on `field`.
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    /// Descending order on `field`.
    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    /// Sorts `records` in place. The sort is stable, so ties keep creation order.
    pub fn sort(&self, records: &mut [Value]) {
        records.sort_by(|a, b| {
            let ordering = compare_values(a.get(&self.field), b.get(&self.field));
            if self.descending { ordering.reverse() } else { ordering }
        });
    }
}

fn as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(raw) => parse_amount(raw).ok(),
        Value::Number(number) => Decimal::from_str(&number.to_string()).ok(),
        _ => None,
    }
}

/// Missing values sort first; decimals compare numerically; strings lexically,
/// which orders ISO dates and RFC 3339 timestamps chronologically.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(a), Some(b)) => match (as_decimal(a), as_decimal(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => match (a, b) {
                (Value::String(x), Value::String(y)) => x.cmp(y),
                _ => a.to_string().cmp(&b.to_string()),
            },
        },
    }
}

/// Keeps a subscription alive. Dropping it, or calling
/// [`unsubscribe`](Self::unsubscribe), stops the pushes.
#[derive(Debug)]
pub struct SubscriptionHandle {
    collection: Collection,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    /// Collection being watched.
    #[must_use]
    pub const fn collection(&self) -> Collection {
        self.collection
    }

    /// Returns true while the subscription task is still running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops the subscription.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Pushes the full, ordered contents of `collection` to `on_change` now and
/// after every commit that touches it.
///
/// Must be called from within a Tokio runtime.
pub fn subscribe_to_collection<F>(
    store: Arc<dyn EntityStore>,
    collection: Collection,
    order_by: Option<OrderBy>,
    mut on_change: F,
) -> SubscriptionHandle
where
    F: FnMut(Vec<Value>) + Send + 'static,
{
    let mut revisions = store.watch(collection);
    let task = tokio::spawn(async move {
        loop {
            revisions.mark_unchanged();
            match store.list(collection).await {
                Ok(mut records) => {
                    if let Some(order) = &order_by {
                        order.sort(&mut records);
                    }
                    debug!(%collection, records = records.len(), "Pushing collection snapshot");
                    on_change(records);
                }
                Err(err) => warn!(%collection, error = %err, "Failed to load collection snapshot"),
            }
            if revisions.changed().await.is_err() {
                break;
            }
        }
    });

    SubscriptionHandle { collection, task }
}
