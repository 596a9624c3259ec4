//! Payment reminder repository.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::info;

use cemtrade_core::ledger::LedgerError;
use cemtrade_core::reminder::{Reminder, ReminderStatus};
use cemtrade_shared::types::ReminderId;

use crate::error::RepositoryError;
use crate::records::{encode, fetch, fetch_all, require};
use crate::store::{Collection, EntityStore, WriteBatch};

/// Input for creating or editing a reminder.
#[derive(Debug, Clone)]
pub struct ReminderInput {
    /// Customer name.
    pub customer: String,
    /// Amount to collect; must be positive.
    pub amount: Decimal,
    /// Due date.
    pub due_date: NaiveDate,
    /// Free-text note.
    pub note: Option<String>,
}

/// Repository for reminders.
#[derive(Debug, Clone)]
pub struct ReminderRepository {
    store: Arc<dyn EntityStore>,
}

impl ReminderRepository {
    /// Creates a new reminder repository.
    #[must_use]
    pub const fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Creates an open reminder.
    pub async fn create_reminder(&self, input: ReminderInput) -> Result<Reminder, RepositoryError> {
        LedgerError::ensure_positive_amount(input.amount)?;
        let reminder = Reminder {
            id: ReminderId::new(),
            customer: input.customer,
            amount: input.amount,
            due_date: input.due_date,
            is_completed: false,
            note: input.note,
        };
        let mut batch = WriteBatch::new();
        batch.put(Collection::Reminders, reminder.id.into_inner(), encode(&reminder)?);
        self.store.commit(batch).await?;

        info!(reminder_id = %reminder.id, due_date = %reminder.due_date, "Created reminder");
        Ok(reminder)
    }

    /// Edits a reminder, keeping its completion flag.
    pub async fn update_reminder(&self, id: ReminderId, input: ReminderInput) -> Result<Reminder, RepositoryError> {
        LedgerError::ensure_positive_amount(input.amount)?;
        let current: Reminder = require(self.store.as_ref(), Collection::Reminders, id.into_inner()).await?;
        let reminder = Reminder {
            customer: input.customer,
            amount: input.amount,
            due_date: input.due_date,
            note: input.note,
            ..current
        };
        let mut batch = WriteBatch::new();
        batch.put(Collection::Reminders, id.into_inner(), encode(&reminder)?);
        self.store.commit(batch).await?;

        info!(reminder_id = %id, "Updated reminder");
        Ok(reminder)
    }

    /// Marks a reminder done or open again.
    pub async fn set_completed(&self, id: ReminderId, is_completed: bool) -> Result<(), RepositoryError> {
        let mut batch = WriteBatch::new();
        batch.merge(Collection::Reminders, id.into_inner(), json!({ "isCompleted": is_completed }));
        self.store.commit(batch).await?;

        info!(reminder_id = %id, is_completed, "Toggled reminder");
        Ok(())
    }

    /// Deletes a reminder.
    pub async fn delete_reminder(&self, id: ReminderId) -> Result<(), RepositoryError> {
        let mut batch = WriteBatch::new();
        batch.delete(Collection::Reminders, id.into_inner());
        self.store.commit(batch).await?;
        info!(reminder_id = %id, "Deleted reminder");
        Ok(())
    }

    /// Returns the reminder, if it exists.
    pub async fn get_reminder(&self, id: ReminderId) -> Result<Option<Reminder>, RepositoryError> {
        fetch(self.store.as_ref(), Collection::Reminders, id.into_inner()).await
    }

    /// Lists reminders by due date, each with its status relative to `today`.
    pub async fn list_reminders(&self, today: NaiveDate) -> Result<Vec<(Reminder, ReminderStatus)>, RepositoryError> {
        let mut reminders: Vec<Reminder> = fetch_all(self.store.as_ref(), Collection::Reminders).await?;
        reminders.sort_by_key(|reminder| reminder.due_date);
        Ok(reminders
            .into_iter()
            .map(|reminder| {
                let status = reminder.status(today);
                (reminder, status)
            })
            .collect())
    }
}
