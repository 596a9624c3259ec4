//! Payment reminders.
//!
//! The status of a reminder is never stored; it is derived from the due date
//! and the day the caller considers "today".

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cemtrade_shared::types::ReminderId;

/// Derived reminder status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderStatus {
    /// Marked as done.
    Completed,
    /// Not done and the due date has passed.
    Overdue,
    /// Not done and due today or later.
    Upcoming,
}

/// A note to collect money from a customer on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    /// Unique identifier.
    pub id: ReminderId,
    /// Customer name.
    pub customer: String,
    /// Amount to collect.
    pub amount: Decimal,
    /// Day the money is due.
    pub due_date: NaiveDate,
    /// Whether the reminder has been dealt with.
    #[serde(default)]
    pub is_completed: bool,
    /// Free-text note.
    #[serde(default)]
    pub note: Option<String>,
}

impl Reminder {
    /// Status relative to `today`.
    #[must_use]
    pub fn status(&self, today: NaiveDate) -> ReminderStatus {
        if self.is_completed {
            ReminderStatus::Completed
        } else if self.due_date < today {
            ReminderStatus::Overdue
        } else {
            ReminderStatus::Upcoming
        }
    }
}
