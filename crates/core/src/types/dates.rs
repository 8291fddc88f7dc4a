//! Tracked project dates and the change summary posted to chat.
//!
//! Callers capture a [`ProjectDates`] before and after saving a project and
//! pass both explicitly; nothing here inspects database state.

use core::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The three project dates that trigger a chat notification when changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDates {
    pub kickoff: Option<NaiveDate>,
    pub starts_at: Option<NaiveDate>,
    pub end_at: Option<NaiveDate>,
}

/// A tracked date field, in notification order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Kickoff,
    StartsAt,
    EndAt,
}

impl DateField {
    /// All tracked fields in the order they appear in a notification.
    pub const ALL: [Self; 3] = [Self::Kickoff, Self::StartsAt, Self::EndAt];

    /// Human-readable label used in messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Kickoff => "Kickoff",
            Self::StartsAt => "Starts at",
            Self::EndAt => "End at",
        }
    }
}

/// What happened to a single tracked field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateChange {
    ChangedTo(NaiveDate),
    Cleared,
}

/// One line of a dates-updated notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldChange {
    pub field: DateField,
    pub change: DateChange,
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = self.field.label();
        match self.change {
            DateChange::ChangedTo(date) => {
                write!(f, "*{label}* changed to _{}_.", date.format("%Y-%m-%d"))
            }
            DateChange::Cleared => write!(f, "*{label}* cleared."),
        }
    }
}

impl ProjectDates {
    /// Value of a single tracked field.
    #[must_use]
    pub const fn get(&self, field: DateField) -> Option<NaiveDate> {
        match field {
            DateField::Kickoff => self.kickoff,
            DateField::StartsAt => self.starts_at,
            DateField::EndAt => self.end_at,
        }
    }

    /// Changes from `before` to `self`, in [`DateField::ALL`] order.
    ///
    /// A field that went from a value to `None` is reported as cleared; a
    /// field that stayed `None` or kept its value is omitted.
    #[must_use]
    pub fn changes_since(&self, before: &Self) -> Vec<FieldChange> {
        DateField::ALL
            .into_iter()
            .filter_map(|field| {
                let change = match (before.get(field), self.get(field)) {
                    (old, Some(new)) if old != Some(new) => DateChange::ChangedTo(new),
                    (Some(_), None) => DateChange::Cleared,
                    _ => return None,
                };
                Some(FieldChange { field, change })
            })
            .collect()
    }
}

/// Compose the chat message for a project whose dates changed.
///
/// Returns `None` when there is nothing to report.
#[must_use]
pub fn dates_updated_message(project_name: &str, changes: &[FieldChange]) -> Option<String> {
    if changes.is_empty() {
        return None;
    }

    let mut message = format!("Dates in project *{project_name}* has been updated.");
    for change in changes {
        message.push('\n');
        message.push_str(&change.to_string());
    }
    Some(message)
}
