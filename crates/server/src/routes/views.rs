//! Shared view data for HTML pages.

use chrono::NaiveDate;
use tower_sessions::Session;

use crate::middleware::{Flash, take_flash};
use crate::models::CurrentUser;

/// Data every page layout needs.
#[derive(Debug, Clone)]
pub struct Layout {
    pub current_user: CurrentUser,
    pub flash: Option<Flash>,
}

impl Layout {
    /// Build the layout, consuming any pending flash.
    pub async fn load(session: &Session, current_user: &CurrentUser) -> Self {
        Self {
            current_user: current_user.clone(),
            flash: take_flash(session).await,
        }
    }
}

/// One `<option>` or checkbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Build choices from `(value, label)` pairs, marking those in `selected`.
pub fn choices<I, V>(items: I, selected: &[String]) -> Vec<Choice>
where
    I: IntoIterator<Item = (V, String)>,
    V: ToString,
{
    items
        .into_iter()
        .map(|(value, label)| {
            let value = value.to_string();
            let selected = selected.contains(&value);
            Choice {
                value,
                label,
                selected,
            }
        })
        .collect()
}

/// `YYYY-MM-DD`, or `-` when unset.
#[must_use]
pub fn ymd(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "-".to_owned(), |d| d.format("%Y-%m-%d").to_string())
}
