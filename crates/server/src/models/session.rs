//! Session-stored identity of the signed-in user.

use serde::{Deserialize, Serialize};

use people_core::{Email, UserId};

use super::user::User;

/// Minimal data kept in the session to identify the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address (as forwarded by the auth proxy).
    pub email: Email,
    /// User's display name.
    pub name: String,
    /// Whether the user can manage everything.
    pub admin: bool,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            admin: user.admin,
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current signed-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the one-shot flash message.
    pub const FLASH: &str = "flash";
}
