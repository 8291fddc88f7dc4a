//! Authorization rules.
//!
//! Admins may do everything. Everyone else may read anything, manage their
//! own positions, and edit their own user record.

use people_core::UserId;

use crate::error::AppError;
use crate::models::CurrentUser;

/// What is being acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Team,
    Position { owner: UserId },
    Project,
    /// `None` for a user that does not exist yet.
    User { id: Option<UserId> },
    Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Destroy,
    TogglePrimary,
}

/// Whether `actor` may perform `action` on `resource`.
#[must_use]
pub fn can(actor: &CurrentUser, resource: Resource, action: Action) -> bool {
    if actor.admin || action == Action::Read {
        return true;
    }

    match resource {
        Resource::Position { owner } => owner == actor.id,
        Resource::User { id } => action == Action::Update && id == Some(actor.id),
        Resource::Team | Resource::Project | Resource::Role => false,
    }
}

/// Require permission for an action.
///
/// # Errors
///
/// Returns `AppError::Forbidden` when the actor lacks permission.
pub fn authorize(actor: &CurrentUser, resource: Resource, action: Action) -> Result<(), AppError> {
    if can(actor, resource, action) {
        Ok(())
    } else {
        tracing::warn!(user_id = %actor.id, ?resource, ?action, "Authorization denied");
        Err(AppError::Forbidden(
            "You are not allowed to perform this action".to_owned(),
        ))
    }
}
