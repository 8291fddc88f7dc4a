//! Roles a user can hold in a position or a project membership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use people_core::RoleId;

use super::validation::{self, ValidationErrors, opt_string, required_text};

/// Role name that marks a project manager membership.
pub const PROJECT_MANAGER: &str = "pm";

/// A role row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Role {
    #[must_use]
    pub fn is_project_manager(&self) -> bool {
        self.name.eq_ignore_ascii_case(PROJECT_MANAGER)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleInput {
    #[serde(default, deserialize_with = "opt_string")]
    pub name: Option<String>,
}

impl RoleInput {
    /// Validated role name.
    ///
    /// # Errors
    ///
    /// Returns an error when the name is blank.
    pub fn validate(&self) -> Result<String, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = required_text(&mut errors, "name", self.name.as_ref());
        errors.into_result(name)
    }
}

#[must_use]
pub fn name_taken() -> ValidationErrors {
    ValidationErrors::single("name", validation::TAKEN)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_project_manager_role_is_case_insensitive() {
        let role = Role {
            id: RoleId::new(1),
            name: "PM".into(),
            created_at: Utc::now(),
        };
        assert!(role.is_project_manager());
    }

    #[test]
    fn test_validate_trims_name() {
        let input = RoleInput {
            name: Some("  developer ".into()),
        };
        assert_eq!(input.validate().unwrap(), "developer");
        assert!(RoleInput::default().validate().is_err());
    }
}
