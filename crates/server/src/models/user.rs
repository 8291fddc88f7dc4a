//! Users: the people the application keeps track of.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use people_core::{Email, EmailError, RoleId, TeamId, UserId};

use super::validation::{
    self, ValidationErrors, flag, opt_string, optional_id, present, required_text,
};

/// A user row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub admin: bool,
    pub team_id: Option<TeamId>,
    pub primary_role_id: Option<RoleId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw user form / JSON body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInput {
    #[serde(default, deserialize_with = "opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub admin: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub team_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub primary_role_id: Option<String>,
}

/// Validated user attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserParams {
    pub name: String,
    pub email: Email,
    pub admin: bool,
    pub team_id: Option<TeamId>,
    pub primary_role_id: Option<RoleId>,
}

impl UserInput {
    /// Validate presence and shape. Email uniqueness is checked by the repository.
    ///
    /// # Errors
    ///
    /// Returns the field errors found.
    pub fn validate(&self) -> Result<UserParams, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = required_text(&mut errors, "name", self.name.as_ref());
        let email = match present(self.email.as_ref()).map(Email::parse) {
            Some(Ok(email)) => Some(email),
            Some(Err(e)) => {
                errors.add("email", e.to_string());
                None
            }
            None => {
                errors.add("email", EmailError::Empty.to_string());
                None
            }
        };
        let team_id = optional_id(&mut errors, "team_id", self.team_id.as_ref());
        let primary_role_id =
            optional_id(&mut errors, "primary_role_id", self.primary_role_id.as_ref());

        match email {
            Some(email) if errors.is_empty() => Ok(UserParams {
                name,
                email,
                admin: flag(self.admin.as_ref()),
                team_id,
                primary_role_id,
            }),
            _ => Err(errors),
        }
    }
}

impl From<&User> for UserInput {
    fn from(user: &User) -> Self {
        Self {
            name: Some(user.name.clone()),
            email: Some(user.email.to_string()),
            admin: Some(user.admin.to_string()),
            team_id: user.team_id.map(|id| id.to_string()),
            primary_role_id: user.primary_role_id.map(|id| id.to_string()),
        }
    }
}

/// Duplicate-email error in the same shape as other validation failures.
#[must_use]
pub fn email_taken() -> ValidationErrors {
    ValidationErrors::single("email", validation::TAKEN)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_user() {
        let input = UserInput {
            name: Some("Jane Doe".into()),
            email: Some("Jane@People.test".into()),
            admin: Some("on".into()),
            team_id: Some("3".into()),
            primary_role_id: None,
        };

        let params = input.validate().unwrap();
        assert_eq!(params.email.as_str(), "jane@people.test");
        assert!(params.admin);
        assert_eq!(params.team_id, Some(TeamId::new(3)));
        assert_eq!(params.primary_role_id, None);
    }

    #[test]
    fn test_validate_reports_every_field() {
        let input = UserInput {
            email: Some("not-an-email".into()),
            team_id: Some("x".into()),
            ..UserInput::default()
        };

        let errors = input.validate().unwrap_err();
        assert_eq!(errors.get("name"), ["can't be blank"]);
        assert_eq!(errors.get("email"), ["is not a valid email address"]);
        assert_eq!(errors.get("team_id"), ["is not a valid id"]);
    }
}
