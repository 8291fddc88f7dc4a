//! Positions: a user holding a role from a given date.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use people_core::{Email, PositionId, RoleId, UserId};

use super::validation::{ValidationErrors, flag, opt_string, required_date, required_id};

/// A position row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Position {
    pub id: PositionId,
    pub user_id: UserId,
    pub role_id: RoleId,
    pub starts_at: NaiveDate,
    pub primary: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A position joined with the names it is displayed and mailed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct PositionDetails {
    pub id: PositionId,
    pub user_id: UserId,
    pub role_id: RoleId,
    pub starts_at: NaiveDate,
    pub primary: bool,
    pub user_name: String,
    pub user_email: Email,
    pub role_name: String,
}

/// Raw position form / JSON body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PositionInput {
    #[serde(default, deserialize_with = "opt_string")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub role_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub starts_at: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub primary: Option<String>,
}

/// Validated position attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionParams {
    pub user_id: UserId,
    pub role_id: RoleId,
    pub starts_at: NaiveDate,
    pub primary: bool,
}

impl PositionInput {
    /// # Errors
    ///
    /// Returns an error per missing or malformed field.
    pub fn validate(&self) -> Result<PositionParams, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let user_id = required_id(&mut errors, "user_id", self.user_id.as_ref());
        let role_id = required_id(&mut errors, "role_id", self.role_id.as_ref());
        let starts_at = required_date(&mut errors, "starts_at", self.starts_at.as_ref());

        match (user_id, role_id, starts_at) {
            (Some(user_id), Some(role_id), Some(starts_at)) if errors.is_empty() => {
                Ok(PositionParams {
                    user_id,
                    role_id,
                    starts_at,
                    primary: flag(self.primary.as_ref()),
                })
            }
            _ => Err(errors),
        }
    }
}

impl From<&Position> for PositionInput {
    fn from(position: &Position) -> Self {
        Self {
            user_id: Some(position.user_id.to_string()),
            role_id: Some(position.role_id.to_string()),
            starts_at: Some(position.starts_at.format("%Y-%m-%d").to_string()),
            primary: Some(position.primary.to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_position() {
        let input = PositionInput {
            user_id: Some("2".into()),
            role_id: Some("5".into()),
            starts_at: Some("2026-03-01".into()),
            primary: None,
        };

        let params = input.validate().unwrap();
        assert_eq!(params.user_id, UserId::new(2));
        assert_eq!(params.role_id, RoleId::new(5));
        assert_eq!(params.starts_at, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert!(!params.primary);
    }

    #[test]
    fn test_validate_requires_user_role_and_start() {
        let errors = PositionInput::default().validate().unwrap_err();
        assert_eq!(errors.get("user_id"), ["can't be blank"]);
        assert_eq!(errors.get("role_id"), ["can't be blank"]);
        assert_eq!(errors.get("starts_at"), ["can't be blank"]);
    }

    #[test]
    fn test_form_round_trip_keeps_primary() {
        let now = Utc::now();
        let position = Position {
            id: PositionId::new(1),
            user_id: UserId::new(2),
            role_id: RoleId::new(3),
            starts_at: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            primary: true,
            created_at: now,
            updated_at: now,
        };

        let params = PositionInput::from(&position).validate().unwrap();
        assert!(params.primary);
        assert_eq!(params.starts_at, position.starts_at);
    }
}
