//! Teams: named groups of users with an optional leader.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use people_core::{TeamId, UserId};

use super::validation::{
    self, NOT_A_NUMBER, ValidationErrors, opt_string, opt_string_list, optional_id, present,
    required_text,
};

/// A team row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub team_leader_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A team with its member ids, as rendered in JSON responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamWithMembers {
    #[serde(flatten)]
    pub team: Team,
    pub user_ids: Vec<UserId>,
}

/// Raw team form / JSON body.
///
/// `users` is accepted as an alias of `user_ids`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamInput {
    #[serde(default, deserialize_with = "opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub team_leader_id: Option<String>,
    #[serde(default, alias = "users", deserialize_with = "opt_string_list")]
    pub user_ids: Option<Vec<String>>,
}

/// Validated team attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamParams {
    pub name: String,
    pub team_leader_id: Option<UserId>,
    pub user_ids: Vec<UserId>,
}

impl TeamInput {
    /// Validate presence and shape. Name uniqueness is checked by the repository.
    ///
    /// # Errors
    ///
    /// Returns the field errors found.
    pub fn validate(&self) -> Result<TeamParams, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = required_text(&mut errors, "name", self.name.as_ref());
        let team_leader_id = optional_id(&mut errors, "team_leader_id", self.team_leader_id.as_ref());

        let mut user_ids: Vec<UserId> = Vec::new();
        for raw in self.user_ids.iter().flatten() {
            let Some(raw) = present(Some(raw)) else {
                continue;
            };
            match raw.parse::<i32>() {
                Ok(id) if !user_ids.contains(&UserId::new(id)) => user_ids.push(UserId::new(id)),
                Ok(_) => {}
                Err(_) => errors.add("user_ids", NOT_A_NUMBER),
            }
        }

        errors.into_result(TeamParams {
            name,
            team_leader_id,
            user_ids,
        })
    }
}

impl TeamInput {
    /// Fill every attribute missing from the request with the stored value,
    /// so a rename alone keeps the leader and the members.
    #[must_use]
    pub fn or_current(self, current: &TeamWithMembers) -> Self {
        let stored = Self::from(current);
        Self {
            name: self.name.or(stored.name),
            team_leader_id: self.team_leader_id.or(stored.team_leader_id),
            user_ids: self.user_ids.or(stored.user_ids),
        }
    }
}

impl From<&TeamWithMembers> for TeamInput {
    fn from(team: &TeamWithMembers) -> Self {
        Self {
            name: Some(team.team.name.clone()),
            team_leader_id: team.team.team_leader_id.map(|id| id.to_string()),
            user_ids: Some(team.user_ids.iter().map(ToString::to_string).collect()),
        }
    }
}

/// Duplicate-name error in the same shape as other validation failures.
#[must_use]
pub fn name_taken() -> ValidationErrors {
    ValidationErrors::single("name", validation::TAKEN)
}
