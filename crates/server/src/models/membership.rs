//! Memberships: a user working on a project in a role for a period of time.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use people_core::{MembershipId, ProjectId, RoleId, UserId};

use super::role::PROJECT_MANAGER;
use super::validation::{ValidationErrors, opt_string, optional_date, required_date, required_id};

pub const ENDS_BEFORE_START: &str = "must be after starts at";

/// A membership joined with user and role names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Membership {
    pub id: MembershipId,
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub role_id: RoleId,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub user_name: String,
    pub role_name: String,
}

impl Membership {
    /// Whether `at` falls inside `[starts_at, ends_at)`.
    #[must_use]
    pub fn is_current_at(&self, at: DateTime<Utc>) -> bool {
        self.starts_at <= at && self.ends_at.is_none_or(|ends_at| at < ends_at)
    }

    #[must_use]
    pub fn is_project_manager(&self) -> bool {
        self.role_name.eq_ignore_ascii_case(PROJECT_MANAGER)
    }
}

/// The project manager: the first membership in the `pm` role that is current at `at`.
#[must_use]
pub fn project_manager(memberships: &[Membership], at: DateTime<Utc>) -> Option<&Membership> {
    memberships
        .iter()
        .find(|m| m.is_project_manager() && m.is_current_at(at))
}

/// Raw membership form / JSON body. Dates are `YYYY-MM-DD`, taken at midnight UTC.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MembershipInput {
    #[serde(default, deserialize_with = "opt_string")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub role_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub starts_at: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub ends_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipParams {
    pub user_id: UserId,
    pub role_id: RoleId,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

impl MembershipInput {
    /// # Errors
    ///
    /// Returns the field errors found.
    pub fn validate(&self) -> Result<MembershipParams, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let user_id = required_id(&mut errors, "user_id", self.user_id.as_ref());
        let role_id = required_id(&mut errors, "role_id", self.role_id.as_ref());
        let starts_at = required_date(&mut errors, "starts_at", self.starts_at.as_ref()).map(midnight);
        let ends_at = optional_date(&mut errors, "ends_at", self.ends_at.as_ref()).map(midnight);

        if let (Some(starts_at), Some(ends_at)) = (starts_at, ends_at)
            && ends_at <= starts_at
        {
            errors.add("ends_at", ENDS_BEFORE_START);
        }

        match (user_id, role_id, starts_at) {
            (Some(user_id), Some(role_id), Some(starts_at)) if errors.is_empty() => {
                Ok(MembershipParams {
                    user_id,
                    role_id,
                    starts_at,
                    ends_at,
                })
            }
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn membership(id: i32, role: &str, starts: Duration, ends: Option<Duration>) -> Membership {
        let now = Utc::now();
        Membership {
            id: MembershipId::new(id),
            project_id: ProjectId::new(1),
            user_id: UserId::new(id),
            role_id: RoleId::new(1),
            starts_at: now + starts,
            ends_at: ends.map(|d| now + d),
            user_name: format!("user {id}"),
            role_name: role.to_string(),
        }
    }

    #[test]
    fn test_pm_is_the_current_membership() {
        let memberships = [
            membership(1, "pm", Duration::weeks(-2), Some(Duration::weeks(-1))),
            membership(2, "pm", Duration::weeks(1), Some(Duration::weeks(2))),
            membership(3, "pm", Duration::weeks(-1), Some(Duration::weeks(1))),
        ];

        let pm = project_manager(&memberships, Utc::now()).unwrap();
        assert_eq!(pm.user_id, UserId::new(3));
    }

    #[test]
    fn test_pm_ignores_other_roles() {
        let memberships = [
            membership(1, "developer", Duration::weeks(-1), None),
            membership(2, "PM", Duration::weeks(-1), None),
        ];

        let pm = project_manager(&memberships, Utc::now()).unwrap();
        assert_eq!(pm.user_id, UserId::new(2));
        assert!(project_manager(&memberships[..1], Utc::now()).is_none());
    }

    #[test]
    fn test_interval_is_half_open() {
        let m = membership(1, "pm", Duration::zero(), Some(Duration::days(1)));
        assert!(m.is_current_at(m.starts_at));
        assert!(!m.is_current_at(m.ends_at.unwrap()));
    }

    #[test]
    fn test_validate_rejects_empty_interval() {
        let input = MembershipInput {
            user_id: Some("1".into()),
            role_id: Some("2".into()),
            starts_at: Some("2026-02-01".into()),
            ends_at: Some("2026-02-01".into()),
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.get("ends_at"), [ENDS_BEFORE_START]);
    }

    #[test]
    fn test_validate_open_ended() {
        let input = MembershipInput {
            user_id: Some("1".into()),
            role_id: Some("2".into()),
            starts_at: Some("2026-02-01".into()),
            ends_at: None,
        };
        let params = input.validate().unwrap();
        assert_eq!(params.starts_at.to_rfc3339(), "2026-02-01T00:00:00+00:00");
        assert_eq!(params.ends_at, None);
    }
}
