//! Projects and their tracked dates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use people_core::{ProjectDates, ProjectId};

use super::validation::{self, ValidationErrors, opt_string, optional_date, required_text};

pub const END_BEFORE_START: &str = "must not be before starts at";

/// A project row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub kickoff: Option<NaiveDate>,
    pub starts_at: Option<NaiveDate>,
    pub end_at: Option<NaiveDate>,
    /// Derived from the name at creation, never recomputed.
    pub initials: String,
    /// `#rrggbb`, assigned at creation.
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// The three dates watched by the change notifier.
    #[must_use]
    pub fn dates(&self) -> ProjectDates {
        ProjectDates {
            kickoff: self.kickoff,
            starts_at: self.starts_at,
            end_at: self.end_at,
        }
    }
}

/// Raw project form / JSON body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectInput {
    #[serde(default, deserialize_with = "opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub kickoff: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub starts_at: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub end_at: Option<String>,
}

/// Validated project attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectParams {
    pub name: String,
    pub dates: ProjectDates,
}

impl ProjectInput {
    /// Validate presence, date format and chronology.
    ///
    /// `end_at` may not precede `starts_at` when both are set. Name
    /// uniqueness is checked by the repository.
    ///
    /// # Errors
    ///
    /// Returns the field errors found.
    pub fn validate(&self) -> Result<ProjectParams, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = required_text(&mut errors, "name", self.name.as_ref());
        let kickoff = optional_date(&mut errors, "kickoff", self.kickoff.as_ref());
        let starts_at = optional_date(&mut errors, "starts_at", self.starts_at.as_ref());
        let end_at = optional_date(&mut errors, "end_at", self.end_at.as_ref());

        if let (Some(starts_at), Some(end_at)) = (starts_at, end_at)
            && end_at < starts_at
        {
            errors.add("end_at", END_BEFORE_START);
        }

        errors.into_result(ProjectParams {
            name,
            dates: ProjectDates {
                kickoff,
                starts_at,
                end_at,
            },
        })
    }
}

impl ProjectInput {
    /// Fill every attribute missing from the request with the stored value.
    ///
    /// A blank or `null` value is kept as sent and still clears the field.
    #[must_use]
    pub fn or_current(self, current: &Project) -> Self {
        let stored = Self::from(current);
        Self {
            name: self.name.or(stored.name),
            kickoff: self.kickoff.or(stored.kickoff),
            starts_at: self.starts_at.or(stored.starts_at),
            end_at: self.end_at.or(stored.end_at),
        }
    }
}

impl From<&Project> for ProjectInput {
    fn from(project: &Project) -> Self {
        let ymd = |d: Option<NaiveDate>| d.map(|d| d.format("%Y-%m-%d").to_string());
        Self {
            name: Some(project.name.clone()),
            kickoff: ymd(project.kickoff),
            starts_at: ymd(project.starts_at),
            end_at: ymd(project.end_at),
        }
    }
}

#[must_use]
pub fn name_taken() -> ValidationErrors {
    ValidationErrors::single("name", validation::TAKEN)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Days, Local};

    use super::*;

    fn input(starts_at: Option<NaiveDate>, end_at: Option<NaiveDate>) -> ProjectInput {
        let ymd = |d: Option<NaiveDate>| d.map(|d| d.to_string());
        ProjectInput {
            name: Some("Portal".into()),
            kickoff: None,
            starts_at: ymd(starts_at),
            end_at: ymd(end_at),
        }
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    #[test]
    fn test_end_before_start_is_invalid() {
        let two_days_ago = today().checked_sub_days(Days::new(2)).unwrap();
        let errors = input(Some(today()), Some(two_days_ago)).validate().unwrap_err();
        assert_eq!(errors.get("end_at"), [END_BEFORE_START]);
    }

    #[test]
    fn test_end_after_start_is_valid() {
        let two_days_ago = today().checked_sub_days(Days::new(2)).unwrap();
        assert!(input(Some(two_days_ago), Some(today())).validate().is_ok());
    }

    #[test]
    fn test_same_day_is_valid() {
        assert!(input(Some(today()), Some(today())).validate().is_ok());
    }

    #[test]
    fn test_open_ended_dates_are_valid() {
        let later = today().checked_add_days(Days::new(3)).unwrap();
        assert!(input(Some(today()), None).validate().is_ok());
        assert!(input(None, Some(later)).validate().is_ok());
    }

    #[test]
    fn test_requires_name_and_parseable_dates() {
        let project = ProjectInput {
            kickoff: Some("next week".into()),
            ..ProjectInput::default()
        };
        let errors = project.validate().unwrap_err();
        assert_eq!(errors.get("name"), ["can't be blank"]);
        assert_eq!(errors.get("kickoff"), [validation::INVALID_DATE]);
    }

    fn atlas() -> Project {
        let now = Utc::now();
        Project {
            id: ProjectId::new(1),
            name: "Atlas".into(),
            kickoff: None,
            starts_at: NaiveDate::from_ymd_opt(2026, 1, 10),
            end_at: NaiveDate::from_ymd_opt(2026, 12, 16),
            initials: "A".into(),
            color: "#336699".into(),
            created_at: now,
            updated_at: now,
        }
    }

    fn patch(body: &str) -> ProjectParams {
        let input: ProjectInput = serde_json::from_str(body).unwrap();
        input.or_current(&atlas()).validate().unwrap()
    }

    #[test]
    fn test_kickoff_only_update_reports_only_kickoff() {
        let before = atlas();

        for body in [
            r#"{"kickoff": "2026-12-17"}"#,
            r#"{"name": "Atlas", "kickoff": "2026-12-17"}"#,
        ] {
            let params = patch(body);
            assert_eq!(params.name, "Atlas");
            assert_eq!(params.dates.starts_at, before.starts_at);
            assert_eq!(params.dates.end_at, before.end_at);

            let changes = params.dates.changes_since(&before.dates());
            assert_eq!(
                people_core::dates_updated_message("Atlas", &changes).as_deref(),
                Some("Dates in project *Atlas* has been updated.\n*Kickoff* changed to _2026-12-17_.")
            );
        }
    }

    #[test]
    fn test_rename_only_update_keeps_dates() {
        let params = patch(r#"{"name": "Atlas Two"}"#);
        assert_eq!(params.name, "Atlas Two");
        assert_eq!(params.dates, atlas().dates());
    }

    #[test]
    fn test_explicit_null_clears_a_date() {
        let params = patch(r#"{"end_at": null}"#);
        assert_eq!(params.dates.end_at, None);
        assert_eq!(params.dates.starts_at, atlas().starts_at);
    }

    #[test]
    fn test_blank_dates_clear() {
        let project = ProjectInput {
            name: Some("Portal".into()),
            kickoff: Some(String::new()),
            starts_at: Some("2026-01-01".into()),
            end_at: Some(" ".into()),
        };
        let params = project.validate().unwrap();
        assert_eq!(params.dates.kickoff, None);
        assert_eq!(params.dates.end_at, None);
    }
}
