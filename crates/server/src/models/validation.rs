//! Field-level validation errors and helpers for reading request input.
//!
//! Request bodies arrive either as HTML forms (every value a string) or as
//! JSON (numbers, booleans, arrays). Input structs deserialize every field
//! through [`opt_string`] or [`string_list`] so both shapes land in the same
//! type, and `validate()` methods turn the strings into typed parameters.

use std::fmt;

use chrono::NaiveDate;
use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

pub const BLANK: &str = "can't be blank";
pub const TAKEN: &str = "has already been taken";
pub const INVALID_DATE: &str = "is not a valid date (expected YYYY-MM-DD)";
pub const NOT_A_NUMBER: &str = "is not a valid id";

/// Field name → messages, in the order the errors were found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: Vec<(String, Vec<String>)>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        let message = message.into();
        if let Some((_, messages)) = self.fields.iter_mut().find(|(name, _)| name == field) {
            messages.push(message);
        } else {
            self.fields.push((field.to_string(), vec![message]));
        }
    }

    /// Build an error set with a single message.
    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Messages recorded for one field.
    #[must_use]
    pub fn get(&self, field: &str) -> &[String] {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map_or(&[], |(_, messages)| messages.as_slice())
    }

    /// Human-readable messages such as `"Name can't be blank"`.
    #[must_use]
    pub fn full_messages(&self) -> Vec<String> {
        self.fields
            .iter()
            .flat_map(|(field, messages)| {
                let label = humanize(field);
                messages.iter().map(move |m| format!("{label} {m}"))
            })
            .collect()
    }

    /// `Ok(value)` when no errors were recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` if any error was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_messages().join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, messages) in &self.fields {
            map.serialize_entry(field, messages)?;
        }
        map.end()
    }
}

/// `starts_at` → `Starts at`.
fn humanize(field: &str) -> String {
    let field = field.strip_suffix("_id").unwrap_or(field);
    let spaced = field.replace('_', " ");
    let mut chars = spaced.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

// =============================================================================
// Field parsing
// =============================================================================

/// Trimmed value, or `None` when missing or blank.
#[must_use]
pub fn present(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Required text field.
pub fn required_text(errors: &mut ValidationErrors, field: &str, value: Option<&String>) -> String {
    present(value).map_or_else(
        || {
            errors.add(field, BLANK);
            String::new()
        },
        ToString::to_string,
    )
}

/// Optional `YYYY-MM-DD` date; blank means `None`.
pub fn optional_date(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&String>,
) -> Option<NaiveDate> {
    let raw = present(value)?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| errors.add(field, INVALID_DATE))
        .ok()
}

/// Required `YYYY-MM-DD` date.
pub fn required_date(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&String>,
) -> Option<NaiveDate> {
    if present(value).is_none() {
        errors.add(field, BLANK);
        return None;
    }
    optional_date(errors, field, value)
}

/// Optional numeric id; blank means `None`.
pub fn optional_id<T: From<i32>>(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&String>,
) -> Option<T> {
    let raw = present(value)?;
    raw.parse::<i32>()
        .map(T::from)
        .map_err(|_| errors.add(field, NOT_A_NUMBER))
        .ok()
}

/// Required numeric id.
pub fn required_id<T: From<i32>>(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&String>,
) -> Option<T> {
    if present(value).is_none() {
        errors.add(field, BLANK);
        return None;
    }
    optional_id(errors, field, value)
}

/// Checkbox-style flag: `1`, `true`, `on`, `yes` are true.
#[must_use]
pub fn flag(value: Option<&String>) -> bool {
    present(value).is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "on" | "yes"))
}

// =============================================================================
// Deserialization helpers
// =============================================================================

/// Accept a string, number, boolean or null as an optional string.
///
/// An explicit `null` reads as blank, so only a missing key (left to
/// `#[serde(default)]`) stays `None`. Updates use that to keep the stored
/// value of every attribute the request did not mention.
///
/// # Errors
///
/// Fails for maps and sequences.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(Some(
        Option::<Scalar>::deserialize(deserializer)?.map_or_else(String::new, |scalar| {
            match scalar {
                Scalar::Text(s) => s,
                Scalar::Int(n) => n.to_string(),
                Scalar::Float(n) => n.to_string(),
                Scalar::Bool(b) => b.to_string(),
            }
        }),
    ))
}

/// Accept a single scalar or a sequence of scalars as a list of strings.
///
/// # Errors
///
/// Fails for maps.
pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ListVisitor;

    impl<'de> Visitor<'de> for ListVisitor {
        type Value = Vec<String>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string, a number, or a list of them")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut out = Vec::new();
            while let Some(item) = seq.next_element::<serde_json::Value>()? {
                match item {
                    serde_json::Value::String(s) => out.push(s),
                    serde_json::Value::Number(n) => out.push(n.to_string()),
                    serde_json::Value::Null => {}
                    other => {
                        return Err(de::Error::invalid_type(
                            de::Unexpected::Other(&other.to_string()),
                            &self,
                        ));
                    }
                }
            }
            Ok(out)
        }
    }

    deserializer.deserialize_any(ListVisitor)
}

/// [`string_list`] that stays `None` when the key is missing.
///
/// # Errors
///
/// Fails for maps.
pub fn opt_string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    string_list(deserializer).map(Some)
}
