//! Core types for People.
//!
//! This module provides type-safe wrappers and pure domain rules.

pub mod dates;
pub mod email;
pub mod id;
pub mod project;

pub use dates::{DateChange, DateField, FieldChange, ProjectDates, dates_updated_message};
pub use email::{Email, EmailError};
pub use id::*;
pub use project::{initials, random_color};
