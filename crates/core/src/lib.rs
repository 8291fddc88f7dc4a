//! People Core - Shared types library.
//!
//! This crate provides common types used across all People components:
//! - `server` - HTTP application for people, teams, positions and projects
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows it
//! to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, emails, project naming rules and date tracking

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
