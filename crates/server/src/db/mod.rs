//! Database operations for the people `PostgreSQL` database.
//!
//! # Tables
//!
//! - `users` - People, with optional team and primary role
//! - `teams` - Named groups of users with a leader
//! - `roles` - Role names (`pm` marks project managers)
//! - `positions` - A user holding a role from a date
//! - `projects` - Projects and their tracked dates
//! - `memberships` - A user on a project in a role for an interval
//! - `session` - tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p people-cli -- migrate
//! ```

pub mod memberships;
pub mod positions;
pub mod projects;
pub mod roles;
pub mod teams;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use memberships::MembershipRepository;
pub use positions::PositionRepository;
pub use projects::ProjectRepository;
pub use roles::RoleRepository;
pub use teams::TeamRepository;
pub use users::UserRepository;

/// Migrations embedded from `crates/server/migrations`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation (e.g., duplicate team name).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Foreign key points at a row that does not exist.
    #[error("invalid reference: {0}")]
    InvalidReference(String),
}

/// Map unique and foreign key violations to their own variants.
fn map_constraint(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(format!("{what} already exists"));
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::InvalidReference(
                db_err.constraint().unwrap_or(what).to_owned(),
            );
        }
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
