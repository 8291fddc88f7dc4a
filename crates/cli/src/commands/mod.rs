//! CLI subcommands.

pub mod migrate;
pub mod role;
pub mod user;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by commands that talk to the database.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Neither `PEOPLE_DATABASE_URL` nor `DATABASE_URL` is set.
    #[error("Missing environment variable: PEOPLE_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    /// Could not connect.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect using `PEOPLE_DATABASE_URL`, falling back to `DATABASE_URL`.
pub async fn connect() -> Result<PgPool, ConnectError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("PEOPLE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConnectError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to database...");
    Ok(PgPool::connect(database_url.expose_secret()).await?)
}
