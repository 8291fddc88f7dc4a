//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create the first admin so someone can sign in through the proxy
//! people-cli user create -e ada@example.com -n "Ada Lovelace" --admin
//! ```

use people_core::Email;
use people_server::db::{RepositoryError, UserRepository};
use people_server::models::UserParams;
use thiserror::Error;

use super::{ConnectError, connect};

#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Name can't be blank")]
    BlankName,

    #[error("User already exists with email: {0}")]
    UserExists(String),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Create a user. Returns the new user's ID.
pub async fn create(email: &str, name: &str, admin: bool) -> Result<i32, UserError> {
    let email = Email::parse(email).map_err(|e| UserError::InvalidEmail(e.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(UserError::BlankName);
    }

    let pool = connect().await?;
    let params = UserParams {
        name: name.to_owned(),
        email: email.clone(),
        admin,
        team_id: None,
        primary_role_id: None,
    };

    let user = match UserRepository::new(&pool).create(&params).await {
        Ok(user) => user,
        Err(RepositoryError::Conflict(_)) => return Err(UserError::UserExists(email.to_string())),
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Admin: {}",
        user.id,
        user.email,
        user.admin
    );
    Ok(user.id.as_i32())
}
