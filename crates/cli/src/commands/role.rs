//! Role management commands.
//!
//! # Usage
//!
//! ```bash
//! # The project manager role is matched by name
//! people-cli role create pm
//! ```

use people_server::db::{RepositoryError, RoleRepository};
use thiserror::Error;

use super::{ConnectError, connect};

#[derive(Debug, Error)]
pub enum RoleError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Role name can't be blank")]
    BlankName,

    #[error("Role already exists: {0}")]
    RoleExists(String),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Create a role. Returns the new role's ID.
pub async fn create(name: &str) -> Result<i32, RoleError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RoleError::BlankName);
    }

    let pool = connect().await?;
    let role = match RoleRepository::new(&pool).create(name).await {
        Ok(role) => role,
        Err(RepositoryError::Conflict(_)) => return Err(RoleError::RoleExists(name.to_owned())),
        Err(e) => return Err(e.into()),
    };

    tracing::info!("Role created successfully! ID: {}, Name: {}", role.id, role.name);
    Ok(role.id.as_i32())
}
