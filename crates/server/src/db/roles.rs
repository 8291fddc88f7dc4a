//! Role repository.

use sqlx::PgPool;

use super::{RepositoryError, map_constraint};
use crate::models::Role;

/// Repository for role database operations.
pub struct RoleRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RoleRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Role>, RepositoryError> {
        let roles =
            sqlx::query_as::<_, Role>("SELECT id, name, created_at FROM roles ORDER BY lower(name)")
                .fetch_all(self.pool)
                .await?;
        Ok(roles)
    }

    /// Create a role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name exists (case-insensitive).
    pub async fn create(&self, name: &str) -> Result<Role, RepositoryError> {
        sqlx::query_as::<_, Role>(
            "INSERT INTO roles (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_constraint(e, "role name"))
    }
}
