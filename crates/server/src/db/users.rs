//! User repository.

use sqlx::PgPool;

use people_core::{Email, TeamId, UserId};

use super::{RepositoryError, map_constraint};
use crate::models::{User, UserParams};

const USER_COLUMNS: &str =
    "id, name, email, admin, team_id, primary_role_id, created_at, updated_at";

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all users ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY name, id"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(users)
    }

    /// Members of a team.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_team(&self, team_id: TeamId) -> Result<Vec<User>, RepositoryError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE team_id = $1 ORDER BY name, id"
        ))
        .bind(team_id)
        .fetch_all(self.pool)
        .await?;
        Ok(users)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Look up the user the auth proxy identified.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Create a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists and
    /// `RepositoryError::InvalidReference` for an unknown team or role.
    pub async fn create(&self, params: &UserParams) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, admin, team_id, primary_role_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&params.name)
        .bind(&params.email)
        .bind(params.admin)
        .bind(params.team_id)
        .bind(params.primary_role_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_constraint(e, "email"))
    }

    /// Update a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist, plus
    /// the same constraint errors as [`Self::create`].
    pub async fn update(&self, id: UserId, params: &UserParams) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users \
             SET name = $2, email = $3, admin = $4, team_id = $5, primary_role_id = $6, \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&params.name)
        .bind(&params.email)
        .bind(params.admin)
        .bind(params.team_id)
        .bind(params.primary_role_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_constraint(e, "email"))?
        .ok_or(RepositoryError::NotFound)
    }
}
