//! Position repository.
//!
//! A user has at most one primary position; flagging one clears the others
//! and moves the user's `primary_role_id` to the position's role.

use sqlx::{PgConnection, PgPool};

use people_core::{PositionId, RoleId, UserId};

use super::{RepositoryError, map_constraint};
use crate::models::{Position, PositionDetails, PositionParams};

const POSITION_COLUMNS: &str =
    r#"id, user_id, role_id, starts_at, "primary", created_at, updated_at"#;

const DETAILS_QUERY: &str = r#"
    SELECT p.id, p.user_id, p.role_id, p.starts_at, p."primary",
           u.name AS user_name, u.email AS user_email, r.name AS role_name
    FROM positions p
    JOIN users u ON u.id = p.user_id
    JOIN roles r ON r.id = p.role_id
"#;

/// Repository for position database operations.
pub struct PositionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PositionRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: PositionId) -> Result<Option<Position>, RepositoryError> {
        let position = sqlx::query_as::<_, Position>(&format!(
            "SELECT {POSITION_COLUMNS} FROM positions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(position)
    }

    /// Position with user and role names, for display and mail.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn details(&self, id: PositionId) -> Result<Option<PositionDetails>, RepositoryError> {
        let details = sqlx::query_as::<_, PositionDetails>(&format!("{DETAILS_QUERY} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(details)
    }

    /// Positions of one user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PositionDetails>, RepositoryError> {
        let positions = sqlx::query_as::<_, PositionDetails>(&format!(
            "{DETAILS_QUERY} WHERE p.user_id = $1 ORDER BY p.starts_at DESC, p.id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(positions)
    }

    /// Create a position.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidReference` for an unknown user or role.
    pub async fn create(&self, params: &PositionParams) -> Result<Position, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let position = sqlx::query_as::<_, Position>(&format!(
            r#"INSERT INTO positions (user_id, role_id, starts_at, "primary")
               VALUES ($1, $2, $3, $4)
               RETURNING {POSITION_COLUMNS}"#
        ))
        .bind(params.user_id)
        .bind(params.role_id)
        .bind(params.starts_at)
        .bind(params.primary)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_constraint(e, "position"))?;

        if position.primary {
            make_primary(&mut *tx, &position).await?;
        }
        tx.commit().await?;

        Ok(position)
    }

    /// Update a position.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the position does not exist and
    /// `RepositoryError::InvalidReference` for an unknown user or role.
    pub async fn update(
        &self,
        id: PositionId,
        params: &PositionParams,
    ) -> Result<Position, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let position = sqlx::query_as::<_, Position>(&format!(
            r#"UPDATE positions
               SET user_id = $2, role_id = $3, starts_at = $4, "primary" = $5, updated_at = now()
               WHERE id = $1
               RETURNING {POSITION_COLUMNS}"#
        ))
        .bind(id)
        .bind(params.user_id)
        .bind(params.role_id)
        .bind(params.starts_at)
        .bind(params.primary)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_constraint(e, "position"))?
        .ok_or(RepositoryError::NotFound)?;

        if position.primary {
            make_primary(&mut *tx, &position).await?;
        }
        tx.commit().await?;

        Ok(position)
    }

    /// Flip the primary flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the position does not exist.
    pub async fn toggle_primary(&self, id: PositionId) -> Result<Position, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let position = sqlx::query_as::<_, Position>(&format!(
            r#"UPDATE positions SET "primary" = NOT "primary", updated_at = now()
               WHERE id = $1
               RETURNING {POSITION_COLUMNS}"#
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if position.primary {
            make_primary(&mut *tx, &position).await?;
        } else {
            sqlx::query(
                "UPDATE users SET primary_role_id = NULL, updated_at = now() \
                 WHERE id = $1 AND primary_role_id = $2",
            )
            .bind(position.user_id)
            .bind(position.role_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(position)
    }

    /// Delete a position.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the position does not exist.
    pub async fn delete(&self, id: PositionId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM positions WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Clear the user's other primary positions and adopt this position's role.
async fn make_primary(conn: &mut PgConnection, position: &Position) -> Result<(), RepositoryError> {
    sqlx::query(
        r#"UPDATE positions SET "primary" = FALSE, updated_at = now()
           WHERE user_id = $1 AND id <> $2 AND "primary""#,
    )
    .bind(position.user_id)
    .bind(position.id)
    .execute(&mut *conn)
    .await?;

    set_primary_role(conn, position.user_id, position.role_id).await
}

async fn set_primary_role(
    conn: &mut PgConnection,
    user_id: UserId,
    role_id: RoleId,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE users SET primary_role_id = $2, updated_at = now() WHERE id = $1")
        .bind(user_id)
        .bind(role_id)
        .execute(conn)
        .await?;
    Ok(())
}
