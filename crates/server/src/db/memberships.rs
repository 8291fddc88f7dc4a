//! Membership repository.

use sqlx::PgPool;

use people_core::{MembershipId, ProjectId};

use super::{RepositoryError, map_constraint};
use crate::models::{Membership, MembershipParams};

/// Repository for project membership database operations.
pub struct MembershipRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MembershipRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Memberships of a project in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Membership>, RepositoryError> {
        let memberships = sqlx::query_as::<_, Membership>(
            r"
            SELECT m.id, m.project_id, m.user_id, m.role_id, m.starts_at, m.ends_at,
                   u.name AS user_name, r.name AS role_name
            FROM memberships m
            JOIN users u ON u.id = m.user_id
            JOIN roles r ON r.id = m.role_id
            WHERE m.project_id = $1
            ORDER BY m.id
            ",
        )
        .bind(project_id)
        .fetch_all(self.pool)
        .await?;
        Ok(memberships)
    }

    /// Add a membership to a project.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidReference` for an unknown project, user or role.
    pub async fn create(
        &self,
        project_id: ProjectId,
        params: &MembershipParams,
    ) -> Result<MembershipId, RepositoryError> {
        sqlx::query_scalar::<_, MembershipId>(
            "INSERT INTO memberships (project_id, user_id, role_id, starts_at, ends_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(project_id)
        .bind(params.user_id)
        .bind(params.role_id)
        .bind(params.starts_at)
        .bind(params.ends_at)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_constraint(e, "membership"))
    }

    /// Remove a membership from a project.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the project has no such membership.
    pub async fn delete(
        &self,
        project_id: ProjectId,
        id: MembershipId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM memberships WHERE id = $1 AND project_id = $2")
            .bind(id)
            .bind(project_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
