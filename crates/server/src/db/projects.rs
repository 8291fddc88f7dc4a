//! Project repository.

use sqlx::PgPool;

use people_core::ProjectId;

use super::{RepositoryError, map_constraint};
use crate::models::{Project, ProjectParams};

const PROJECT_COLUMNS: &str =
    "id, name, kickoff, starts_at, end_at, initials, color, created_at, updated_at";

/// Repository for project database operations.
pub struct ProjectRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProjectRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Project>, RepositoryError> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY lower(name), id"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(projects)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(project)
    }

    /// Whether another project already uses `name`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn name_taken(
        &self,
        name: &str,
        except: Option<ProjectId>,
    ) -> Result<bool, RepositoryError> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM projects \
             WHERE lower(name) = lower($1) AND ($2::int IS NULL OR id <> $2))",
        )
        .bind(name)
        .bind(except)
        .fetch_one(self.pool)
        .await?;
        Ok(taken)
    }

    /// Insert a project with its derived initials and color.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    pub async fn create(
        &self,
        params: &ProjectParams,
        initials: &str,
        color: &str,
    ) -> Result<Project, RepositoryError> {
        sqlx::query_as::<_, Project>(&format!(
            "INSERT INTO projects (name, kickoff, starts_at, end_at, initials, color) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(&params.name)
        .bind(params.dates.kickoff)
        .bind(params.dates.starts_at)
        .bind(params.dates.end_at)
        .bind(initials)
        .bind(color)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_constraint(e, "project name"))
    }

    /// Update name and dates. Initials and color are left untouched.
    ///
    /// The row is locked for the duration, and both the previous and the
    /// saved row are returned so callers diff against what was actually
    /// replaced.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the project does not exist and
    /// `RepositoryError::Conflict` if the name is taken.
    pub async fn update(
        &self,
        id: ProjectId,
        params: &ProjectParams,
    ) -> Result<(Project, Project), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let before = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let after = sqlx::query_as::<_, Project>(&format!(
            "UPDATE projects \
             SET name = $2, kickoff = $3, starts_at = $4, end_at = $5, updated_at = now() \
             WHERE id = $1 \
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(id)
        .bind(&params.name)
        .bind(params.dates.kickoff)
        .bind(params.dates.starts_at)
        .bind(params.dates.end_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_constraint(e, "project name"))?;

        tx.commit().await?;
        Ok((before, after))
    }

    /// Delete a project and its memberships.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the project does not exist.
    pub async fn delete(&self, id: ProjectId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
