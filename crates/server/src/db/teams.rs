//! Team repository.
//!
//! Membership is stored on `users.team_id`; saving a team rewrites which
//! users point at it inside one transaction.

use sqlx::{PgPool, Postgres, Transaction};

use people_core::{TeamId, UserId};

use super::{RepositoryError, map_constraint};
use crate::models::{Team, TeamParams, TeamWithMembers};

const TEAM_COLUMNS: &str = "id, name, team_leader_id, created_at, updated_at";

/// Repository for team database operations.
pub struct TeamRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TeamRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all teams ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Team>, RepositoryError> {
        let teams = sqlx::query_as::<_, Team>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams ORDER BY lower(name), id"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(teams)
    }

    /// Get a team with its member ids.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_by_id(&self, id: TeamId) -> Result<Option<TeamWithMembers>, RepositoryError> {
        let Some(team) = sqlx::query_as::<_, Team>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let user_ids =
            sqlx::query_scalar::<_, UserId>("SELECT id FROM users WHERE team_id = $1 ORDER BY id")
                .bind(id)
                .fetch_all(self.pool)
                .await?;

        Ok(Some(TeamWithMembers { team, user_ids }))
    }

    /// Create a team and attach its members.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken (case-insensitive)
    /// and `RepositoryError::InvalidReference` for an unknown leader.
    pub async fn create(&self, params: &TeamParams) -> Result<TeamWithMembers, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let team = sqlx::query_as::<_, Team>(&format!(
            "INSERT INTO teams (name, team_leader_id) VALUES ($1, $2) RETURNING {TEAM_COLUMNS}"
        ))
        .bind(&params.name)
        .bind(params.team_leader_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_constraint(e, "team name"))?;

        let user_ids = replace_members(&mut tx, team.id, &params.user_ids).await?;
        tx.commit().await?;

        Ok(TeamWithMembers { team, user_ids })
    }

    /// Update a team's name, leader and members.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the team does not exist, plus
    /// the same constraint errors as [`Self::create`].
    pub async fn update(
        &self,
        id: TeamId,
        params: &TeamParams,
    ) -> Result<TeamWithMembers, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let team = sqlx::query_as::<_, Team>(&format!(
            "UPDATE teams SET name = $2, team_leader_id = $3, updated_at = now() \
             WHERE id = $1 RETURNING {TEAM_COLUMNS}"
        ))
        .bind(id)
        .bind(&params.name)
        .bind(params.team_leader_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_constraint(e, "team name"))?
        .ok_or(RepositoryError::NotFound)?;

        let user_ids = replace_members(&mut tx, id, &params.user_ids).await?;
        tx.commit().await?;

        Ok(TeamWithMembers { team, user_ids })
    }

    /// Delete a team. Its users are left without a team.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the team does not exist.
    pub async fn delete(&self, id: TeamId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| map_constraint(e, "team"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Make exactly `user_ids` point at `team_id`; returns the ids that exist.
async fn replace_members(
    tx: &mut Transaction<'_, Postgres>,
    team_id: TeamId,
    user_ids: &[UserId],
) -> Result<Vec<UserId>, RepositoryError> {
    let ids: Vec<i32> = user_ids.iter().map(|id| id.as_i32()).collect();

    sqlx::query(
        "UPDATE users SET team_id = NULL, updated_at = now() \
         WHERE team_id = $1 AND NOT (id = ANY($2))",
    )
    .bind(team_id)
    .bind(&ids)
    .execute(&mut **tx)
    .await?;

    let members = sqlx::query_scalar::<_, UserId>(
        "UPDATE users SET team_id = $1, updated_at = now() \
         WHERE id = ANY($2) RETURNING id",
    )
    .bind(team_id)
    .bind(&ids)
    .fetch_all(&mut **tx)
    .await?;

    if members.len() != ids.len() {
        return Err(RepositoryError::InvalidReference("user_ids".to_owned()));
    }

    let mut members = members;
    members.sort_unstable();
    Ok(members)
}
