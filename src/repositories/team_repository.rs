use crate::error::RepositoryError;
use crate::models::{Player, Team};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Repository for team and player reference data
pub struct TeamRepository {
    pool: PgPool,
}

impl TeamRepository {
    /// Create a new TeamRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a team by id
    pub async fn find_team(&self, id: Uuid) -> Result<Option<Team>, RepositoryError> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            SELECT id, name, shortcut, created_at, deleted_at
            FROM teams
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(team)
    }

    /// Find a player by id
    pub async fn find_player(&self, id: Uuid) -> Result<Option<Player>, RepositoryError> {
        let player = sqlx::query_as::<_, Player>(
            r#"
            SELECT id, team_id, name, created_at, deleted_at
            FROM players
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(player)
    }

    /// Player lookup through a pick-submission transaction, so the team
    /// membership check sees the same snapshot the pick is written against
    pub async fn find_player_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<Player>, RepositoryError> {
        let player = sqlx::query_as::<_, Player>(
            r#"
            SELECT id, team_id, name, created_at, deleted_at
            FROM players
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        Ok(player)
    }
}
