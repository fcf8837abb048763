use crate::error::RepositoryError;
use crate::models::{League, LeagueUser};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Repository for leagues and their memberships
pub struct LeagueRepository {
    pool: PgPool,
}

impl LeagueRepository {
    /// Create a new LeagueRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a league by id
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<League>, RepositoryError> {
        let league = sqlx::query_as::<_, League>(
            r#"
            SELECT id, name, created_at, deleted_at
            FROM leagues
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(league)
    }

    /// Find a participant by id
    pub async fn find_league_user(&self, id: Uuid) -> Result<Option<LeagueUser>, RepositoryError> {
        let league_user = sqlx::query_as::<_, LeagueUser>(
            r#"
            SELECT id, league_id, user_id, is_active, is_admin,
                   created_at, updated_at, deleted_at
            FROM league_users
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(league_user)
    }

    /// Find a user's membership in a league
    pub async fn find_membership(
        &self,
        league_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<LeagueUser>, RepositoryError> {
        let league_user = sqlx::query_as::<_, LeagueUser>(
            r#"
            SELECT id, league_id, user_id, is_active, is_admin,
                   created_at, updated_at, deleted_at
            FROM league_users
            WHERE league_id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(league_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(league_user)
    }

    /// All active, non-deleted participants of a league, oldest first
    pub async fn list_active_participants(
        &self,
        league_id: Uuid,
    ) -> Result<Vec<LeagueUser>, RepositoryError> {
        let participants = sqlx::query_as::<_, LeagueUser>(
            r#"
            SELECT id, league_id, user_id, is_active, is_admin,
                   created_at, updated_at, deleted_at
            FROM league_users
            WHERE league_id = $1 AND is_active = TRUE AND deleted_at IS NULL
            ORDER BY created_at
            "#,
        )
        .bind(league_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(participants)
    }

    /// Soft-delete a participant. Their picks are retired in the same
    /// transaction so historical point attribution survives.
    pub async fn retire_participant(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        league_user_id: Uuid,
    ) -> Result<(), RepositoryError> {
        let updated = sqlx::query(
            r#"
            UPDATE league_users
            SET deleted_at = NOW(), is_active = FALSE, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(league_user_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "Participant {} not found",
                league_user_id
            )));
        }

        for table in [
            "user_bets",
            "user_special_bet_series",
            "user_special_bet_singles",
            "user_special_bet_questions",
        ] {
            sqlx::query(&format!(
                "UPDATE {} SET deleted_at = NOW(), updated_at = NOW() \
                 WHERE league_user_id = $1 AND deleted_at IS NULL",
                table
            ))
            .bind(league_user_id)
            .execute(&mut *tx)
            .await?;
        }

        Ok(())
    }
}
