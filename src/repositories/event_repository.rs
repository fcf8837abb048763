use crate::error::RepositoryError;
use crate::models::{Match, MatchPhase, MatchScorer, Question, Serie, SpecialBetResult, SpecialBetSingle};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

const MATCH_COLUMNS: &str = "id, league_id, phase_id, home_team_id, away_team_id, date_time, \
     game_number, home_score, away_score, is_doubled, is_evaluated, \
     created_at, updated_at, deleted_at";

const SERIE_COLUMNS: &str = "id, league_id, phase_id, home_team_id, away_team_id, date_time, \
     home_wins, away_wins, is_doubled, is_evaluated, \
     created_at, updated_at, deleted_at";

/// Repository for bettable events: matches, series, special bets, questions
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Create a new EventRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ------------------------------------------------------------------
    // Matches
    // ------------------------------------------------------------------

    /// Find a match by id
    pub async fn find_match(&self, id: Uuid) -> Result<Option<Match>, RepositoryError> {
        let m = sqlx::query_as::<_, Match>(&format!(
            "SELECT {} FROM matches WHERE id = $1 AND deleted_at IS NULL",
            MATCH_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(m)
    }

    /// Re-fetch a match inside a transaction, taking a row lock. Guards
    /// (deadline, evaluated flag) must be checked against this snapshot,
    /// not a pre-transaction read.
    pub async fn find_match_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<Match>, RepositoryError> {
        let m = sqlx::query_as::<_, Match>(&format!(
            "SELECT {} FROM matches WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
            MATCH_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        Ok(m)
    }

    /// Write a match's actual result and replace its scorer list
    pub async fn set_match_result(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        home_score: i32,
        away_score: i32,
        game_number: Option<i32>,
        scorer_ids: &[Uuid],
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE matches
            SET home_score = $2, away_score = $3, game_number = COALESCE($4, game_number),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(home_score)
        .bind(away_score)
        .bind(game_number)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM match_scorers WHERE match_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for (idx, player_id) in scorer_ids.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO match_scorers (match_id, player_id, scorer_order)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(id)
            .bind(player_id)
            .bind((idx + 1) as i32)
            .execute(&mut *tx)
            .await?;
        }

        Ok(())
    }

    /// Actual scorers of a match in scoring order
    pub async fn list_match_scorers(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        match_id: Uuid,
    ) -> Result<Vec<MatchScorer>, RepositoryError> {
        let scorers = sqlx::query_as::<_, MatchScorer>(
            r#"
            SELECT match_id, player_id, scorer_order
            FROM match_scorers
            WHERE match_id = $1
            ORDER BY scorer_order
            "#,
        )
        .bind(match_id)
        .fetch_all(&mut *tx)
        .await?;

        Ok(scorers)
    }

    /// Flip the evaluated flag. The caller must have verified, inside the
    /// same transaction, that the flag was still unset.
    pub async fn mark_match_evaluated(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE matches
            SET is_evaluated = TRUE, updated_at = NOW()
            WHERE id = $1 AND is_evaluated = FALSE
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        Ok(())
    }

    // ------------------------------------------------------------------
    // Series
    // ------------------------------------------------------------------

    /// Find a series by id
    pub async fn find_serie(&self, id: Uuid) -> Result<Option<Serie>, RepositoryError> {
        let s = sqlx::query_as::<_, Serie>(&format!(
            "SELECT {} FROM series WHERE id = $1 AND deleted_at IS NULL",
            SERIE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(s)
    }

    /// Re-fetch a series inside a transaction, taking a row lock
    pub async fn find_serie_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<Serie>, RepositoryError> {
        let s = sqlx::query_as::<_, Serie>(&format!(
            "SELECT {} FROM series WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
            SERIE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        Ok(s)
    }

    /// Write a series' final win counts
    pub async fn set_serie_result(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        home_wins: i32,
        away_wins: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE series
            SET home_wins = $2, away_wins = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(home_wins)
        .bind(away_wins)
        .execute(&mut *tx)
        .await?;

        Ok(())
    }

    /// Flip the evaluated flag on a series
    pub async fn mark_serie_evaluated(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE series
            SET is_evaluated = TRUE, updated_at = NOW()
            WHERE id = $1 AND is_evaluated = FALSE
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        Ok(())
    }

    // ------------------------------------------------------------------
    // Special bets
    // ------------------------------------------------------------------

    /// Find a special bet by id
    pub async fn find_special_bet(
        &self,
        id: Uuid,
    ) -> Result<Option<SpecialBetSingle>, RepositoryError> {
        let bet = sqlx::query_as::<_, SpecialBetSingle>(
            r#"
            SELECT id, league_id, name, date_time, created_at, updated_at, deleted_at
            FROM special_bet_singles
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(bet)
    }

    /// Re-fetch a special bet inside a transaction, taking a row lock
    pub async fn find_special_bet_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<SpecialBetSingle>, RepositoryError> {
        let bet = sqlx::query_as::<_, SpecialBetSingle>(
            r#"
            SELECT id, league_id, name, date_time, created_at, updated_at, deleted_at
            FROM special_bet_singles
            WHERE id = $1 AND deleted_at IS NULL
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        Ok(bet)
    }

    /// Replace a special bet's ranked result list
    pub async fn replace_special_results(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        special_bet_id: Uuid,
        results: &[(i32, Option<Uuid>, Option<Uuid>)],
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM special_bet_results WHERE special_bet_id = $1")
            .bind(special_bet_id)
            .execute(&mut *tx)
            .await?;

        for (rank, team_id, player_id) in results {
            sqlx::query(
                r#"
                INSERT INTO special_bet_results (id, special_bet_id, rank, team_id, player_id)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(special_bet_id)
            .bind(rank)
            .bind(team_id)
            .bind(player_id)
            .execute(&mut *tx)
            .await?;
        }

        Ok(())
    }

    /// A special bet's actual ranked results, best rank first
    pub async fn list_special_results(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        special_bet_id: Uuid,
    ) -> Result<Vec<SpecialBetResult>, RepositoryError> {
        let results = sqlx::query_as::<_, SpecialBetResult>(
            r#"
            SELECT id, special_bet_id, rank, team_id, player_id
            FROM special_bet_results
            WHERE special_bet_id = $1
            ORDER BY rank
            "#,
        )
        .bind(special_bet_id)
        .fetch_all(&mut *tx)
        .await?;

        Ok(results)
    }

    // ------------------------------------------------------------------
    // Questions
    // ------------------------------------------------------------------

    /// Find a question by id
    pub async fn find_question(&self, id: Uuid) -> Result<Option<Question>, RepositoryError> {
        let q = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, league_id, text, date_time, points, answer,
                   created_at, updated_at, deleted_at
            FROM questions
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(q)
    }

    /// Re-fetch a question inside a transaction, taking a row lock
    pub async fn find_question_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<Question>, RepositoryError> {
        let q = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, league_id, text, date_time, points, answer,
                   created_at, updated_at, deleted_at
            FROM questions
            WHERE id = $1 AND deleted_at IS NULL
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        Ok(q)
    }

    /// Write a question's actual answer
    pub async fn set_question_answer(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        answer: bool,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE questions
            SET answer = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(answer)
        .execute(&mut *tx)
        .await?;

        Ok(())
    }

    // ------------------------------------------------------------------
    // Phases
    // ------------------------------------------------------------------

    /// Find a match phase by id
    pub async fn find_phase(&self, id: Uuid) -> Result<Option<MatchPhase>, RepositoryError> {
        let phase = sqlx::query_as::<_, MatchPhase>(
            r#"
            SELECT id, league_id, name, best_of, created_at, deleted_at
            FROM match_phases
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(phase)
    }

    /// Phase lookup through a result-entry transaction
    pub async fn find_phase_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<MatchPhase>, RepositoryError> {
        let phase = sqlx::query_as::<_, MatchPhase>(
            r#"
            SELECT id, league_id, name, best_of, created_at, deleted_at
            FROM match_phases
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        Ok(phase)
    }
}
