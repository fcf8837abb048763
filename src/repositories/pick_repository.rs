use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::{
    CategoryTotals, UserBet, UserSpecialBetQuestion, UserSpecialBetSerie, UserSpecialBetSingle,
};

const BET_COLUMNS: &str = "id, league_user_id, match_id, home_score, away_score, scorer_id, \
     no_scorer, total_points, created_at, updated_at, deleted_at";

const SERIE_PICK_COLUMNS: &str = "id, league_user_id, serie_id, home_wins, away_wins, \
     total_points, created_at, updated_at, deleted_at";

const SINGLE_PICK_COLUMNS: &str = "id, league_user_id, special_bet_id, team_id, player_id, \
     total_points, created_at, updated_at, deleted_at";

const QUESTION_PICK_COLUMNS: &str = "id, league_user_id, question_id, answer, \
     total_points, created_at, updated_at, deleted_at";

/// Repository for all four pick categories.
///
/// Create-or-update always happens through a caller-held transaction; the
/// partial unique indexes on (league_user_id, event) act as the second line
/// of defense against duplicate inserts under concurrency.
pub struct PickRepository {
    pool: PgPool,
}

impl PickRepository {
    /// Create a new PickRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ------------------------------------------------------------------
    // Match picks
    // ------------------------------------------------------------------

    /// Find a participant's non-deleted match pick inside the transaction
    pub async fn find_bet_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        league_user_id: Uuid,
        match_id: Uuid,
    ) -> Result<Option<UserBet>, RepositoryError> {
        let bet = sqlx::query_as::<_, UserBet>(&format!(
            "SELECT {} FROM user_bets \
             WHERE league_user_id = $1 AND match_id = $2 AND deleted_at IS NULL \
             FOR UPDATE",
            BET_COLUMNS
        ))
        .bind(league_user_id)
        .bind(match_id)
        .fetch_optional(&mut *tx)
        .await?;

        Ok(bet)
    }

    /// Insert a new match pick with zero points
    pub async fn insert_bet(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        league_user_id: Uuid,
        match_id: Uuid,
        home_score: i32,
        away_score: i32,
        scorer_id: Option<Uuid>,
        no_scorer: bool,
    ) -> Result<UserBet, RepositoryError> {
        let bet = sqlx::query_as::<_, UserBet>(&format!(
            "INSERT INTO user_bets \
                 (id, league_user_id, match_id, home_score, away_score, scorer_id, no_scorer) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {}",
            BET_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(league_user_id)
        .bind(match_id)
        .bind(home_score)
        .bind(away_score)
        .bind(scorer_id)
        .bind(no_scorer)
        .fetch_one(&mut *tx)
        .await?;

        Ok(bet)
    }

    /// Update an existing match pick in place, preserving identity and
    /// creation timestamp
    pub async fn update_bet(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        home_score: i32,
        away_score: i32,
        scorer_id: Option<Uuid>,
        no_scorer: bool,
    ) -> Result<UserBet, RepositoryError> {
        let bet = sqlx::query_as::<_, UserBet>(&format!(
            "UPDATE user_bets \
             SET home_score = $2, away_score = $3, scorer_id = $4, no_scorer = $5, \
                 updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {}",
            BET_COLUMNS
        ))
        .bind(id)
        .bind(home_score)
        .bind(away_score)
        .bind(scorer_id)
        .bind(no_scorer)
        .fetch_one(&mut *tx)
        .await?;

        Ok(bet)
    }

    /// All non-deleted picks for a match, read inside the evaluation
    /// transaction
    pub async fn list_bets_for_match(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        match_id: Uuid,
    ) -> Result<Vec<UserBet>, RepositoryError> {
        let bets = sqlx::query_as::<_, UserBet>(&format!(
            "SELECT {} FROM user_bets \
             WHERE match_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at",
            BET_COLUMNS
        ))
        .bind(match_id)
        .fetch_all(&mut *tx)
        .await?;

        Ok(bets)
    }

    /// Overwrite a match pick's computed point total
    pub async fn set_bet_points(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        total_points: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE user_bets SET total_points = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(total_points)
        .execute(&mut *tx)
        .await?;

        Ok(())
    }

    /// A participant's match picks. Unless `include_open` is set, picks for
    /// events still open for betting are filtered out (other participants'
    /// picks are revealed only once locked).
    pub async fn list_bets_for_participant(
        &self,
        league_user_id: Uuid,
        include_open: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<UserBet>, RepositoryError> {
        let bets = sqlx::query_as::<_, UserBet>(&format!(
            "SELECT b.{} FROM user_bets b \
             JOIN matches m ON m.id = b.match_id \
             WHERE b.league_user_id = $1 AND b.deleted_at IS NULL \
               AND ($2 OR m.date_time <= $3) \
             ORDER BY m.date_time",
            BET_COLUMNS.replace(", ", ", b.")
        ))
        .bind(league_user_id)
        .bind(include_open)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(bets)
    }

    // ------------------------------------------------------------------
    // Series picks
    // ------------------------------------------------------------------

    /// Find a participant's non-deleted series pick inside the transaction
    pub async fn find_serie_pick_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        league_user_id: Uuid,
        serie_id: Uuid,
    ) -> Result<Option<UserSpecialBetSerie>, RepositoryError> {
        let pick = sqlx::query_as::<_, UserSpecialBetSerie>(&format!(
            "SELECT {} FROM user_special_bet_series \
             WHERE league_user_id = $1 AND serie_id = $2 AND deleted_at IS NULL \
             FOR UPDATE",
            SERIE_PICK_COLUMNS
        ))
        .bind(league_user_id)
        .bind(serie_id)
        .fetch_optional(&mut *tx)
        .await?;

        Ok(pick)
    }

    /// Insert a new series pick with zero points
    pub async fn insert_serie_pick(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        league_user_id: Uuid,
        serie_id: Uuid,
        home_wins: i32,
        away_wins: i32,
    ) -> Result<UserSpecialBetSerie, RepositoryError> {
        let pick = sqlx::query_as::<_, UserSpecialBetSerie>(&format!(
            "INSERT INTO user_special_bet_series \
                 (id, league_user_id, serie_id, home_wins, away_wins) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {}",
            SERIE_PICK_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(league_user_id)
        .bind(serie_id)
        .bind(home_wins)
        .bind(away_wins)
        .fetch_one(&mut *tx)
        .await?;

        Ok(pick)
    }

    /// Update an existing series pick in place
    pub async fn update_serie_pick(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        home_wins: i32,
        away_wins: i32,
    ) -> Result<UserSpecialBetSerie, RepositoryError> {
        let pick = sqlx::query_as::<_, UserSpecialBetSerie>(&format!(
            "UPDATE user_special_bet_series \
             SET home_wins = $2, away_wins = $3, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {}",
            SERIE_PICK_COLUMNS
        ))
        .bind(id)
        .bind(home_wins)
        .bind(away_wins)
        .fetch_one(&mut *tx)
        .await?;

        Ok(pick)
    }

    /// All non-deleted picks for a series
    pub async fn list_picks_for_serie(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        serie_id: Uuid,
    ) -> Result<Vec<UserSpecialBetSerie>, RepositoryError> {
        let picks = sqlx::query_as::<_, UserSpecialBetSerie>(&format!(
            "SELECT {} FROM user_special_bet_series \
             WHERE serie_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at",
            SERIE_PICK_COLUMNS
        ))
        .bind(serie_id)
        .fetch_all(&mut *tx)
        .await?;

        Ok(picks)
    }

    /// Overwrite a series pick's computed point total
    pub async fn set_serie_pick_points(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        total_points: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE user_special_bet_series SET total_points = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(total_points)
        .execute(&mut *tx)
        .await?;

        Ok(())
    }

    /// A participant's series picks, visibility-filtered like match picks
    pub async fn list_serie_picks_for_participant(
        &self,
        league_user_id: Uuid,
        include_open: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<UserSpecialBetSerie>, RepositoryError> {
        let picks = sqlx::query_as::<_, UserSpecialBetSerie>(&format!(
            "SELECT p.{} FROM user_special_bet_series p \
             JOIN series s ON s.id = p.serie_id \
             WHERE p.league_user_id = $1 AND p.deleted_at IS NULL \
               AND ($2 OR s.date_time <= $3) \
             ORDER BY s.date_time",
            SERIE_PICK_COLUMNS.replace(", ", ", p.")
        ))
        .bind(league_user_id)
        .bind(include_open)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(picks)
    }

    // ------------------------------------------------------------------
    // Special bet picks
    // ------------------------------------------------------------------

    /// Find a participant's non-deleted special bet pick inside the
    /// transaction
    pub async fn find_single_pick_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        league_user_id: Uuid,
        special_bet_id: Uuid,
    ) -> Result<Option<UserSpecialBetSingle>, RepositoryError> {
        let pick = sqlx::query_as::<_, UserSpecialBetSingle>(&format!(
            "SELECT {} FROM user_special_bet_singles \
             WHERE league_user_id = $1 AND special_bet_id = $2 AND deleted_at IS NULL \
             FOR UPDATE",
            SINGLE_PICK_COLUMNS
        ))
        .bind(league_user_id)
        .bind(special_bet_id)
        .fetch_optional(&mut *tx)
        .await?;

        Ok(pick)
    }

    /// Insert a new special bet pick with zero points
    pub async fn insert_single_pick(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        league_user_id: Uuid,
        special_bet_id: Uuid,
        team_id: Option<Uuid>,
        player_id: Option<Uuid>,
    ) -> Result<UserSpecialBetSingle, RepositoryError> {
        let pick = sqlx::query_as::<_, UserSpecialBetSingle>(&format!(
            "INSERT INTO user_special_bet_singles \
                 (id, league_user_id, special_bet_id, team_id, player_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {}",
            SINGLE_PICK_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(league_user_id)
        .bind(special_bet_id)
        .bind(team_id)
        .bind(player_id)
        .fetch_one(&mut *tx)
        .await?;

        Ok(pick)
    }

    /// Update an existing special bet pick in place
    pub async fn update_single_pick(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        team_id: Option<Uuid>,
        player_id: Option<Uuid>,
    ) -> Result<UserSpecialBetSingle, RepositoryError> {
        let pick = sqlx::query_as::<_, UserSpecialBetSingle>(&format!(
            "UPDATE user_special_bet_singles \
             SET team_id = $2, player_id = $3, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {}",
            SINGLE_PICK_COLUMNS
        ))
        .bind(id)
        .bind(team_id)
        .bind(player_id)
        .fetch_one(&mut *tx)
        .await?;

        Ok(pick)
    }

    /// All non-deleted picks for a special bet
    pub async fn list_picks_for_special_bet(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        special_bet_id: Uuid,
    ) -> Result<Vec<UserSpecialBetSingle>, RepositoryError> {
        let picks = sqlx::query_as::<_, UserSpecialBetSingle>(&format!(
            "SELECT {} FROM user_special_bet_singles \
             WHERE special_bet_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at",
            SINGLE_PICK_COLUMNS
        ))
        .bind(special_bet_id)
        .fetch_all(&mut *tx)
        .await?;

        Ok(picks)
    }

    /// Overwrite a special bet pick's computed point total
    pub async fn set_single_pick_points(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        total_points: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE user_special_bet_singles SET total_points = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(total_points)
        .execute(&mut *tx)
        .await?;

        Ok(())
    }

    /// A participant's special bet picks, visibility-filtered
    pub async fn list_single_picks_for_participant(
        &self,
        league_user_id: Uuid,
        include_open: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<UserSpecialBetSingle>, RepositoryError> {
        let picks = sqlx::query_as::<_, UserSpecialBetSingle>(&format!(
            "SELECT p.{} FROM user_special_bet_singles p \
             JOIN special_bet_singles sb ON sb.id = p.special_bet_id \
             WHERE p.league_user_id = $1 AND p.deleted_at IS NULL \
               AND ($2 OR sb.date_time <= $3) \
             ORDER BY sb.date_time",
            SINGLE_PICK_COLUMNS.replace(", ", ", p.")
        ))
        .bind(league_user_id)
        .bind(include_open)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(picks)
    }

    // ------------------------------------------------------------------
    // Question picks
    // ------------------------------------------------------------------

    /// Find a participant's non-deleted question pick inside the transaction
    pub async fn find_question_pick_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        league_user_id: Uuid,
        question_id: Uuid,
    ) -> Result<Option<UserSpecialBetQuestion>, RepositoryError> {
        let pick = sqlx::query_as::<_, UserSpecialBetQuestion>(&format!(
            "SELECT {} FROM user_special_bet_questions \
             WHERE league_user_id = $1 AND question_id = $2 AND deleted_at IS NULL \
             FOR UPDATE",
            QUESTION_PICK_COLUMNS
        ))
        .bind(league_user_id)
        .bind(question_id)
        .fetch_optional(&mut *tx)
        .await?;

        Ok(pick)
    }

    /// Insert a new question pick with zero points
    pub async fn insert_question_pick(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        league_user_id: Uuid,
        question_id: Uuid,
        answer: bool,
    ) -> Result<UserSpecialBetQuestion, RepositoryError> {
        let pick = sqlx::query_as::<_, UserSpecialBetQuestion>(&format!(
            "INSERT INTO user_special_bet_questions \
                 (id, league_user_id, question_id, answer) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {}",
            QUESTION_PICK_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(league_user_id)
        .bind(question_id)
        .bind(answer)
        .fetch_one(&mut *tx)
        .await?;

        Ok(pick)
    }

    /// Update an existing question pick in place
    pub async fn update_question_pick(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        answer: bool,
    ) -> Result<UserSpecialBetQuestion, RepositoryError> {
        let pick = sqlx::query_as::<_, UserSpecialBetQuestion>(&format!(
            "UPDATE user_special_bet_questions \
             SET answer = $2, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {}",
            QUESTION_PICK_COLUMNS
        ))
        .bind(id)
        .bind(answer)
        .fetch_one(&mut *tx)
        .await?;

        Ok(pick)
    }

    /// All non-deleted picks for a question
    pub async fn list_picks_for_question(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        question_id: Uuid,
    ) -> Result<Vec<UserSpecialBetQuestion>, RepositoryError> {
        let picks = sqlx::query_as::<_, UserSpecialBetQuestion>(&format!(
            "SELECT {} FROM user_special_bet_questions \
             WHERE question_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at",
            QUESTION_PICK_COLUMNS
        ))
        .bind(question_id)
        .fetch_all(&mut *tx)
        .await?;

        Ok(picks)
    }

    /// Overwrite a question pick's computed point total
    pub async fn set_question_pick_points(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        total_points: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE user_special_bet_questions SET total_points = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(total_points)
        .execute(&mut *tx)
        .await?;

        Ok(())
    }

    /// A participant's question picks, visibility-filtered
    pub async fn list_question_picks_for_participant(
        &self,
        league_user_id: Uuid,
        include_open: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<UserSpecialBetQuestion>, RepositoryError> {
        let picks = sqlx::query_as::<_, UserSpecialBetQuestion>(&format!(
            "SELECT p.{} FROM user_special_bet_questions p \
             JOIN questions q ON q.id = p.question_id \
             WHERE p.league_user_id = $1 AND p.deleted_at IS NULL \
               AND ($2 OR q.date_time <= $3) \
             ORDER BY q.date_time",
            QUESTION_PICK_COLUMNS.replace(", ", ", p.")
        ))
        .bind(league_user_id)
        .bind(include_open)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(picks)
    }

    // ------------------------------------------------------------------
    // Aggregation
    // ------------------------------------------------------------------

    /// Per-participant point sums across all four categories for a league's
    /// active participants. Missing categories contribute 0.
    pub async fn sum_points_by_participant(
        &self,
        league_id: Uuid,
    ) -> Result<Vec<CategoryTotals>, RepositoryError> {
        let totals = sqlx::query_as::<_, CategoryTotals>(
            r#"
            SELECT
                lu.id AS league_user_id,
                u.username AS display_name,
                COALESCE((SELECT SUM(b.total_points) FROM user_bets b
                          WHERE b.league_user_id = lu.id AND b.deleted_at IS NULL), 0)::BIGINT
                    AS match_points,
                COALESCE((SELECT SUM(sp.total_points) FROM user_special_bet_series sp
                          WHERE sp.league_user_id = lu.id AND sp.deleted_at IS NULL), 0)::BIGINT
                    AS serie_points,
                COALESCE((SELECT SUM(sg.total_points) FROM user_special_bet_singles sg
                          WHERE sg.league_user_id = lu.id AND sg.deleted_at IS NULL), 0)::BIGINT
                    AS special_points,
                COALESCE((SELECT SUM(qp.total_points) FROM user_special_bet_questions qp
                          WHERE qp.league_user_id = lu.id AND qp.deleted_at IS NULL), 0)::BIGINT
                    AS question_points
            FROM league_users lu
            JOIN users u ON u.id = lu.user_id
            WHERE lu.league_id = $1 AND lu.is_active = TRUE AND lu.deleted_at IS NULL
            ORDER BY lu.created_at
            "#,
        )
        .bind(league_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(totals)
    }
}
