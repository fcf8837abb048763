use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Match pick: predicted regular-time score plus an optional scorer call.
///
/// At most one non-deleted row exists per (league_user, match); the partial
/// unique index in the schema backs up the transactional upsert.
/// `total_points` starts at 0 and is written only by the scoring engine.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserBet {
    pub id: Uuid,
    pub league_user_id: Uuid,
    pub match_id: Uuid,
    pub home_score: i32,
    pub away_score: i32,
    pub scorer_id: Option<Uuid>,
    pub no_scorer: bool,
    pub total_points: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Series pick: predicted final win counts
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSpecialBetSerie {
    pub id: Uuid,
    pub league_user_id: Uuid,
    pub serie_id: Uuid,
    pub home_wins: i32,
    pub away_wins: i32,
    pub total_points: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Special bet pick: a team or a player, depending on what the bet asks for
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSpecialBetSingle {
    pub id: Uuid,
    pub league_user_id: Uuid,
    pub special_bet_id: Uuid,
    pub team_id: Option<Uuid>,
    pub player_id: Option<Uuid>,
    pub total_points: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Question pick: a yes/no answer
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSpecialBetQuestion {
    pub id: Uuid,
    pub league_user_id: Uuid,
    pub question_id: Uuid,
    pub answer: bool,
    pub total_points: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}
