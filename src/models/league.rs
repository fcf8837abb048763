use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A league: the configuration boundary for events, evaluator rules and
/// prize tiers
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct League {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Account identity; session resolution happens outside this crate
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// League membership of a user. The leaderboard counts members with
/// `is_active` set; `is_admin` gates result entry and evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LeagueUser {
    pub id: Uuid,
    pub league_id: Uuid,
    pub user_id: Uuid,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl LeagueUser {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
