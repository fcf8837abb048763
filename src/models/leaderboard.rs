use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Per-participant point sums across the four pick categories, as read from
/// storage. Sums over BIGINT aggregates, so the fields are i64; a missing
/// category contributes 0.
#[derive(Debug, Clone, FromRow)]
pub struct CategoryTotals {
    pub league_user_id: Uuid,
    pub display_name: String,
    pub match_points: i64,
    pub serie_points: i64,
    pub special_points: i64,
    pub question_points: i64,
}

impl CategoryTotals {
    pub fn total(&self) -> i64 {
        self.match_points + self.serie_points + self.special_points + self.question_points
    }
}

/// Prize or fine annotation attached to a leaderboard entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierAward {
    pub rank: i32,
    pub amount: i64,
    pub currency: String,
    pub label: Option<String>,
}

/// One row of the computed leaderboard. Derived on read, never persisted.
///
/// Ranks are sequential even on tied totals; `position_from_bottom` is
/// `total_participants - rank + 1` and drives fine-tier lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub league_user_id: Uuid,
    pub display_name: String,
    pub match_points: i64,
    pub serie_points: i64,
    pub special_points: i64,
    pub question_points: i64,
    pub total_points: i64,
    pub rank: u32,
    pub prize: Option<TierAward>,
    pub fine: Option<TierAward>,
    pub is_current_user: bool,
}

impl LeaderboardEntry {
    /// Position counted from the bottom of an `n`-entry board
    pub fn position_from_bottom(&self, n: u32) -> u32 {
        n - self.rank + 1
    }
}
