use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Regular-time outcome of a match, derived by comparing the two scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Draw,
    Home,
    Away,
}

impl Winner {
    /// Derive the winner indicator from a pair of scores
    pub fn from_scores(home: i32, away: i32) -> Self {
        match home.cmp(&away) {
            std::cmp::Ordering::Greater => Winner::Home,
            std::cmp::Ordering::Less => Winner::Away,
            std::cmp::Ordering::Equal => Winner::Draw,
        }
    }

    /// Numeric code: home=1, away=2, draw=0
    pub fn code(&self) -> i32 {
        match self {
            Winner::Draw => 0,
            Winner::Home => 1,
            Winner::Away => 2,
        }
    }
}

/// Tournament phase with an optional best-of count for its series games
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchPhase {
    pub id: Uuid,
    pub league_id: Uuid,
    pub name: String,
    pub best_of: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A single match. Actual scores stay null until an admin enters the result;
/// `is_evaluated` transitions false -> true exactly once and is never reset.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Match {
    pub id: Uuid,
    pub league_id: Option<Uuid>,
    pub phase_id: Option<Uuid>,
    pub home_team_id: Uuid,
    pub away_team_id: Uuid,
    /// Betting deadline; picks lock at this instant
    pub date_time: DateTime<Utc>,
    /// Game number within a best-of series, when phase-linked
    pub game_number: Option<i32>,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub is_doubled: bool,
    pub is_evaluated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Match {
    pub fn has_result(&self) -> bool {
        self.home_score.is_some() && self.away_score.is_some()
    }

    /// Check that the given team is one of the two competing
    pub fn involves_team(&self, team_id: Uuid) -> bool {
        self.home_team_id == team_id || self.away_team_id == team_id
    }
}

/// An actual goal scorer of a match, with 1-indexed scoring order
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchScorer {
    pub match_id: Uuid,
    pub player_id: Uuid,
    pub scorer_order: i32,
}

/// A playoff series between two teams, bet on as a final win count
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Serie {
    pub id: Uuid,
    pub league_id: Option<Uuid>,
    pub phase_id: Option<Uuid>,
    pub home_team_id: Uuid,
    pub away_team_id: Uuid,
    pub date_time: DateTime<Utc>,
    pub home_wins: Option<i32>,
    pub away_wins: Option<i32>,
    pub is_doubled: bool,
    pub is_evaluated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Serie {
    pub fn has_result(&self) -> bool {
        self.home_wins.is_some() && self.away_wins.is_some()
    }

    pub fn involves_team(&self, team_id: Uuid) -> bool {
        self.home_team_id == team_id || self.away_team_id == team_id
    }
}

/// One-off special bet (e.g. tournament winner, top scorer). The actual
/// outcome is the ranked result list in `special_bet_results`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SpecialBetSingle {
    pub id: Uuid,
    pub league_id: Uuid,
    pub name: String,
    pub date_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// One row of a special bet's actual outcome: who finished at which rank
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SpecialBetResult {
    pub id: Uuid,
    pub special_bet_id: Uuid,
    pub rank: i32,
    pub team_id: Option<Uuid>,
    pub player_id: Option<Uuid>,
}

impl SpecialBetResult {
    /// Whether this result row names the predicted entity
    pub fn matches(&self, team_id: Option<Uuid>, player_id: Option<Uuid>) -> bool {
        (team_id.is_some() && self.team_id == team_id)
            || (player_id.is_some() && self.player_id == player_id)
    }
}

/// Yes/no question worth a fixed number of points
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: Uuid,
    pub league_id: Uuid,
    pub text: String,
    pub date_time: DateTime<Utc>,
    pub points: i32,
    pub answer: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_winner_from_scores() {
        assert_eq!(Winner::from_scores(2, 1), Winner::Home);
        assert_eq!(Winner::from_scores(0, 3), Winner::Away);
        assert_eq!(Winner::from_scores(1, 1), Winner::Draw);
    }

    #[test]
    fn test_winner_codes() {
        assert_eq!(Winner::Draw.code(), 0);
        assert_eq!(Winner::Home.code(), 1);
        assert_eq!(Winner::Away.code(), 2);
    }
}
