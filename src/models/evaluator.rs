use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Scoring criterion names, stored as TEXT in the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluatorType {
    ExactScore,
    Winner,
    GoalDifference,
    TotalGoals,
    Scorer,
    Ranked,
}

impl EvaluatorType {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "exact_score" => Ok(EvaluatorType::ExactScore),
            "winner" => Ok(EvaluatorType::Winner),
            "goal_difference" => Ok(EvaluatorType::GoalDifference),
            "total_goals" => Ok(EvaluatorType::TotalGoals),
            "scorer" => Ok(EvaluatorType::Scorer),
            "ranked" => Ok(EvaluatorType::Ranked),
            _ => Err(format!("Invalid evaluator type: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluatorType::ExactScore => "exact_score",
            EvaluatorType::Winner => "winner",
            EvaluatorType::GoalDifference => "goal_difference",
            EvaluatorType::TotalGoals => "total_goals",
            EvaluatorType::Scorer => "scorer",
            EvaluatorType::Ranked => "ranked",
        }
    }
}

impl From<EvaluatorType> for String {
    fn from(t: EvaluatorType) -> Self {
        t.as_str().to_string()
    }
}

/// Rank-indexed point table with a fallback for correct-but-unranked hits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedConfig {
    /// 1-indexed rank -> points
    pub ranked_points: HashMap<u32, i32>,
    /// Awarded when the prediction is correct but no tracked rank applies
    pub unranked_points: i32,
}

/// Configuration shape of one criterion.
///
/// All criteria carry a flat value except the scorer/ranked ones, which may
/// carry the rank-indexed table. The two shapes are an explicit sum type
/// rather than an "if scorer, parse differently" convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleConfig {
    Flat(i32),
    Ranked(RankedConfig),
}

/// Database row for a league's evaluator rule
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EvaluatorRule {
    pub id: Uuid,
    pub league_id: Uuid,
    pub evaluator_type: String,
    pub points: Option<i32>,
    /// JSONB ranked configuration, present for scorer/ranked criteria
    pub ranked_config: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl EvaluatorRule {
    /// Get the criterion as an enum
    pub fn evaluator_type_enum(&self) -> AppResult<EvaluatorType> {
        EvaluatorType::from_str(&self.evaluator_type).map_err(AppError::Validation)
    }

    /// Resolve the stored shape into the typed configuration union
    pub fn config(&self) -> AppResult<RuleConfig> {
        if let Some(raw) = &self.ranked_config {
            let ranked: RankedConfig = serde_json::from_value(raw.clone())?;
            return Ok(RuleConfig::Ranked(ranked));
        }
        Ok(RuleConfig::Flat(self.points.unwrap_or(0)))
    }
}

/// Resolved per-league rule set: criterion -> configuration.
///
/// An unconfigured criterion resolves to 0 points, never to an error.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: HashMap<EvaluatorType, RuleConfig>,
}

impl RuleSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from database rows, parsing each rule's configuration
    pub fn from_rules(rules: &[EvaluatorRule]) -> AppResult<Self> {
        let mut map = HashMap::new();
        for rule in rules {
            let t = rule.evaluator_type_enum()?;
            map.insert(t, rule.config()?);
        }
        Ok(Self { rules: map })
    }

    /// Builder used by tests and fixtures
    pub fn with(mut self, t: EvaluatorType, config: RuleConfig) -> Self {
        self.rules.insert(t, config);
        self
    }

    /// Flat point value of a criterion. A ranked configuration read this way
    /// falls back to its unranked value.
    pub fn flat_points(&self, t: EvaluatorType) -> i32 {
        match self.rules.get(&t) {
            Some(RuleConfig::Flat(v)) => *v,
            Some(RuleConfig::Ranked(c)) => c.unranked_points,
            None => 0,
        }
    }

    /// Point value of a correct prediction at the given 1-indexed rank.
    /// `None` means the prediction was correct but carries no rank (e.g. a
    /// correct "no scorer" call, or an entity absent from the tracked ranks).
    pub fn ranked_points(&self, t: EvaluatorType, rank: Option<u32>) -> i32 {
        match self.rules.get(&t) {
            Some(RuleConfig::Flat(v)) => *v,
            Some(RuleConfig::Ranked(c)) => match rank {
                Some(r) => c.ranked_points.get(&r).copied().unwrap_or(c.unranked_points),
                None => c.unranked_points,
            },
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule(evaluator_type: &str, points: Option<i32>, ranked: Option<serde_json::Value>) -> EvaluatorRule {
        EvaluatorRule {
            id: Uuid::new_v4(),
            league_id: Uuid::new_v4(),
            evaluator_type: evaluator_type.to_string(),
            points,
            ranked_config: ranked,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_evaluator_type_conversion() {
        assert_eq!(EvaluatorType::ExactScore.as_str(), "exact_score");
        assert_eq!(
            EvaluatorType::from_str("goal_difference").unwrap(),
            EvaluatorType::GoalDifference
        );
        assert!(EvaluatorType::from_str("corners").is_err());
    }

    #[test]
    fn test_flat_rule_parses() {
        let r = rule("winner", Some(5), None);
        assert_eq!(r.config().unwrap(), RuleConfig::Flat(5));
    }

    #[test]
    fn test_ranked_rule_parses() {
        let r = rule(
            "scorer",
            None,
            Some(json!({"ranked_points": {"1": 10, "2": 6}, "unranked_points": 3})),
        );
        match r.config().unwrap() {
            RuleConfig::Ranked(c) => {
                assert_eq!(c.ranked_points.get(&1), Some(&10));
                assert_eq!(c.ranked_points.get(&2), Some(&6));
                assert_eq!(c.unranked_points, 3);
            }
            other => panic!("expected ranked config, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_rule_resolves_to_zero() {
        let set = RuleSet::empty();
        assert_eq!(set.flat_points(EvaluatorType::ExactScore), 0);
        assert_eq!(set.ranked_points(EvaluatorType::Scorer, Some(1)), 0);
    }

    #[test]
    fn test_ranked_lookup_with_fallback() {
        let set = RuleSet::empty().with(
            EvaluatorType::Scorer,
            RuleConfig::Ranked(RankedConfig {
                ranked_points: HashMap::from([(1, 10)]),
                unranked_points: 4,
            }),
        );
        // Tracked rank
        assert_eq!(set.ranked_points(EvaluatorType::Scorer, Some(1)), 10);
        // Correct but untracked rank falls back to the unranked value
        assert_eq!(set.ranked_points(EvaluatorType::Scorer, Some(3)), 4);
        assert_eq!(set.ranked_points(EvaluatorType::Scorer, None), 4);
    }

    #[test]
    fn test_flat_scorer_rule_ignores_rank() {
        let set = RuleSet::empty().with(EvaluatorType::Scorer, RuleConfig::Flat(7));
        assert_eq!(set.ranked_points(EvaluatorType::Scorer, Some(1)), 7);
        assert_eq!(set.ranked_points(EvaluatorType::Scorer, Some(9)), 7);
    }
}
