use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::cache::{leaderboard_tag, CacheInvalidator};
use crate::config::TransactionConfig;
use crate::database::begin_serializable;
use crate::error::{AppError, AppResult};
use crate::models::{EvaluatorType, RuleSet, SpecialBetResult, Winner};
use crate::repositories::{EvaluatorRepository, EventRepository, PickRepository};
use crate::services::with_retry;

/// Actual match result with derived values computed once per event
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub home_score: i32,
    pub away_score: i32,
    winner: Winner,
    goal_difference: i32,
    total_goals: i32,
    /// Actual scorers in scoring order
    scorers: Vec<Uuid>,
    doubled: bool,
}

impl MatchOutcome {
    pub fn derive(home_score: i32, away_score: i32, scorers: Vec<Uuid>, doubled: bool) -> Self {
        Self {
            home_score,
            away_score,
            winner: Winner::from_scores(home_score, away_score),
            goal_difference: home_score - away_score,
            total_goals: home_score + away_score,
            scorers,
            doubled,
        }
    }

    /// 1-indexed position of a player in the actual scorer list
    fn scorer_rank(&self, player_id: Uuid) -> Option<u32> {
        self.scorers
            .iter()
            .position(|id| *id == player_id)
            .map(|idx| idx as u32 + 1)
    }
}

/// A match prediction, detached from its storage row
#[derive(Debug, Clone, Copy)]
pub struct MatchPrediction {
    pub home_score: i32,
    pub away_score: i32,
    pub scorer_id: Option<Uuid>,
    pub no_scorer: bool,
}

/// Point total of one match pick against an actual outcome.
///
/// Every criterion accumulates independently; goal difference is checked
/// unconditionally, so it stacks with an exact-score hit (and matches on
/// predicted draws). Deterministic: same outcome + same pick = same total.
pub fn score_match_prediction(
    outcome: &MatchOutcome,
    prediction: &MatchPrediction,
    rules: &RuleSet,
) -> i32 {
    let mut points = 0;

    if prediction.home_score == outcome.home_score && prediction.away_score == outcome.away_score {
        points += rules.flat_points(EvaluatorType::ExactScore);
    }

    let predicted_winner = Winner::from_scores(prediction.home_score, prediction.away_score);
    if predicted_winner == outcome.winner {
        points += rules.flat_points(EvaluatorType::Winner);
    }

    if prediction.home_score - prediction.away_score == outcome.goal_difference {
        points += rules.flat_points(EvaluatorType::GoalDifference);
    }

    if prediction.home_score + prediction.away_score == outcome.total_goals {
        points += rules.flat_points(EvaluatorType::TotalGoals);
    }

    if let Some(scorer_id) = prediction.scorer_id {
        if let Some(rank) = outcome.scorer_rank(scorer_id) {
            points += rules.ranked_points(EvaluatorType::Scorer, Some(rank));
        }
    } else if prediction.no_scorer && outcome.scorers.is_empty() {
        points += rules.ranked_points(EvaluatorType::Scorer, None);
    }

    if outcome.doubled {
        points *= 2;
    }

    points
}

/// Actual final state of a playoff series
#[derive(Debug, Clone, Copy)]
pub struct SerieOutcome {
    pub home_wins: i32,
    pub away_wins: i32,
    pub doubled: bool,
}

/// Point total of one series pick: exact final score plus series winner
pub fn score_serie_prediction(
    outcome: &SerieOutcome,
    home_wins: i32,
    away_wins: i32,
    rules: &RuleSet,
) -> i32 {
    let mut points = 0;

    if home_wins == outcome.home_wins && away_wins == outcome.away_wins {
        points += rules.flat_points(EvaluatorType::ExactScore);
    }

    let predicted_winner = Winner::from_scores(home_wins, away_wins);
    let actual_winner = Winner::from_scores(outcome.home_wins, outcome.away_wins);
    if predicted_winner == actual_winner {
        points += rules.flat_points(EvaluatorType::Winner);
    }

    if outcome.doubled {
        points *= 2;
    }

    points
}

/// Point total of one special bet pick against the ranked result list.
/// A predicted entity at a tracked rank earns that rank's points; an entity
/// present in the results at an untracked rank earns the unranked fallback.
pub fn score_special_prediction(
    results: &[SpecialBetResult],
    team_id: Option<Uuid>,
    player_id: Option<Uuid>,
    rules: &RuleSet,
) -> i32 {
    match results.iter().find(|r| r.matches(team_id, player_id)) {
        Some(hit) => rules.ranked_points(EvaluatorType::Ranked, Some(hit.rank as u32)),
        None => 0,
    }
}

/// Point total of one question pick: the question's own worth, or nothing
pub fn score_question_prediction(actual: bool, predicted: bool, question_points: i32) -> i32 {
    if actual == predicted {
        question_points
    } else {
        0
    }
}

/// Summary of one evaluation run
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub event_id: Uuid,
    pub league_id: Uuid,
    pub picks_scored: usize,
}

/// The scoring engine: evaluates one event's full set of picks exactly once,
/// atomically.
///
/// For matches and series the `is_evaluated` flag read inside the same
/// serializable transaction is the idempotency guard; special bets and
/// questions carry no flag and re-score by overwriting totals.
pub struct ScoringService {
    pool: PgPool,
    tx_config: TransactionConfig,
    event_repo: Arc<EventRepository>,
    pick_repo: Arc<PickRepository>,
    evaluator_repo: Arc<EvaluatorRepository>,
    invalidator: Arc<dyn CacheInvalidator>,
}

impl ScoringService {
    pub fn new(
        pool: PgPool,
        tx_config: TransactionConfig,
        event_repo: Arc<EventRepository>,
        pick_repo: Arc<PickRepository>,
        evaluator_repo: Arc<EvaluatorRepository>,
        invalidator: Arc<dyn CacheInvalidator>,
    ) -> Self {
        Self {
            pool,
            tx_config,
            event_repo,
            pick_repo,
            evaluator_repo,
            invalidator,
        }
    }

    /// Evaluate a match once the actual result is in
    pub async fn evaluate_match(&self, match_id: Uuid) -> AppResult<Evaluation> {
        let evaluation = with_retry(&self.tx_config, "evaluate_match", || {
            self.try_evaluate_match(match_id)
        })
        .await?;

        info!(
            "Match {} evaluated: {} picks scored",
            match_id, evaluation.picks_scored
        );
        self.invalidator
            .invalidate(&leaderboard_tag(evaluation.league_id));

        Ok(evaluation)
    }

    async fn try_evaluate_match(&self, match_id: Uuid) -> AppResult<Evaluation> {
        let mut tx = begin_serializable(&self.pool, &self.tx_config).await?;

        let m = self
            .event_repo
            .find_match_for_update(&mut tx, match_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound(format!("Match {} not found", match_id)))?;

        if m.is_evaluated {
            return Err(AppError::AlreadyEvaluated(format!(
                "Match {} was already evaluated",
                match_id
            )));
        }

        let (home_score, away_score) = match (m.home_score, m.away_score) {
            (Some(h), Some(a)) => (h, a),
            _ => {
                return Err(AppError::ResultMissing(format!(
                    "Match {} has no result entered",
                    match_id
                )))
            }
        };

        let league_id = m.league_id.ok_or_else(|| {
            AppError::NotLinked(format!("Match {} has no league", match_id))
        })?;

        let rules = self
            .evaluator_repo
            .list_rules_tx(&mut tx, league_id)
            .await
            .map_err(AppError::from)?;
        let rule_set = RuleSet::from_rules(&rules)?;

        let scorers = self
            .event_repo
            .list_match_scorers(&mut tx, match_id)
            .await
            .map_err(AppError::from)?
            .into_iter()
            .map(|s| s.player_id)
            .collect();

        let outcome = MatchOutcome::derive(home_score, away_score, scorers, m.is_doubled);

        let bets = self
            .pick_repo
            .list_bets_for_match(&mut tx, match_id)
            .await
            .map_err(AppError::from)?;

        let picks_scored = bets.len();
        for bet in &bets {
            let prediction = MatchPrediction {
                home_score: bet.home_score,
                away_score: bet.away_score,
                scorer_id: bet.scorer_id,
                no_scorer: bet.no_scorer,
            };
            let points = score_match_prediction(&outcome, &prediction, &rule_set);
            self.pick_repo
                .set_bet_points(&mut tx, bet.id, points)
                .await
                .map_err(AppError::from)?;
        }

        self.event_repo
            .mark_match_evaluated(&mut tx, match_id)
            .await
            .map_err(AppError::from)?;

        tx.commit().await.map_err(crate::error::classify_sqlx)?;

        Ok(Evaluation {
            event_id: match_id,
            league_id,
            picks_scored,
        })
    }

    /// Evaluate a playoff series once its final win counts are in
    pub async fn evaluate_serie(&self, serie_id: Uuid) -> AppResult<Evaluation> {
        let evaluation = with_retry(&self.tx_config, "evaluate_serie", || {
            self.try_evaluate_serie(serie_id)
        })
        .await?;

        info!(
            "Serie {} evaluated: {} picks scored",
            serie_id, evaluation.picks_scored
        );
        self.invalidator
            .invalidate(&leaderboard_tag(evaluation.league_id));

        Ok(evaluation)
    }

    async fn try_evaluate_serie(&self, serie_id: Uuid) -> AppResult<Evaluation> {
        let mut tx = begin_serializable(&self.pool, &self.tx_config).await?;

        let serie = self
            .event_repo
            .find_serie_for_update(&mut tx, serie_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound(format!("Serie {} not found", serie_id)))?;

        if serie.is_evaluated {
            return Err(AppError::AlreadyEvaluated(format!(
                "Serie {} was already evaluated",
                serie_id
            )));
        }

        let (home_wins, away_wins) = match (serie.home_wins, serie.away_wins) {
            (Some(h), Some(a)) => (h, a),
            _ => {
                return Err(AppError::ResultMissing(format!(
                    "Serie {} has no result entered",
                    serie_id
                )))
            }
        };

        let league_id = serie.league_id.ok_or_else(|| {
            AppError::NotLinked(format!("Serie {} has no league", serie_id))
        })?;

        let rules = self
            .evaluator_repo
            .list_rules_tx(&mut tx, league_id)
            .await
            .map_err(AppError::from)?;
        let rule_set = RuleSet::from_rules(&rules)?;

        let outcome = SerieOutcome {
            home_wins,
            away_wins,
            doubled: serie.is_doubled,
        };

        let picks = self
            .pick_repo
            .list_picks_for_serie(&mut tx, serie_id)
            .await
            .map_err(AppError::from)?;

        let picks_scored = picks.len();
        for pick in &picks {
            let points =
                score_serie_prediction(&outcome, pick.home_wins, pick.away_wins, &rule_set);
            self.pick_repo
                .set_serie_pick_points(&mut tx, pick.id, points)
                .await
                .map_err(AppError::from)?;
        }

        self.event_repo
            .mark_serie_evaluated(&mut tx, serie_id)
            .await
            .map_err(AppError::from)?;

        tx.commit().await.map_err(crate::error::classify_sqlx)?;

        Ok(Evaluation {
            event_id: serie_id,
            league_id,
            picks_scored,
        })
    }

    /// Re-score a special bet from its ranked result list. No evaluated
    /// flag here: totals are overwritten, so the operation is idempotent.
    pub async fn evaluate_special_bet(&self, special_bet_id: Uuid) -> AppResult<Evaluation> {
        let evaluation = with_retry(&self.tx_config, "evaluate_special_bet", || {
            self.try_evaluate_special_bet(special_bet_id)
        })
        .await?;

        info!(
            "Special bet {} evaluated: {} picks scored",
            special_bet_id, evaluation.picks_scored
        );
        self.invalidator
            .invalidate(&leaderboard_tag(evaluation.league_id));

        Ok(evaluation)
    }

    async fn try_evaluate_special_bet(&self, special_bet_id: Uuid) -> AppResult<Evaluation> {
        let mut tx = begin_serializable(&self.pool, &self.tx_config).await?;

        let bet = self
            .event_repo
            .find_special_bet_for_update(&mut tx, special_bet_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| {
                AppError::NotFound(format!("Special bet {} not found", special_bet_id))
            })?;

        let results = self
            .event_repo
            .list_special_results(&mut tx, special_bet_id)
            .await
            .map_err(AppError::from)?;

        if results.is_empty() {
            return Err(AppError::ResultMissing(format!(
                "Special bet {} has no result entered",
                special_bet_id
            )));
        }

        let rules = self
            .evaluator_repo
            .list_rules_tx(&mut tx, bet.league_id)
            .await
            .map_err(AppError::from)?;
        let rule_set = RuleSet::from_rules(&rules)?;

        let picks = self
            .pick_repo
            .list_picks_for_special_bet(&mut tx, special_bet_id)
            .await
            .map_err(AppError::from)?;

        let picks_scored = picks.len();
        for pick in &picks {
            let points =
                score_special_prediction(&results, pick.team_id, pick.player_id, &rule_set);
            self.pick_repo
                .set_single_pick_points(&mut tx, pick.id, points)
                .await
                .map_err(AppError::from)?;
        }

        tx.commit().await.map_err(crate::error::classify_sqlx)?;

        Ok(Evaluation {
            event_id: special_bet_id,
            league_id: bet.league_id,
            picks_scored,
        })
    }

    /// Re-score a question from its entered answer; overwrite-idempotent
    /// like special bets.
    pub async fn evaluate_question(&self, question_id: Uuid) -> AppResult<Evaluation> {
        let evaluation = with_retry(&self.tx_config, "evaluate_question", || {
            self.try_evaluate_question(question_id)
        })
        .await?;

        info!(
            "Question {} evaluated: {} picks scored",
            question_id, evaluation.picks_scored
        );
        self.invalidator
            .invalidate(&leaderboard_tag(evaluation.league_id));

        Ok(evaluation)
    }

    async fn try_evaluate_question(&self, question_id: Uuid) -> AppResult<Evaluation> {
        let mut tx = begin_serializable(&self.pool, &self.tx_config).await?;

        let question = self
            .event_repo
            .find_question_for_update(&mut tx, question_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound(format!("Question {} not found", question_id)))?;

        let answer = question.answer.ok_or_else(|| {
            AppError::ResultMissing(format!("Question {} has no answer entered", question_id))
        })?;

        let picks = self
            .pick_repo
            .list_picks_for_question(&mut tx, question_id)
            .await
            .map_err(AppError::from)?;

        let picks_scored = picks.len();
        for pick in &picks {
            let points = score_question_prediction(answer, pick.answer, question.points);
            self.pick_repo
                .set_question_pick_points(&mut tx, pick.id, points)
                .await
                .map_err(AppError::from)?;
        }

        tx.commit().await.map_err(crate::error::classify_sqlx)?;

        Ok(Evaluation {
            event_id: question_id,
            league_id: question.league_id,
            picks_scored,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RankedConfig, RuleConfig};
    use std::collections::HashMap;

    fn standard_rules() -> RuleSet {
        RuleSet::empty()
            .with(EvaluatorType::ExactScore, RuleConfig::Flat(10))
            .with(EvaluatorType::Winner, RuleConfig::Flat(5))
            .with(EvaluatorType::GoalDifference, RuleConfig::Flat(3))
            .with(EvaluatorType::TotalGoals, RuleConfig::Flat(2))
    }

    fn prediction(home: i32, away: i32) -> MatchPrediction {
        MatchPrediction {
            home_score: home,
            away_score: away,
            scorer_id: None,
            no_scorer: false,
        }
    }

    #[test]
    fn test_exact_prediction_collects_all_criteria() {
        // 2:1 actual, 2:1 predicted: exact + winner + difference + total
        let outcome = MatchOutcome::derive(2, 1, vec![], false);
        let total = score_match_prediction(&outcome, &prediction(2, 1), &standard_rules());
        assert_eq!(total, 10 + 5 + 3 + 2);
    }

    #[test]
    fn test_correct_winner_and_difference_only() {
        // 2:1 actual, 3:2 predicted: winner and +1 difference match,
        // exact score and total goals miss
        let outcome = MatchOutcome::derive(2, 1, vec![], false);
        let total = score_match_prediction(&outcome, &prediction(3, 2), &standard_rules());
        assert_eq!(total, 5 + 3);
    }

    #[test]
    fn test_doubled_event_multiplies_total() {
        let outcome = MatchOutcome::derive(2, 1, vec![], true);
        let total = score_match_prediction(&outcome, &prediction(2, 1), &standard_rules());
        assert_eq!(total, 40);
    }

    #[test]
    fn test_draw_counts_as_its_own_outcome() {
        // 1:1 actual, 2:2 predicted: winner (draw) and difference (0) match
        let outcome = MatchOutcome::derive(1, 1, vec![], false);
        let total = score_match_prediction(&outcome, &prediction(2, 2), &standard_rules());
        assert_eq!(total, 5 + 3);
    }

    #[test]
    fn test_wrong_everything_scores_zero() {
        let outcome = MatchOutcome::derive(0, 3, vec![], false);
        let total = score_match_prediction(&outcome, &prediction(2, 1), &standard_rules());
        assert_eq!(total, 0);
    }

    #[test]
    fn test_unconfigured_rules_score_zero() {
        let outcome = MatchOutcome::derive(2, 1, vec![], false);
        let total = score_match_prediction(&outcome, &prediction(2, 1), &RuleSet::empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn test_scorer_ranked_points() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let rules = standard_rules().with(
            EvaluatorType::Scorer,
            RuleConfig::Ranked(RankedConfig {
                ranked_points: HashMap::from([(1, 6)]),
                unranked_points: 2,
            }),
        );
        let outcome = MatchOutcome::derive(2, 0, vec![first, second], false);

        // First scorer hits the tracked rank
        let mut p = prediction(0, 0);
        p.scorer_id = Some(first);
        assert_eq!(score_match_prediction(&outcome, &p, &rules), 6);

        // Second scorer is correct but untracked, falls back to unranked
        p.scorer_id = Some(second);
        assert_eq!(score_match_prediction(&outcome, &p, &rules), 2);

        // A player who never scored earns nothing
        p.scorer_id = Some(Uuid::new_v4());
        assert_eq!(score_match_prediction(&outcome, &p, &rules), 0);
    }

    #[test]
    fn test_no_scorer_call_on_goalless_match() {
        let rules = standard_rules().with(EvaluatorType::Scorer, RuleConfig::Flat(4));
        let outcome = MatchOutcome::derive(0, 0, vec![], false);
        let p = MatchPrediction {
            home_score: 0,
            away_score: 0,
            scorer_id: None,
            no_scorer: true,
        };
        // exact + winner(draw) + difference + total + no-scorer call
        assert_eq!(score_match_prediction(&outcome, &p, &rules), 10 + 5 + 3 + 2 + 4);
    }

    #[test]
    fn test_no_scorer_call_fails_when_goals_fell() {
        let rules = standard_rules().with(EvaluatorType::Scorer, RuleConfig::Flat(4));
        let outcome = MatchOutcome::derive(1, 0, vec![Uuid::new_v4()], false);
        let p = MatchPrediction {
            home_score: 1,
            away_score: 0,
            scorer_id: None,
            no_scorer: true,
        };
        assert_eq!(score_match_prediction(&outcome, &p, &rules), 10 + 5 + 3 + 2);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let outcome = MatchOutcome::derive(2, 1, vec![], true);
        let p = prediction(2, 1);
        let rules = standard_rules();
        let first = score_match_prediction(&outcome, &p, &rules);
        for _ in 0..10 {
            assert_eq!(score_match_prediction(&outcome, &p, &rules), first);
        }
    }

    #[test]
    fn test_serie_exact_and_winner() {
        let rules = standard_rules();
        let outcome = SerieOutcome {
            home_wins: 4,
            away_wins: 2,
            doubled: false,
        };
        // Exact series score also carries the winner points
        assert_eq!(score_serie_prediction(&outcome, 4, 2, &rules), 10 + 5);
        // Right winner, wrong score
        assert_eq!(score_serie_prediction(&outcome, 4, 1, &rules), 5);
        // Wrong winner
        assert_eq!(score_serie_prediction(&outcome, 2, 4, &rules), 0);
    }

    #[test]
    fn test_special_bet_ranked_results() {
        let champion = Uuid::new_v4();
        let runner_up = Uuid::new_v4();
        let rules = RuleSet::empty().with(
            EvaluatorType::Ranked,
            RuleConfig::Ranked(RankedConfig {
                ranked_points: HashMap::from([(1, 15), (2, 8)]),
                unranked_points: 1,
            }),
        );
        let results = vec![
            SpecialBetResult {
                id: Uuid::new_v4(),
                special_bet_id: Uuid::new_v4(),
                rank: 1,
                team_id: Some(champion),
                player_id: None,
            },
            SpecialBetResult {
                id: Uuid::new_v4(),
                special_bet_id: Uuid::new_v4(),
                rank: 2,
                team_id: Some(runner_up),
                player_id: None,
            },
        ];

        assert_eq!(score_special_prediction(&results, Some(champion), None, &rules), 15);
        assert_eq!(score_special_prediction(&results, Some(runner_up), None, &rules), 8);
        assert_eq!(
            score_special_prediction(&results, Some(Uuid::new_v4()), None, &rules),
            0
        );
    }

    #[test]
    fn test_question_scoring() {
        assert_eq!(score_question_prediction(true, true, 7), 7);
        assert_eq!(score_question_prediction(true, false, 7), 0);
        assert_eq!(score_question_prediction(false, false, 7), 7);
    }
}
