use std::collections::HashMap;

use tipovacka_backend::clock::{Clock, FixedClock};
use tipovacka_backend::models::*;
use tipovacka_backend::services::lock_gate;
use tipovacka_backend::services::*;

use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

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

// ============================================================================
// Betting Lock Gate
// ============================================================================

#[test]
fn test_gate_open_strictly_before_deadline() {
    let deadline = Utc.with_ymd_and_hms(2026, 6, 12, 20, 0, 0).unwrap();
    let clock = FixedClock(deadline - Duration::minutes(5));
    assert!(lock_gate::is_open(deadline, clock.now()));
}

#[test]
fn test_gate_closed_from_deadline_onwards() {
    let deadline = Utc.with_ymd_and_hms(2026, 6, 12, 20, 0, 0).unwrap();
    // Equality resolves to closed: the deadline is an exclusive bound
    assert!(!lock_gate::is_open(deadline, deadline));
    assert!(!lock_gate::is_open(deadline, deadline + Duration::seconds(1)));
}

#[test]
fn test_locked_events_reveal_picks() {
    let deadline = Utc.with_ymd_and_hms(2026, 6, 12, 20, 0, 0).unwrap();
    assert!(!lock_gate::picks_visible(deadline, deadline - Duration::seconds(1)));
    assert!(lock_gate::picks_visible(deadline, deadline));
}

// ============================================================================
// Match scoring scenarios
// ============================================================================

#[test]
fn test_scenario_exact_prediction() {
    // Actual 2:1, predicted 2:1 with {exact 10, winner 5, diff 3, total 2}
    let outcome = MatchOutcome::derive(2, 1, vec![], false);
    let total = score_match_prediction(&outcome, &prediction(2, 1), &standard_rules());
    assert_eq!(total, 20);
}

#[test]
fn test_scenario_winner_and_difference() {
    // Actual 2:1, predicted 3:2: winner and +1 difference hit, total misses
    let outcome = MatchOutcome::derive(2, 1, vec![], false);
    let total = score_match_prediction(&outcome, &prediction(3, 2), &standard_rules());
    assert_eq!(total, 8);
}

#[test]
fn test_scenario_doubled_event() {
    let outcome = MatchOutcome::derive(2, 1, vec![], true);
    let total = score_match_prediction(&outcome, &prediction(2, 1), &standard_rules());
    assert_eq!(total, 40);
}

#[test]
fn test_goal_difference_stacks_with_exact_score() {
    // An exact hit trivially matches the difference too; both are awarded
    let rules = RuleSet::empty()
        .with(EvaluatorType::ExactScore, RuleConfig::Flat(10))
        .with(EvaluatorType::GoalDifference, RuleConfig::Flat(3));
    let outcome = MatchOutcome::derive(1, 0, vec![], false);
    assert_eq!(score_match_prediction(&outcome, &prediction(1, 0), &rules), 13);
}

#[test]
fn test_draw_difference_awarded_on_wrong_draw_score() {
    let rules = RuleSet::empty().with(EvaluatorType::GoalDifference, RuleConfig::Flat(3));
    let outcome = MatchOutcome::derive(0, 0, vec![], false);
    assert_eq!(score_match_prediction(&outcome, &prediction(2, 2), &rules), 3);
}

#[test]
fn test_evaluation_is_deterministic_across_repeats() {
    let scorer = Uuid::new_v4();
    let rules = standard_rules().with(
        EvaluatorType::Scorer,
        RuleConfig::Ranked(RankedConfig {
            ranked_points: HashMap::from([(1, 6)]),
            unranked_points: 2,
        }),
    );
    let outcome = MatchOutcome::derive(3, 1, vec![scorer], true);
    let pick = MatchPrediction {
        home_score: 3,
        away_score: 1,
        scorer_id: Some(scorer),
        no_scorer: false,
    };

    let expected = score_match_prediction(&outcome, &pick, &rules);
    for _ in 0..20 {
        assert_eq!(score_match_prediction(&outcome, &pick, &rules), expected);
    }
}

// ============================================================================
// Series and special bet scoring
// ============================================================================

#[test]
fn test_serie_scoring_series_winner() {
    let rules = standard_rules();
    let outcome = SerieOutcome {
        home_wins: 4,
        away_wins: 3,
        doubled: false,
    };
    assert_eq!(score_serie_prediction(&outcome, 4, 3, &rules), 15);
    assert_eq!(score_serie_prediction(&outcome, 4, 0, &rules), 5);
    assert_eq!(score_serie_prediction(&outcome, 0, 4, &rules), 0);
}

#[test]
fn test_serie_doubled() {
    let rules = standard_rules();
    let outcome = SerieOutcome {
        home_wins: 4,
        away_wins: 1,
        doubled: true,
    };
    assert_eq!(score_serie_prediction(&outcome, 4, 1, &rules), 30);
}

#[test]
fn test_special_bet_tracked_and_untracked_ranks() {
    let winner = Uuid::new_v4();
    let third = Uuid::new_v4();
    let rules = RuleSet::empty().with(
        EvaluatorType::Ranked,
        RuleConfig::Ranked(RankedConfig {
            ranked_points: HashMap::from([(1, 20), (2, 10)]),
            unranked_points: 5,
        }),
    );
    let results = vec![
        SpecialBetResult {
            id: Uuid::new_v4(),
            special_bet_id: Uuid::new_v4(),
            rank: 1,
            team_id: Some(winner),
            player_id: None,
        },
        SpecialBetResult {
            id: Uuid::new_v4(),
            special_bet_id: Uuid::new_v4(),
            rank: 3,
            team_id: Some(third),
            player_id: None,
        },
    ];

    // Rank 1 is tracked
    assert_eq!(score_special_prediction(&results, Some(winner), None, &rules), 20);
    // Rank 3 is present in the results but untracked, unranked fallback
    assert_eq!(score_special_prediction(&results, Some(third), None, &rules), 5);
    // Not in the results at all
    assert_eq!(
        score_special_prediction(&results, Some(Uuid::new_v4()), None, &rules),
        0
    );
}

#[test]
fn test_question_scoring_matches_answer() {
    assert_eq!(score_question_prediction(true, true, 4), 4);
    assert_eq!(score_question_prediction(false, true, 4), 0);
}

// ============================================================================
// Rule set resolution
// ============================================================================

#[test]
fn test_unconfigured_criteria_score_zero_not_error() {
    let outcome = MatchOutcome::derive(2, 1, vec![], false);
    assert_eq!(
        score_match_prediction(&outcome, &prediction(2, 1), &RuleSet::empty()),
        0
    );
}

#[test]
fn test_rule_rows_resolve_into_rule_set() {
    let league_id = Uuid::new_v4();
    let rows = vec![
        EvaluatorRule {
            id: Uuid::new_v4(),
            league_id,
            evaluator_type: "exact_score".to_string(),
            points: Some(10),
            ranked_config: None,
            created_at: Utc::now(),
            deleted_at: None,
        },
        EvaluatorRule {
            id: Uuid::new_v4(),
            league_id,
            evaluator_type: "scorer".to_string(),
            points: None,
            ranked_config: Some(serde_json::json!({
                "ranked_points": {"1": 6},
                "unranked_points": 2
            })),
            created_at: Utc::now(),
            deleted_at: None,
        },
    ];

    let set = RuleSet::from_rules(&rows).unwrap();
    assert_eq!(set.flat_points(EvaluatorType::ExactScore), 10);
    assert_eq!(set.ranked_points(EvaluatorType::Scorer, Some(1)), 6);
    assert_eq!(set.ranked_points(EvaluatorType::Scorer, Some(4)), 2);
    assert_eq!(set.flat_points(EvaluatorType::Winner), 0);
}
