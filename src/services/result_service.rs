use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::config::TransactionConfig;
use crate::database::begin_serializable;
use crate::error::{AppError, AppResult};
use crate::repositories::EventRepository;
use crate::services::with_retry;

/// Admin result entry.
///
/// Results can be written and corrected freely until the event is evaluated;
/// after that the scoring engine's idempotency guard makes them immutable
/// (re-opening an evaluated event is a separate administrative path, not
/// provided here).
pub struct ResultService {
    pool: PgPool,
    tx_config: TransactionConfig,
    event_repo: Arc<EventRepository>,
}

impl ResultService {
    pub fn new(pool: PgPool, tx_config: TransactionConfig, event_repo: Arc<EventRepository>) -> Self {
        Self {
            pool,
            tx_config,
            event_repo,
        }
    }

    /// Enter a match's regular-time result and scorer list. For a match tied
    /// to a best-of phase, the game number must not exceed the phase's count.
    pub async fn enter_match_result(
        &self,
        match_id: Uuid,
        home_score: i32,
        away_score: i32,
        game_number: Option<i32>,
        scorer_ids: Vec<Uuid>,
    ) -> AppResult<()> {
        with_retry(&self.tx_config, "enter_match_result", || {
            self.try_enter_match_result(match_id, home_score, away_score, game_number, &scorer_ids)
        })
        .await?;

        info!(
            "Result entered for match {}: {}:{}",
            match_id, home_score, away_score
        );
        Ok(())
    }

    async fn try_enter_match_result(
        &self,
        match_id: Uuid,
        home_score: i32,
        away_score: i32,
        game_number: Option<i32>,
        scorer_ids: &[Uuid],
    ) -> AppResult<()> {
        if home_score < 0 || away_score < 0 {
            return Err(AppError::Validation(
                "Scores must not be negative".to_string(),
            ));
        }

        let mut tx = begin_serializable(&self.pool, &self.tx_config).await?;

        let m = self
            .event_repo
            .find_match_for_update(&mut tx, match_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound(format!("Match {} not found", match_id)))?;

        if m.is_evaluated {
            return Err(AppError::AlreadyEvaluated(format!(
                "Match {} is evaluated; its result is frozen",
                match_id
            )));
        }

        if let (Some(phase_id), Some(game)) = (m.phase_id, game_number) {
            if game < 1 {
                return Err(AppError::Validation(
                    "Game number must be at least 1".to_string(),
                ));
            }

            let phase = self
                .event_repo
                .find_phase_tx(&mut tx, phase_id)
                .await
                .map_err(AppError::from)?
                .ok_or_else(|| AppError::NotFound(format!("Phase {} not found", phase_id)))?;

            if let Some(best_of) = phase.best_of {
                if game > best_of {
                    return Err(AppError::Validation(format!(
                        "Game number {} exceeds the phase's best-of {}",
                        game, best_of
                    )));
                }
            }
        }

        self.event_repo
            .set_match_result(&mut tx, match_id, home_score, away_score, game_number, scorer_ids)
            .await
            .map_err(AppError::from)?;

        tx.commit().await.map_err(crate::error::classify_sqlx)?;

        Ok(())
    }

    /// Enter a playoff series' final win counts
    pub async fn enter_serie_result(
        &self,
        serie_id: Uuid,
        home_wins: i32,
        away_wins: i32,
    ) -> AppResult<()> {
        with_retry(&self.tx_config, "enter_serie_result", || {
            self.try_enter_serie_result(serie_id, home_wins, away_wins)
        })
        .await?;

        info!(
            "Result entered for serie {}: {}:{}",
            serie_id, home_wins, away_wins
        );
        Ok(())
    }

    async fn try_enter_serie_result(
        &self,
        serie_id: Uuid,
        home_wins: i32,
        away_wins: i32,
    ) -> AppResult<()> {
        if home_wins < 0 || away_wins < 0 {
            return Err(AppError::Validation(
                "Win counts must not be negative".to_string(),
            ));
        }

        if home_wins == away_wins {
            return Err(AppError::Validation(
                "A series cannot end level".to_string(),
            ));
        }

        let mut tx = begin_serializable(&self.pool, &self.tx_config).await?;

        let serie = self
            .event_repo
            .find_serie_for_update(&mut tx, serie_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound(format!("Serie {} not found", serie_id)))?;

        if serie.is_evaluated {
            return Err(AppError::AlreadyEvaluated(format!(
                "Serie {} is evaluated; its result is frozen",
                serie_id
            )));
        }

        if let Some(phase_id) = serie.phase_id {
            let phase = self
                .event_repo
                .find_phase_tx(&mut tx, phase_id)
                .await
                .map_err(AppError::from)?
                .ok_or_else(|| AppError::NotFound(format!("Phase {} not found", phase_id)))?;

            if let Some(best_of) = phase.best_of {
                if home_wins + away_wins > best_of {
                    return Err(AppError::Validation(format!(
                        "{} games played exceeds the phase's best-of {}",
                        home_wins + away_wins,
                        best_of
                    )));
                }
            }
        }

        self.event_repo
            .set_serie_result(&mut tx, serie_id, home_wins, away_wins)
            .await
            .map_err(AppError::from)?;

        tx.commit().await.map_err(crate::error::classify_sqlx)?;

        Ok(())
    }

    /// Enter a special bet's ranked result list
    pub async fn enter_single_result(
        &self,
        special_bet_id: Uuid,
        results: Vec<(i32, Option<Uuid>, Option<Uuid>)>,
    ) -> AppResult<()> {
        with_retry(&self.tx_config, "enter_single_result", || {
            self.try_enter_single_result(special_bet_id, &results)
        })
        .await?;

        info!(
            "Result entered for special bet {}: {} ranked rows",
            special_bet_id,
            results.len()
        );
        Ok(())
    }

    async fn try_enter_single_result(
        &self,
        special_bet_id: Uuid,
        results: &[(i32, Option<Uuid>, Option<Uuid>)],
    ) -> AppResult<()> {
        if results.is_empty() {
            return Err(AppError::Validation(
                "A result must name at least one ranked entry".to_string(),
            ));
        }

        let mut seen_ranks = std::collections::HashSet::new();
        for (rank, team_id, player_id) in results {
            if *rank < 1 {
                return Err(AppError::Validation(
                    "Result ranks are 1-indexed".to_string(),
                ));
            }
            if !seen_ranks.insert(*rank) {
                return Err(AppError::Validation(format!(
                    "Duplicate result rank {}",
                    rank
                )));
            }
            match (team_id, player_id) {
                (None, None) => {
                    return Err(AppError::Validation(
                        "Each result entry must name a team or a player".to_string(),
                    ));
                }
                (Some(_), Some(_)) => {
                    return Err(AppError::Validation(
                        "A result entry cannot name both a team and a player".to_string(),
                    ));
                }
                _ => {}
            }
        }

        let mut tx = begin_serializable(&self.pool, &self.tx_config).await?;

        self.event_repo
            .find_special_bet_for_update(&mut tx, special_bet_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| {
                AppError::NotFound(format!("Special bet {} not found", special_bet_id))
            })?;

        self.event_repo
            .replace_special_results(&mut tx, special_bet_id, results)
            .await
            .map_err(AppError::from)?;

        tx.commit().await.map_err(crate::error::classify_sqlx)?;

        Ok(())
    }

    /// Enter a question's actual answer
    pub async fn enter_question_answer(&self, question_id: Uuid, answer: bool) -> AppResult<()> {
        with_retry(&self.tx_config, "enter_question_answer", || {
            self.try_enter_question_answer(question_id, answer)
        })
        .await?;

        info!("Answer entered for question {}: {}", question_id, answer);
        Ok(())
    }

    async fn try_enter_question_answer(&self, question_id: Uuid, answer: bool) -> AppResult<()> {
        let mut tx = begin_serializable(&self.pool, &self.tx_config).await?;

        self.event_repo
            .find_question_for_update(&mut tx, question_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound(format!("Question {} not found", question_id)))?;

        self.event_repo
            .set_question_answer(&mut tx, question_id, answer)
            .await
            .map_err(AppError::from)?;

        tx.commit().await.map_err(crate::error::classify_sqlx)?;

        Ok(())
    }
}
