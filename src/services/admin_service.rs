use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::cache::{leaderboard_tag, CacheInvalidator};
use crate::config::TransactionConfig;
use crate::database::begin_serializable;
use crate::error::{AppError, AppResult};
use crate::models::{EvaluatorRule, EvaluatorType, LeaguePrizeTier, RuleConfig, TierKind};
use crate::repositories::{EvaluatorRepository, LeagueRepository, PrizeRepository};
use crate::services::with_retry;

/// League configuration paths the core depends on: evaluator rules, prize
/// tiers and participant retirement. Each change fires the league's
/// leaderboard invalidation tag.
pub struct AdminService {
    pool: PgPool,
    tx_config: TransactionConfig,
    league_repo: Arc<LeagueRepository>,
    evaluator_repo: Arc<EvaluatorRepository>,
    prize_repo: Arc<PrizeRepository>,
    invalidator: Arc<dyn CacheInvalidator>,
}

impl AdminService {
    pub fn new(
        pool: PgPool,
        tx_config: TransactionConfig,
        league_repo: Arc<LeagueRepository>,
        evaluator_repo: Arc<EvaluatorRepository>,
        prize_repo: Arc<PrizeRepository>,
        invalidator: Arc<dyn CacheInvalidator>,
    ) -> Self {
        Self {
            pool,
            tx_config,
            league_repo,
            evaluator_repo,
            prize_repo,
            invalidator,
        }
    }

    /// Create or replace a league's rule for one criterion.
    ///
    /// The ranked configuration shape is only valid for the scorer and
    /// ranked criteria; everything else carries a flat value.
    pub async fn upsert_evaluator_rule(
        &self,
        league_id: Uuid,
        evaluator_type: EvaluatorType,
        config: RuleConfig,
    ) -> AppResult<EvaluatorRule> {
        let (points, ranked_config) = match config {
            RuleConfig::Flat(v) => (Some(v), None),
            RuleConfig::Ranked(ranked) => {
                if !matches!(
                    evaluator_type,
                    EvaluatorType::Scorer | EvaluatorType::Ranked
                ) {
                    return Err(AppError::Validation(format!(
                        "Criterion {} takes a flat point value",
                        evaluator_type.as_str()
                    )));
                }
                (None, Some(serde_json::to_value(ranked)?))
            }
        };

        let rule = self
            .evaluator_repo
            .upsert_rule(league_id, evaluator_type.as_str(), points, ranked_config)
            .await
            .map_err(AppError::from)?;

        info!(
            "Evaluator rule stored: league={}, criterion={}",
            league_id,
            evaluator_type.as_str()
        );
        self.invalidator.invalidate(&leaderboard_tag(league_id));

        Ok(rule)
    }

    /// Create or replace the prize/fine tier at one rank slot
    pub async fn upsert_prize_tier(
        &self,
        league_id: Uuid,
        kind: TierKind,
        rank: i32,
        amount: i64,
        currency: &str,
        label: Option<&str>,
    ) -> AppResult<LeaguePrizeTier> {
        if amount < 0 {
            return Err(AppError::Validation(
                "Tier amount must not be negative".to_string(),
            ));
        }

        if currency.len() != 3 {
            return Err(AppError::Validation(format!(
                "Currency must be a 3-letter code, got '{}'",
                currency
            )));
        }

        let tier = self
            .prize_repo
            .upsert_tier(league_id, kind.as_str(), rank, amount, currency, label)
            .await
            .map_err(AppError::from)?;

        info!(
            "Tier stored: league={}, kind={}, rank={}",
            league_id,
            kind.as_str(),
            rank
        );
        self.invalidator.invalidate(&leaderboard_tag(league_id));

        Ok(tier)
    }

    /// Soft-delete one prize/fine tier
    pub async fn remove_prize_tier(&self, league_id: Uuid, tier_id: Uuid) -> AppResult<()> {
        self.prize_repo
            .remove_tier(tier_id)
            .await
            .map_err(AppError::from)?;

        info!("Tier removed: league={}, tier={}", league_id, tier_id);
        self.invalidator.invalidate(&leaderboard_tag(league_id));

        Ok(())
    }

    /// Retire a participant: soft-delete the membership and all of their
    /// picks in one transaction. Point history stays attributable.
    pub async fn retire_participant(&self, league_user_id: Uuid) -> AppResult<()> {
        let participant = self
            .league_repo
            .find_league_user(league_user_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| {
                AppError::NotFound(format!("Participant {} not found", league_user_id))
            })?;

        with_retry(&self.tx_config, "retire_participant", || {
            self.try_retire_participant(league_user_id)
        })
        .await?;

        info!("Participant {} retired", league_user_id);
        self.invalidator
            .invalidate(&leaderboard_tag(participant.league_id));

        Ok(())
    }

    async fn try_retire_participant(&self, league_user_id: Uuid) -> AppResult<()> {
        let mut tx = begin_serializable(&self.pool, &self.tx_config).await?;

        self.league_repo
            .retire_participant(&mut tx, league_user_id)
            .await
            .map_err(AppError::from)?;

        tx.commit().await.map_err(crate::error::classify_sqlx)?;

        Ok(())
    }
}
