use crate::error::RepositoryError;
use crate::models::EvaluatorRule;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

const RULE_COLUMNS: &str = "id, league_id, evaluator_type, points, ranked_config, created_at, deleted_at";

/// Repository for per-league evaluator rules
pub struct EvaluatorRepository {
    pool: PgPool,
}

impl EvaluatorRepository {
    /// Create a new EvaluatorRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All non-deleted rules of a league
    pub async fn list_rules(&self, league_id: Uuid) -> Result<Vec<EvaluatorRule>, RepositoryError> {
        let rules = sqlx::query_as::<_, EvaluatorRule>(&format!(
            "SELECT {} FROM evaluator_rules \
             WHERE league_id = $1 AND deleted_at IS NULL",
            RULE_COLUMNS
        ))
        .bind(league_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rules)
    }

    /// Rules read inside an evaluation transaction, so scoring sees the same
    /// snapshot it writes against
    pub async fn list_rules_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        league_id: Uuid,
    ) -> Result<Vec<EvaluatorRule>, RepositoryError> {
        let rules = sqlx::query_as::<_, EvaluatorRule>(&format!(
            "SELECT {} FROM evaluator_rules \
             WHERE league_id = $1 AND deleted_at IS NULL",
            RULE_COLUMNS
        ))
        .bind(league_id)
        .fetch_all(&mut *tx)
        .await?;

        Ok(rules)
    }

    /// Create or replace a league's rule for one criterion
    pub async fn upsert_rule(
        &self,
        league_id: Uuid,
        evaluator_type: &str,
        points: Option<i32>,
        ranked_config: Option<serde_json::Value>,
    ) -> Result<EvaluatorRule, RepositoryError> {
        let rule = sqlx::query_as::<_, EvaluatorRule>(&format!(
            "INSERT INTO evaluator_rules (id, league_id, evaluator_type, points, ranked_config) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (league_id, evaluator_type) WHERE deleted_at IS NULL \
             DO UPDATE SET points = EXCLUDED.points, ranked_config = EXCLUDED.ranked_config \
             RETURNING {}",
            RULE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(league_id)
        .bind(evaluator_type)
        .bind(points)
        .bind(ranked_config)
        .fetch_one(&self.pool)
        .await?;

        Ok(rule)
    }
}
