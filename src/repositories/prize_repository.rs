use crate::error::RepositoryError;
use crate::models::LeaguePrizeTier;
use sqlx::PgPool;
use uuid::Uuid;

const TIER_COLUMNS: &str = "id, league_id, tier_type, rank, amount, currency, label, created_at, deleted_at";

/// Repository for prize and fine tier configuration
pub struct PrizeRepository {
    pool: PgPool,
}

impl PrizeRepository {
    /// Create a new PrizeRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All non-deleted tiers of a league, prizes and fines together
    pub async fn list_tiers(&self, league_id: Uuid) -> Result<Vec<LeaguePrizeTier>, RepositoryError> {
        let tiers = sqlx::query_as::<_, LeaguePrizeTier>(&format!(
            "SELECT {} FROM league_prize_tiers \
             WHERE league_id = $1 AND deleted_at IS NULL \
             ORDER BY tier_type, rank",
            TIER_COLUMNS
        ))
        .bind(league_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tiers)
    }

    /// Create or replace the tier at one (kind, rank) slot. Ranks stay
    /// unique per (league, kind) among non-deleted rows.
    pub async fn upsert_tier(
        &self,
        league_id: Uuid,
        tier_type: &str,
        rank: i32,
        amount: i64,
        currency: &str,
        label: Option<&str>,
    ) -> Result<LeaguePrizeTier, RepositoryError> {
        if !(1..=10).contains(&rank) {
            return Err(RepositoryError::InvalidInput(format!(
                "Tier rank must be between 1 and 10, got {}",
                rank
            )));
        }

        let tier = sqlx::query_as::<_, LeaguePrizeTier>(&format!(
            "INSERT INTO league_prize_tiers (id, league_id, tier_type, rank, amount, currency, label) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (league_id, tier_type, rank) WHERE deleted_at IS NULL \
             DO UPDATE SET amount = EXCLUDED.amount, currency = EXCLUDED.currency, \
                           label = EXCLUDED.label \
             RETURNING {}",
            TIER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(league_id)
        .bind(tier_type)
        .bind(rank)
        .bind(amount)
        .bind(currency)
        .bind(label)
        .fetch_one(&self.pool)
        .await?;

        Ok(tier)
    }

    /// Soft-delete one tier
    pub async fn remove_tier(&self, id: Uuid) -> Result<(), RepositoryError> {
        let updated = sqlx::query(
            "UPDATE league_prize_tiers SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Tier {} not found", id)));
        }

        Ok(())
    }
}
