use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Discriminates prize tiers (counted from the top of the ranking) from
/// fine tiers (counted from the bottom)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierKind {
    Prize,
    Fine,
}

impl TierKind {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "prize" => Ok(TierKind::Prize),
            "fine" => Ok(TierKind::Fine),
            _ => Err(format!("Invalid tier kind: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            TierKind::Prize => "prize",
            TierKind::Fine => "fine",
        }
    }
}

impl From<String> for TierKind {
    fn from(s: String) -> Self {
        Self::from_str(&s).unwrap_or(TierKind::Prize)
    }
}

impl From<TierKind> for String {
    fn from(kind: TierKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Configured prize or fine for one rank position.
///
/// `amount` is in minor currency units. Ranks are unique per (league, kind)
/// among non-deleted rows.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LeaguePrizeTier {
    pub id: Uuid,
    pub league_id: Uuid,
    pub tier_type: String,
    pub rank: i32,
    pub amount: i64,
    pub currency: String,
    pub label: Option<String>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl LeaguePrizeTier {
    /// Get the kind as an enum
    pub fn kind(&self) -> TierKind {
        TierKind::from_str(&self.tier_type).unwrap_or(TierKind::Prize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_kind_conversion() {
        assert_eq!(TierKind::Prize.as_str(), "prize");
        assert_eq!(TierKind::from_str("fine").unwrap(), TierKind::Fine);
        assert!(TierKind::from_str("bonus").is_err());
    }
}
