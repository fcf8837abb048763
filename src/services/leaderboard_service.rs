use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::cache::{leaderboard_tag, TtlCache};
use crate::error::{AppError, AppResult};
use crate::models::{CategoryTotals, LeaderboardEntry, LeaguePrizeTier, TierAward, TierKind};
use crate::repositories::{PickRepository, PrizeRepository};

/// Sort participants by grand total and assign sequential ranks.
///
/// Ties deliberately receive sequential ranks, never shared ones: rank is
/// always `1 + number of participants sorted before this one`. The sort is
/// stable, so tied participants keep the storage order (join date).
pub fn rank_participants(rows: Vec<CategoryTotals>) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = rows
        .into_iter()
        .map(|row| {
            let total_points = row.total();
            LeaderboardEntry {
                league_user_id: row.league_user_id,
                display_name: row.display_name,
                match_points: row.match_points,
                serie_points: row.serie_points,
                special_points: row.special_points,
                question_points: row.question_points,
                total_points,
                rank: 0,
                prize: None,
                fine: None,
                is_current_user: false,
            }
        })
        .collect();

    entries.sort_by(|a, b| b.total_points.cmp(&a.total_points));

    for (idx, entry) in entries.iter_mut().enumerate() {
        entry.rank = idx as u32 + 1;
    }

    entries
}

/// Attach prize and fine annotations to the ranked entries.
///
/// A prize at tier rank R goes to the entry ranked R from the top; a fine at
/// tier rank R goes to the entry whose position counted from the bottom is R.
/// With a single participant both can land on the same entry; that is
/// accepted, not guarded against.
pub fn apply_tiers(entries: &mut [LeaderboardEntry], tiers: &[LeaguePrizeTier]) {
    let n = entries.len() as i64;

    for tier in tiers {
        let award = TierAward {
            rank: tier.rank,
            amount: tier.amount,
            currency: tier.currency.clone(),
            label: tier.label.clone(),
        };

        match tier.kind() {
            TierKind::Prize => {
                let idx = tier.rank as i64 - 1;
                if idx >= 0 && idx < n {
                    entries[idx as usize].prize = Some(award);
                }
            }
            TierKind::Fine => {
                // position_from_bottom == tier.rank  <=>  index == n - rank
                let idx = n - tier.rank as i64;
                if idx >= 0 && idx < n {
                    entries[idx as usize].fine = Some(award);
                }
            }
        }
    }
}

/// Leaderboard computation with a per-league TTL cache.
///
/// The cached board never carries the request-specific `is_current_user`
/// flag; that is stamped on a fresh copy per request.
pub struct LeaderboardService {
    pick_repo: Arc<PickRepository>,
    prize_repo: Arc<PrizeRepository>,
    cache: Arc<TtlCache<Vec<LeaderboardEntry>>>,
}

impl LeaderboardService {
    pub fn new(
        pick_repo: Arc<PickRepository>,
        prize_repo: Arc<PrizeRepository>,
        cache: Arc<TtlCache<Vec<LeaderboardEntry>>>,
    ) -> Self {
        Self {
            pick_repo,
            prize_repo,
            cache,
        }
    }

    /// Ranked leaderboard for a league, annotated for the requesting
    /// participant (if any). Zero participants yield an empty board.
    pub async fn get_leaderboard(
        &self,
        league_id: Uuid,
        current_participant: Option<Uuid>,
    ) -> AppResult<Vec<LeaderboardEntry>> {
        let tag = leaderboard_tag(league_id);

        let mut board = match self.cache.get(&tag) {
            Some(board) => {
                debug!("Leaderboard served from cache for league {}", league_id);
                board
            }
            None => {
                let board = self.compute_board(league_id).await?;
                self.cache.put(&tag, board.clone());
                board
            }
        };

        if let Some(current) = current_participant {
            for entry in &mut board {
                entry.is_current_user = entry.league_user_id == current;
            }
        }

        Ok(board)
    }

    async fn compute_board(&self, league_id: Uuid) -> AppResult<Vec<LeaderboardEntry>> {
        let rows = self
            .pick_repo
            .sum_points_by_participant(league_id)
            .await
            .map_err(AppError::from)?;

        let tiers = self
            .prize_repo
            .list_tiers(league_id)
            .await
            .map_err(AppError::from)?;

        let mut board = rank_participants(rows);
        apply_tiers(&mut board, &tiers);

        Ok(board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn totals(name: &str, match_pts: i64, serie_pts: i64, special_pts: i64, question_pts: i64) -> CategoryTotals {
        CategoryTotals {
            league_user_id: Uuid::new_v4(),
            display_name: name.to_string(),
            match_points: match_pts,
            serie_points: serie_pts,
            special_points: special_pts,
            question_points: question_pts,
        }
    }

    fn tier(kind: TierKind, rank: i32, amount: i64) -> LeaguePrizeTier {
        LeaguePrizeTier {
            id: Uuid::new_v4(),
            league_id: Uuid::new_v4(),
            tier_type: kind.as_str().to_string(),
            rank,
            amount,
            currency: "CZK".to_string(),
            label: None,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_totals_sum_all_four_categories() {
        let board = rank_participants(vec![totals("a", 1, 2, 3, 4)]);
        assert_eq!(board[0].total_points, 10);
    }

    #[test]
    fn test_ranks_are_a_permutation_without_shared_ranks() {
        // Totals [20, 20, 10] rank as [1, 2, 3], not [1, 1, 3]
        let board = rank_participants(vec![
            totals("a", 20, 0, 0, 0),
            totals("b", 20, 0, 0, 0),
            totals("c", 10, 0, 0, 0),
        ]);
        let ranks: Vec<u32> = board.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert_eq!(board[0].display_name, "a");
        assert_eq!(board[1].display_name, "b");
    }

    #[test]
    fn test_sort_is_descending_by_total() {
        let board = rank_participants(vec![
            totals("low", 5, 0, 0, 0),
            totals("high", 0, 30, 0, 0),
            totals("mid", 10, 5, 0, 0),
        ]);
        let names: Vec<&str> = board.iter().map(|e| e.display_name.as_str()).collect();
        assert_eq!(names, vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_position_from_bottom_arithmetic() {
        let board = rank_participants(vec![
            totals("a", 30, 0, 0, 0),
            totals("b", 20, 0, 0, 0),
            totals("c", 10, 0, 0, 0),
            totals("d", 5, 0, 0, 0),
        ]);
        let n = board.len() as u32;
        for entry in &board {
            assert_eq!(entry.position_from_bottom(n) + entry.rank, n + 1);
        }
    }

    #[test]
    fn test_prizes_index_from_top_fines_from_bottom() {
        let mut board = rank_participants(vec![
            totals("first", 30, 0, 0, 0),
            totals("second", 20, 0, 0, 0),
            totals("last", 10, 0, 0, 0),
        ]);
        apply_tiers(
            &mut board,
            &[
                tier(TierKind::Prize, 1, 100_00),
                tier(TierKind::Fine, 1, 50_00),
            ],
        );

        assert_eq!(board[0].prize.as_ref().map(|a| a.amount), Some(100_00));
        assert!(board[0].fine.is_none());
        assert!(board[2].prize.is_none());
        assert_eq!(board[2].fine.as_ref().map(|a| a.amount), Some(50_00));
        assert!(board[1].prize.is_none() && board[1].fine.is_none());
    }

    #[test]
    fn test_single_participant_can_hold_prize_and_fine() {
        let mut board = rank_participants(vec![totals("only", 10, 0, 0, 0)]);
        apply_tiers(
            &mut board,
            &[
                tier(TierKind::Prize, 1, 100_00),
                tier(TierKind::Fine, 1, 50_00),
            ],
        );

        assert!(board[0].prize.is_some());
        assert!(board[0].fine.is_some());
    }

    #[test]
    fn test_tiers_beyond_board_size_are_ignored() {
        let mut board = rank_participants(vec![totals("only", 10, 0, 0, 0)]);
        apply_tiers(
            &mut board,
            &[
                tier(TierKind::Prize, 3, 100_00),
                tier(TierKind::Fine, 2, 50_00),
            ],
        );

        assert!(board[0].prize.is_none());
        assert!(board[0].fine.is_none());
    }

    #[test]
    fn test_empty_board() {
        let mut board = rank_participants(vec![]);
        apply_tiers(&mut board, &[tier(TierKind::Prize, 1, 100_00)]);
        assert!(board.is_empty());
    }
}
