use tipovacka_backend::models::*;
use tipovacka_backend::services::{apply_tiers, rank_participants};

use chrono::Utc;
use uuid::Uuid;

fn totals(name: &str, points: [i64; 4]) -> CategoryTotals {
    CategoryTotals {
        league_user_id: Uuid::new_v4(),
        display_name: name.to_string(),
        match_points: points[0],
        serie_points: points[1],
        special_points: points[2],
        question_points: points[3],
    }
}

fn tier(kind: TierKind, rank: i32, amount: i64, label: Option<&str>) -> LeaguePrizeTier {
    LeaguePrizeTier {
        id: Uuid::new_v4(),
        league_id: Uuid::new_v4(),
        tier_type: kind.as_str().to_string(),
        rank,
        amount,
        currency: "CZK".to_string(),
        label: label.map(|s| s.to_string()),
        created_at: Utc::now(),
        deleted_at: None,
    }
}

// ============================================================================
// Ranking
// ============================================================================

#[test]
fn test_grand_total_sums_all_categories() {
    let board = rank_participants(vec![totals("a", [7, 11, 2, 5])]);
    assert_eq!(board[0].total_points, 25);
}

#[test]
fn test_missing_categories_contribute_zero() {
    let board = rank_participants(vec![totals("a", [7, 0, 0, 0])]);
    assert_eq!(board[0].total_points, 7);
}

#[test]
fn test_ties_get_sequential_ranks() {
    // Totals [20, 20, 10] rank [1, 2, 3], never [1, 1, 3]
    let board = rank_participants(vec![
        totals("a", [20, 0, 0, 0]),
        totals("b", [20, 0, 0, 0]),
        totals("c", [10, 0, 0, 0]),
    ]);
    let ranks: Vec<u32> = board.iter().map(|e| e.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
}

#[test]
fn test_ranks_are_permutation_of_one_to_n() {
    let board = rank_participants(vec![
        totals("a", [10, 0, 0, 0]),
        totals("b", [10, 0, 0, 0]),
        totals("c", [10, 0, 0, 0]),
        totals("d", [25, 0, 0, 0]),
        totals("e", [3, 0, 0, 0]),
    ]);
    let mut ranks: Vec<u32> = board.iter().map(|e| e.rank).collect();
    ranks.sort_unstable();
    assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_ties_preserve_input_order() {
    // The aggregation query orders by join date; a stable sort keeps it
    let board = rank_participants(vec![
        totals("older", [20, 0, 0, 0]),
        totals("newer", [20, 0, 0, 0]),
    ]);
    assert_eq!(board[0].display_name, "older");
    assert_eq!(board[1].display_name, "newer");
}

#[test]
fn test_position_from_bottom_identity() {
    let board = rank_participants(vec![
        totals("a", [40, 0, 0, 0]),
        totals("b", [30, 0, 0, 0]),
        totals("c", [20, 0, 0, 0]),
        totals("d", [10, 0, 0, 0]),
        totals("e", [0, 0, 0, 0]),
    ]);
    let n = board.len() as u32;
    for entry in &board {
        assert_eq!(entry.position_from_bottom(n) + entry.rank, n + 1);
    }
}

#[test]
fn test_empty_league_yields_empty_board() {
    let mut board = rank_participants(vec![]);
    apply_tiers(&mut board, &[tier(TierKind::Prize, 1, 500_00, None)]);
    assert!(board.is_empty());
}

// ============================================================================
// Prize and fine tiers
// ============================================================================

#[test]
fn test_prize_maps_from_top() {
    let mut board = rank_participants(vec![
        totals("first", [30, 0, 0, 0]),
        totals("second", [20, 0, 0, 0]),
        totals("third", [10, 0, 0, 0]),
    ]);
    apply_tiers(
        &mut board,
        &[
            tier(TierKind::Prize, 1, 1000_00, Some("winner takes it")),
            tier(TierKind::Prize, 2, 500_00, None),
        ],
    );

    assert_eq!(board[0].prize.as_ref().map(|a| a.amount), Some(1000_00));
    assert_eq!(
        board[0].prize.as_ref().and_then(|a| a.label.as_deref()),
        Some("winner takes it")
    );
    assert_eq!(board[1].prize.as_ref().map(|a| a.amount), Some(500_00));
    assert!(board[2].prize.is_none());
}

#[test]
fn test_fine_maps_from_bottom() {
    let mut board = rank_participants(vec![
        totals("first", [30, 0, 0, 0]),
        totals("second", [20, 0, 0, 0]),
        totals("third", [10, 0, 0, 0]),
    ]);
    apply_tiers(
        &mut board,
        &[
            tier(TierKind::Fine, 1, 100_00, None),
            tier(TierKind::Fine, 2, 50_00, None),
        ],
    );

    // Fine rank 1 lands on the last entry, rank 2 one above it
    assert_eq!(board[2].fine.as_ref().map(|a| a.amount), Some(100_00));
    assert_eq!(board[1].fine.as_ref().map(|a| a.amount), Some(50_00));
    assert!(board[0].fine.is_none());
}

#[test]
fn test_single_participant_gets_prize_and_fine() {
    // With one participant rank 1 and position-from-bottom 1 coincide;
    // both badges apply
    let mut board = rank_participants(vec![totals("only", [10, 0, 0, 0])]);
    apply_tiers(
        &mut board,
        &[
            tier(TierKind::Prize, 1, 1000_00, None),
            tier(TierKind::Fine, 1, 100_00, None),
        ],
    );

    assert!(board[0].prize.is_some());
    assert!(board[0].fine.is_some());
}

#[test]
fn test_tiers_outside_board_are_dropped() {
    let mut board = rank_participants(vec![
        totals("a", [10, 0, 0, 0]),
        totals("b", [5, 0, 0, 0]),
    ]);
    apply_tiers(
        &mut board,
        &[
            tier(TierKind::Prize, 5, 1000_00, None),
            tier(TierKind::Fine, 3, 100_00, None),
        ],
    );

    assert!(board.iter().all(|e| e.prize.is_none() && e.fine.is_none()));
}

#[test]
fn test_no_entry_marked_current_by_default() {
    let board = rank_participants(vec![totals("a", [1, 0, 0, 0])]);
    assert!(board.iter().all(|e| !e.is_current_user));
}
