//! Tipovacka Backend Library
//!
//! This module exposes the backend components for use by tests and other consumers.

pub mod auth;
pub mod cache;
pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};

use cache::TtlCache;
use clock::SystemClock;
use database::Database;
use models::LeaderboardEntry;
use repositories::*;
use services::{AdminService, LeaderboardService, PickService, ResultService, ScoringService};
use std::sync::Arc;

/// Application state containing all repositories and services
pub struct AppState {
    pub database: Database,
    pub league_repo: Arc<LeagueRepository>,
    pub team_repo: Arc<TeamRepository>,
    pub event_repo: Arc<EventRepository>,
    pub pick_repo: Arc<PickRepository>,
    pub evaluator_repo: Arc<EvaluatorRepository>,
    pub prize_repo: Arc<PrizeRepository>,
    pub leaderboard_cache: Arc<TtlCache<Vec<LeaderboardEntry>>>,
    pub pick_service: Arc<PickService>,
    pub result_service: Arc<ResultService>,
    pub scoring_service: Arc<ScoringService>,
    pub leaderboard_service: Arc<LeaderboardService>,
    pub admin_service: Arc<AdminService>,
}

impl AppState {
    /// Create a new AppState with initialized repositories and services
    pub fn new(pool: sqlx::PgPool, config: &AppConfig) -> Self {
        let database = Database::new(pool.clone());

        let league_repo = Arc::new(LeagueRepository::new(pool.clone()));
        let team_repo = Arc::new(TeamRepository::new(pool.clone()));
        let event_repo = Arc::new(EventRepository::new(pool.clone()));
        let pick_repo = Arc::new(PickRepository::new(pool.clone()));
        let evaluator_repo = Arc::new(EvaluatorRepository::new(pool.clone()));
        let prize_repo = Arc::new(PrizeRepository::new(pool.clone()));

        let leaderboard_cache: Arc<TtlCache<Vec<LeaderboardEntry>>> =
            Arc::new(TtlCache::new(config.leaderboard_ttl()));
        let clock = Arc::new(SystemClock);

        let pick_service = Arc::new(PickService::new(
            pool.clone(),
            config.transaction.clone(),
            league_repo.clone(),
            team_repo.clone(),
            event_repo.clone(),
            pick_repo.clone(),
            clock,
            leaderboard_cache.clone(),
        ));

        let result_service = Arc::new(ResultService::new(
            pool.clone(),
            config.transaction.clone(),
            event_repo.clone(),
        ));

        let scoring_service = Arc::new(ScoringService::new(
            pool.clone(),
            config.transaction.clone(),
            event_repo.clone(),
            pick_repo.clone(),
            evaluator_repo.clone(),
            leaderboard_cache.clone(),
        ));

        let leaderboard_service = Arc::new(LeaderboardService::new(
            pick_repo.clone(),
            prize_repo.clone(),
            leaderboard_cache.clone(),
        ));

        let admin_service = Arc::new(AdminService::new(
            pool,
            config.transaction.clone(),
            league_repo.clone(),
            evaluator_repo.clone(),
            prize_repo.clone(),
            leaderboard_cache.clone(),
        ));

        Self {
            database,
            league_repo,
            team_repo,
            event_repo,
            pick_repo,
            evaluator_repo,
            prize_repo,
            leaderboard_cache,
            pick_service,
            result_service,
            scoring_service,
            leaderboard_service,
            admin_service,
        }
    }
}
