pub mod lock_gate;
pub mod pick_service;
pub mod result_service;
pub mod scoring_service;
pub mod leaderboard_service;
pub mod admin_service;

pub use pick_service::{
    MatchPickInput, ParticipantPicks, PickService, QuestionPickInput, SeriePickInput,
    SinglePickInput,
};
pub use result_service::ResultService;
pub use scoring_service::{
    score_match_prediction, score_question_prediction, score_serie_prediction,
    score_special_prediction, Evaluation, MatchOutcome, MatchPrediction, ScoringService,
    SerieOutcome,
};
pub use leaderboard_service::{apply_tiers, rank_participants, LeaderboardService};
pub use admin_service::AdminService;

use crate::config::TransactionConfig;
use crate::error::AppResult;
use std::future::Future;
use tracing::warn;

/// Run a transactional command, retrying it on transient storage failures
/// (serialization conflicts, lock-wait timeouts) with bounded attempts and a
/// linear backoff. Anything non-transient propagates immediately.
pub(crate) async fn with_retry<T, F, Fut>(
    config: &TransactionConfig,
    operation: &str,
    mut f: F,
) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 0u32;
    loop {
        match f().await {
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                attempt += 1;
                warn!(
                    "{} hit a transient storage failure (attempt {}/{}): {}",
                    operation, attempt, config.max_retries, e
                );
                tokio::time::sleep(config.retry_backoff(attempt)).await;
            }
            other => return other,
        }
    }
}
