use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::cache::{event_picks_tag, leaderboard_tag, CacheInvalidator};
use crate::clock::Clock;
use crate::config::TransactionConfig;
use crate::database::begin_serializable;
use crate::error::{AppError, AppResult};
use crate::models::{
    LeagueUser, UserBet, UserSpecialBetQuestion, UserSpecialBetSerie, UserSpecialBetSingle,
};
use crate::repositories::{EventRepository, LeagueRepository, PickRepository, TeamRepository};
use crate::services::{lock_gate, with_retry};

/// Match pick payload as received from the API layer. The participant is
/// resolved server-side from the session, never taken from the payload.
#[derive(Debug, Clone, Copy)]
pub struct MatchPickInput {
    pub match_id: Uuid,
    pub home_score: i32,
    pub away_score: i32,
    pub scorer_id: Option<Uuid>,
    pub no_scorer: bool,
}

/// Series pick payload
#[derive(Debug, Clone, Copy)]
pub struct SeriePickInput {
    pub serie_id: Uuid,
    pub home_wins: i32,
    pub away_wins: i32,
}

/// Special bet pick payload
#[derive(Debug, Clone, Copy)]
pub struct SinglePickInput {
    pub special_bet_id: Uuid,
    pub team_id: Option<Uuid>,
    pub player_id: Option<Uuid>,
}

/// Question pick payload
#[derive(Debug, Clone, Copy)]
pub struct QuestionPickInput {
    pub question_id: Uuid,
    pub answer: bool,
}

/// A participant's picks across all four categories
#[derive(Debug, Clone, Default)]
pub struct ParticipantPicks {
    pub bets: Vec<UserBet>,
    pub serie_picks: Vec<UserSpecialBetSerie>,
    pub single_picks: Vec<UserSpecialBetSingle>,
    pub question_picks: Vec<UserSpecialBetQuestion>,
}

/// Service for submitting and reading picks.
///
/// Every submission runs as one serializable transaction: the event is
/// re-fetched inside it, the deadline and payload rules are checked against
/// that snapshot, and the find-then-branch upsert guarantees at most one
/// non-deleted pick per (participant, event) even under concurrent writers.
pub struct PickService {
    pool: PgPool,
    tx_config: TransactionConfig,
    league_repo: Arc<LeagueRepository>,
    team_repo: Arc<TeamRepository>,
    event_repo: Arc<EventRepository>,
    pick_repo: Arc<PickRepository>,
    clock: Arc<dyn Clock>,
    invalidator: Arc<dyn CacheInvalidator>,
}

impl PickService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pool: PgPool,
        tx_config: TransactionConfig,
        league_repo: Arc<LeagueRepository>,
        team_repo: Arc<TeamRepository>,
        event_repo: Arc<EventRepository>,
        pick_repo: Arc<PickRepository>,
        clock: Arc<dyn Clock>,
        invalidator: Arc<dyn CacheInvalidator>,
    ) -> Self {
        Self {
            pool,
            tx_config,
            league_repo,
            team_repo,
            event_repo,
            pick_repo,
            clock,
            invalidator,
        }
    }

    /// Create or update the caller's pick for a match
    pub async fn submit_match_pick(
        &self,
        league_user_id: Uuid,
        input: MatchPickInput,
    ) -> AppResult<UserBet> {
        let participant = self.require_participant(league_user_id).await?;

        let bet = with_retry(&self.tx_config, "submit_match_pick", || {
            self.try_submit_match_pick(&participant, input)
        })
        .await?;

        info!(
            "Pick stored: participant={}, match={}",
            league_user_id, input.match_id
        );
        self.invalidator
            .invalidate(&event_picks_tag("match", input.match_id));
        self.invalidator
            .invalidate(&leaderboard_tag(participant.league_id));

        Ok(bet)
    }

    async fn try_submit_match_pick(
        &self,
        participant: &LeagueUser,
        input: MatchPickInput,
    ) -> AppResult<UserBet> {
        let mut tx = begin_serializable(&self.pool, &self.tx_config).await?;

        let m = self
            .event_repo
            .find_match_for_update(&mut tx, input.match_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound(format!("Match {} not found", input.match_id)))?;

        if let Some(league_id) = m.league_id {
            if league_id != participant.league_id {
                return Err(AppError::Validation(
                    "Match does not belong to the participant's league".to_string(),
                ));
            }
        }

        if !lock_gate::is_open(m.date_time, self.clock.now()) {
            return Err(AppError::BettingClosed(format!(
                "Betting for match {} closed at {}",
                m.id, m.date_time
            )));
        }

        if input.scorer_id.is_some() && input.no_scorer {
            return Err(AppError::Validation(
                "Cannot predict a scorer and no scorer at the same time".to_string(),
            ));
        }

        if input.home_score < 0 || input.away_score < 0 {
            return Err(AppError::Validation(
                "Predicted scores must not be negative".to_string(),
            ));
        }

        if let Some(scorer_id) = input.scorer_id {
            let player = self
                .team_repo
                .find_player_tx(&mut tx, scorer_id)
                .await
                .map_err(AppError::from)?
                .ok_or_else(|| AppError::NotFound(format!("Player {} not found", scorer_id)))?;

            if !m.involves_team(player.team_id) {
                return Err(AppError::Validation(
                    "Scorer must belong to one of the teams playing".to_string(),
                ));
            }
        }

        let existing = self
            .pick_repo
            .find_bet_for_update(&mut tx, participant.id, input.match_id)
            .await
            .map_err(AppError::from)?;

        let bet = match existing {
            Some(bet) => {
                self.pick_repo
                    .update_bet(
                        &mut tx,
                        bet.id,
                        input.home_score,
                        input.away_score,
                        input.scorer_id,
                        input.no_scorer,
                    )
                    .await
                    .map_err(AppError::from)?
            }
            None => {
                self.pick_repo
                    .insert_bet(
                        &mut tx,
                        participant.id,
                        input.match_id,
                        input.home_score,
                        input.away_score,
                        input.scorer_id,
                        input.no_scorer,
                    )
                    .await
                    .map_err(AppError::from)?
            }
        };

        tx.commit().await.map_err(crate::error::classify_sqlx)?;

        Ok(bet)
    }

    /// Create or update the caller's pick for a playoff series
    pub async fn submit_serie_pick(
        &self,
        league_user_id: Uuid,
        input: SeriePickInput,
    ) -> AppResult<UserSpecialBetSerie> {
        let participant = self.require_participant(league_user_id).await?;

        let pick = with_retry(&self.tx_config, "submit_serie_pick", || {
            self.try_submit_serie_pick(&participant, input)
        })
        .await?;

        info!(
            "Pick stored: participant={}, serie={}",
            league_user_id, input.serie_id
        );
        self.invalidator
            .invalidate(&event_picks_tag("serie", input.serie_id));
        self.invalidator
            .invalidate(&leaderboard_tag(participant.league_id));

        Ok(pick)
    }

    async fn try_submit_serie_pick(
        &self,
        participant: &LeagueUser,
        input: SeriePickInput,
    ) -> AppResult<UserSpecialBetSerie> {
        let mut tx = begin_serializable(&self.pool, &self.tx_config).await?;

        let serie = self
            .event_repo
            .find_serie_for_update(&mut tx, input.serie_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound(format!("Serie {} not found", input.serie_id)))?;

        if let Some(league_id) = serie.league_id {
            if league_id != participant.league_id {
                return Err(AppError::Validation(
                    "Serie does not belong to the participant's league".to_string(),
                ));
            }
        }

        if !lock_gate::is_open(serie.date_time, self.clock.now()) {
            return Err(AppError::BettingClosed(format!(
                "Betting for serie {} closed at {}",
                serie.id, serie.date_time
            )));
        }

        if input.home_wins < 0 || input.away_wins < 0 {
            return Err(AppError::Validation(
                "Predicted win counts must not be negative".to_string(),
            ));
        }

        if input.home_wins == input.away_wins {
            return Err(AppError::Validation(
                "A series prediction cannot end level".to_string(),
            ));
        }

        let existing = self
            .pick_repo
            .find_serie_pick_for_update(&mut tx, participant.id, input.serie_id)
            .await
            .map_err(AppError::from)?;

        let pick = match existing {
            Some(pick) => {
                self.pick_repo
                    .update_serie_pick(&mut tx, pick.id, input.home_wins, input.away_wins)
                    .await
                    .map_err(AppError::from)?
            }
            None => {
                self.pick_repo
                    .insert_serie_pick(
                        &mut tx,
                        participant.id,
                        input.serie_id,
                        input.home_wins,
                        input.away_wins,
                    )
                    .await
                    .map_err(AppError::from)?
            }
        };

        tx.commit().await.map_err(crate::error::classify_sqlx)?;

        Ok(pick)
    }

    /// Create or update the caller's pick for a special bet
    pub async fn submit_single_pick(
        &self,
        league_user_id: Uuid,
        input: SinglePickInput,
    ) -> AppResult<UserSpecialBetSingle> {
        let participant = self.require_participant(league_user_id).await?;

        let pick = with_retry(&self.tx_config, "submit_single_pick", || {
            self.try_submit_single_pick(&participant, input)
        })
        .await?;

        info!(
            "Pick stored: participant={}, special_bet={}",
            league_user_id, input.special_bet_id
        );
        self.invalidator
            .invalidate(&event_picks_tag("special", input.special_bet_id));
        self.invalidator
            .invalidate(&leaderboard_tag(participant.league_id));

        Ok(pick)
    }

    async fn try_submit_single_pick(
        &self,
        participant: &LeagueUser,
        input: SinglePickInput,
    ) -> AppResult<UserSpecialBetSingle> {
        let mut tx = begin_serializable(&self.pool, &self.tx_config).await?;

        let bet = self
            .event_repo
            .find_special_bet_for_update(&mut tx, input.special_bet_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| {
                AppError::NotFound(format!("Special bet {} not found", input.special_bet_id))
            })?;

        if bet.league_id != participant.league_id {
            return Err(AppError::Validation(
                "Special bet does not belong to the participant's league".to_string(),
            ));
        }

        if !lock_gate::is_open(bet.date_time, self.clock.now()) {
            return Err(AppError::BettingClosed(format!(
                "Betting for special bet {} closed at {}",
                bet.id, bet.date_time
            )));
        }

        match (input.team_id, input.player_id) {
            (None, None) => {
                return Err(AppError::Validation(
                    "A special bet pick must name a team or a player".to_string(),
                ));
            }
            (Some(_), Some(_)) => {
                return Err(AppError::Validation(
                    "A special bet pick cannot name both a team and a player".to_string(),
                ));
            }
            (Some(team_id), None) => {
                self.team_repo
                    .find_team(team_id)
                    .await
                    .map_err(AppError::from)?
                    .ok_or_else(|| AppError::NotFound(format!("Team {} not found", team_id)))?;
            }
            (None, Some(player_id)) => {
                self.team_repo
                    .find_player_tx(&mut tx, player_id)
                    .await
                    .map_err(AppError::from)?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Player {} not found", player_id))
                    })?;
            }
        }

        let existing = self
            .pick_repo
            .find_single_pick_for_update(&mut tx, participant.id, input.special_bet_id)
            .await
            .map_err(AppError::from)?;

        let pick = match existing {
            Some(pick) => {
                self.pick_repo
                    .update_single_pick(&mut tx, pick.id, input.team_id, input.player_id)
                    .await
                    .map_err(AppError::from)?
            }
            None => {
                self.pick_repo
                    .insert_single_pick(
                        &mut tx,
                        participant.id,
                        input.special_bet_id,
                        input.team_id,
                        input.player_id,
                    )
                    .await
                    .map_err(AppError::from)?
            }
        };

        tx.commit().await.map_err(crate::error::classify_sqlx)?;

        Ok(pick)
    }

    /// Create or update the caller's answer to a question
    pub async fn submit_question_pick(
        &self,
        league_user_id: Uuid,
        input: QuestionPickInput,
    ) -> AppResult<UserSpecialBetQuestion> {
        let participant = self.require_participant(league_user_id).await?;

        let pick = with_retry(&self.tx_config, "submit_question_pick", || {
            self.try_submit_question_pick(&participant, input)
        })
        .await?;

        info!(
            "Pick stored: participant={}, question={}",
            league_user_id, input.question_id
        );
        self.invalidator
            .invalidate(&event_picks_tag("question", input.question_id));
        self.invalidator
            .invalidate(&leaderboard_tag(participant.league_id));

        Ok(pick)
    }

    async fn try_submit_question_pick(
        &self,
        participant: &LeagueUser,
        input: QuestionPickInput,
    ) -> AppResult<UserSpecialBetQuestion> {
        let mut tx = begin_serializable(&self.pool, &self.tx_config).await?;

        let question = self
            .event_repo
            .find_question_for_update(&mut tx, input.question_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| {
                AppError::NotFound(format!("Question {} not found", input.question_id))
            })?;

        if question.league_id != participant.league_id {
            return Err(AppError::Validation(
                "Question does not belong to the participant's league".to_string(),
            ));
        }

        if !lock_gate::is_open(question.date_time, self.clock.now()) {
            return Err(AppError::BettingClosed(format!(
                "Betting for question {} closed at {}",
                question.id, question.date_time
            )));
        }

        let existing = self
            .pick_repo
            .find_question_pick_for_update(&mut tx, participant.id, input.question_id)
            .await
            .map_err(AppError::from)?;

        let pick = match existing {
            Some(pick) => {
                self.pick_repo
                    .update_question_pick(&mut tx, pick.id, input.answer)
                    .await
                    .map_err(AppError::from)?
            }
            None => {
                self.pick_repo
                    .insert_question_pick(&mut tx, participant.id, input.question_id, input.answer)
                    .await
                    .map_err(AppError::from)?
            }
        };

        tx.commit().await.map_err(crate::error::classify_sqlx)?;

        Ok(pick)
    }

    /// A participant's picks across all categories. When someone other than
    /// the owner asks, picks for events still open for betting are withheld.
    pub async fn get_participant_picks(
        &self,
        league_user_id: Uuid,
        requested_by: Option<Uuid>,
    ) -> AppResult<ParticipantPicks> {
        // Owner sees everything, others only locked events
        let include_open = requested_by == Some(league_user_id);
        let now = self.clock.now();

        let owner = self
            .league_repo
            .find_league_user(league_user_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| {
                AppError::NotFound(format!("Participant {} not found", league_user_id))
            })?;

        let bets = self
            .pick_repo
            .list_bets_for_participant(owner.id, include_open, now)
            .await
            .map_err(AppError::from)?;
        let serie_picks = self
            .pick_repo
            .list_serie_picks_for_participant(owner.id, include_open, now)
            .await
            .map_err(AppError::from)?;
        let single_picks = self
            .pick_repo
            .list_single_picks_for_participant(owner.id, include_open, now)
            .await
            .map_err(AppError::from)?;
        let question_picks = self
            .pick_repo
            .list_question_picks_for_participant(owner.id, include_open, now)
            .await
            .map_err(AppError::from)?;

        Ok(ParticipantPicks {
            bets,
            serie_picks,
            single_picks,
            question_picks,
        })
    }

    /// Resolve and validate the acting participant
    async fn require_participant(&self, league_user_id: Uuid) -> AppResult<LeagueUser> {
        let participant = self
            .league_repo
            .find_league_user(league_user_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| {
                AppError::NotFound(format!("Participant {} not found", league_user_id))
            })?;

        if !participant.is_active {
            return Err(AppError::Unauthorized(
                "Inactive participants cannot submit picks".to_string(),
            ));
        }

        Ok(participant)
    }
}
