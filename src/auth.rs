use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::LeagueUser;
use crate::repositories::LeagueRepository;

/// Resolved caller identity, produced by the session layer outside this
/// crate. Nothing here is ever trusted from a request payload.
#[derive(Debug, Clone, Copy)]
pub struct Session {
    pub user_id: Uuid,
    pub is_admin: bool,
}

/// Resolve the caller's participant record in a league, or fail with
/// `Unauthorized` when they are not a member
pub async fn require_league_membership(
    league_repo: &LeagueRepository,
    league_id: Uuid,
    session: &Session,
) -> AppResult<LeagueUser> {
    league_repo
        .find_membership(league_id, session.user_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| {
            AppError::Unauthorized(format!(
                "User {} is not a member of league {}",
                session.user_id, league_id
            ))
        })
}

/// Require a platform admin session
pub fn require_admin(session: &Session) -> AppResult<()> {
    if session.is_admin {
        Ok(())
    } else {
        Err(AppError::Unauthorized(
            "Admin privileges required".to_string(),
        ))
    }
}

/// Require that a league member also holds the league admin flag
pub fn require_league_admin(participant: &LeagueUser) -> AppResult<()> {
    if participant.is_admin {
        Ok(())
    } else {
        Err(AppError::Unauthorized(format!(
            "Participant {} is not a league admin",
            participant.id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn participant(is_admin: bool) -> LeagueUser {
        LeagueUser {
            id: Uuid::new_v4(),
            league_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            is_active: true,
            is_admin,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_require_admin() {
        let session = Session {
            user_id: Uuid::new_v4(),
            is_admin: true,
        };
        assert!(require_admin(&session).is_ok());

        let session = Session {
            user_id: Uuid::new_v4(),
            is_admin: false,
        };
        assert!(matches!(
            require_admin(&session),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_require_league_admin() {
        assert!(require_league_admin(&participant(true)).is_ok());
        assert!(matches!(
            require_league_admin(&participant(false)),
            Err(AppError::Unauthorized(_))
        ));
    }
}
