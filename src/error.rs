use crate::database::DatabaseError;
use sqlx::Error as SqlxError;
use thiserror::Error;

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database errors
    #[error("SQL error: {0}")]
    Sqlx(#[from] SqlxError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Unauthorized access errors
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Betting deadline has passed for the event
    #[error("Betting closed: {0}")]
    BettingClosed(String),

    /// Event was already evaluated; points must not be applied twice
    #[error("Already evaluated: {0}")]
    AlreadyEvaluated(String),

    /// Concurrency-guard violation, e.g. a duplicate pick insert
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Actual result has not been entered for the event
    #[error("Result missing: {0}")]
    ResultMissing(String),

    /// Event is not linked to a league, so no rule set can be resolved
    #[error("Event not linked to a league: {0}")]
    NotLinked(String),

    /// Transient storage failure (lock-wait or transaction timeout); retryable
    #[error("Transient storage error: {0}")]
    Transient(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// UUID parsing errors
    #[error("Invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    /// Generic error with message
    #[error("{0}")]
    Message(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Check if error is a database connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            AppError::Database(DatabaseError::PoolCreation(_))
                | AppError::Database(DatabaseError::ConnectionTimeout)
        )
    }

    /// Check if error is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    /// Only transient storage failures may be retried; everything else is
    /// either caller error or a guard that a retry would trip again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Transient(_))
    }

    /// Get HTTP status code for the error
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::NotFound(_) => 404,
            AppError::Unauthorized(_) => 401,
            AppError::Validation(_) | AppError::ResultMissing(_) | AppError::NotLinked(_) => 400,
            AppError::BettingClosed(_) => 403,
            AppError::AlreadyEvaluated(_) | AppError::Conflict(_) => 409,
            AppError::Transient(_) => 503,
            AppError::Config(_) => 500,
            AppError::Database(_) | AppError::Sqlx(_) => 500,
            _ => 500,
        }
    }
}

/// Repository-specific error types
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Database query error
    #[error("Query error: {0}")]
    Query(SqlxError),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Duplicate record
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// Constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Serialization failure or deadlock; the transaction should be retried
    #[error("Retryable transaction failure: {0}")]
    Retryable(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => AppError::NotFound(msg),
            RepositoryError::Query(e) => AppError::Sqlx(e),
            RepositoryError::Duplicate(msg) => AppError::Conflict(format!("Duplicate: {}", msg)),
            RepositoryError::ConstraintViolation(msg) => AppError::Validation(msg),
            RepositoryError::Retryable(msg) => AppError::Transient(msg),
            RepositoryError::InvalidInput(msg) => AppError::Validation(msg),
        }
    }
}

impl From<SqlxError> for RepositoryError {
    fn from(err: SqlxError) -> Self {
        match &err {
            SqlxError::RowNotFound => RepositoryError::NotFound("Record not found".to_string()),
            SqlxError::PoolTimedOut => {
                RepositoryError::Retryable("Timed out waiting for a connection".to_string())
            }
            SqlxError::Database(db_err) => {
                // Check for common PostgreSQL error codes
                let code = db_err.code().map(|c| c.to_string());
                match code.as_deref() {
                    // Unique violation
                    Some("23505") => RepositoryError::Duplicate(db_err.message().to_string()),
                    // Foreign key / check constraint violation
                    Some("23503") | Some("23514") => {
                        RepositoryError::ConstraintViolation(db_err.message().to_string())
                    }
                    // Serialization failure / deadlock detected
                    Some("40001") | Some("40P01") => {
                        RepositoryError::Retryable(db_err.message().to_string())
                    }
                    // Lock not available / statement timeout
                    Some("55P03") | Some("57014") => {
                        RepositoryError::Retryable(db_err.message().to_string())
                    }
                    _ => RepositoryError::Query(err),
                }
            }
            _ => RepositoryError::Query(err),
        }
    }
}

/// Convert a raw sqlx error straight to the application taxonomy,
/// going through the SQLSTATE classification above.
pub fn classify_sqlx(err: SqlxError) -> AppError {
    AppError::from(RepositoryError::from(err))
}

/// Convenience function to convert Option<T> to Result<T, AppError>
pub fn option_to_result<T>(opt: Option<T>, error_msg: &str) -> AppResult<T> {
    opt.ok_or_else(|| AppError::NotFound(error_msg.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(AppError::Transient("lock timeout".into()).is_retryable());
        assert!(!AppError::Conflict("duplicate pick".into()).is_retryable());
        assert!(!AppError::AlreadyEvaluated("match".into()).is_retryable());
        assert!(!AppError::BettingClosed("deadline passed".into()).is_retryable());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::NotFound("x".into()).status_code(), 404);
        assert_eq!(AppError::BettingClosed("x".into()).status_code(), 403);
        assert_eq!(AppError::AlreadyEvaluated("x".into()).status_code(), 409);
        assert_eq!(AppError::Transient("x".into()).status_code(), 503);
    }

    #[test]
    fn test_repository_error_maps_to_conflict() {
        let err = AppError::from(RepositoryError::Duplicate("user_bets".into()));
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
