use collab_types::{CollabError, ErrorCode};

/// Errors a [`crate::Store`] implementation can surface. The engines map
/// these onto [`ErrorCode::StoreTimeout`] / [`ErrorCode::StoreUnavailable`]
/// per §7's retry-once-then-surface policy.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("unique constraint violated: {0}")]
    Conflict(String),
    #[error("store operation timed out")]
    Timeout,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::Conflict(db_err.message().to_string())
            }
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

impl From<StoreError> for CollabError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => CollabError::new(ErrorCode::RoomNotFound, "not found"),
            StoreError::Timeout => {
                CollabError::new(ErrorCode::StoreTimeout, "store operation timed out")
            }
            StoreError::Conflict(detail) | StoreError::Unavailable(detail) => {
                CollabError::new(ErrorCode::StoreUnavailable, detail)
            }
        }
    }
}
