use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::engine::VoteError;
use crate::store::StoreError;

/// Handler-boundary error taxonomy.
///
/// Every store and engine failure is converted here before a response is
/// built; raw storage errors never reach a user.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal Server Error")]
    Storage(#[source] StoreError),

    #[error("Internal Server Error")]
    Session(#[from] tower_sessions::session::Error),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Storage(e)
    }
}

impl From<VoteError> for AppError {
    fn from(e: VoteError) -> Self {
        match e {
            VoteError::PollNotFound => AppError::NotFound("Poll not found".to_string()),
            VoteError::OptionNotFound => AppError::NotFound("Option not found".to_string()),
            VoteError::AlreadyVoted => AppError::Validation(e.to_string()),
            VoteError::Storage(e) => AppError::Storage(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Storage(_) | AppError::Session(_) => {
                tracing::error!("request failed: {:?}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_error_mapping() {
        assert!(matches!(
            AppError::from(VoteError::PollNotFound),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(VoteError::AlreadyVoted),
            AppError::Validation(_)
        ));
    }

    #[test]
    fn test_storage_message_is_generic() {
        let err = AppError::Storage(StoreError::Unavailable("db socket closed".to_string()));
        assert_eq!(err.to_string(), "Internal Server Error");
    }
}
