use crate::api::photos::PhotoError;
use crate::database::vector_store::VectorStoreError;
use crate::database::{DbError, is_transient_sqlx};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common_types::{ContestStatus, SimilarityError};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ContestError {
    #[error("Contest not found: {0}")]
    NotFound(String),

    #[error("Contest name must not be empty")]
    InvalidName,

    #[error("Contest {contest_id} is {status}, which does not allow {action}")]
    StatusNotAllowed {
        contest_id: String,
        status: ContestStatus,
        action: &'static str,
    },

    #[error("Contest cannot move from {from} to {to}")]
    InvalidTransition {
        from: ContestStatus,
        to: ContestStatus,
    },

    #[error("Contest {contest_id} kept changing while ranking, gave up after {attempts} attempts")]
    RankingConflict { contest_id: String, attempts: u32 },

    #[error(transparent)]
    Photo(#[from] PhotoError),

    #[error("Cannot score entry: {0}")]
    Similarity(#[from] SimilarityError),

    #[error(transparent)]
    VectorStore(#[from] VectorStoreError),

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl ContestError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidName => StatusCode::BAD_REQUEST,
            Self::StatusNotAllowed { .. }
            | Self::InvalidTransition { .. }
            | Self::RankingConflict { .. } => StatusCode::CONFLICT,
            Self::Photo(err) => err.status_code(),
            Self::Similarity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::VectorStore(err) => err.status_code(),
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the same call could succeed if tried again later.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RankingConflict { .. } => true,
            Self::Photo(err) => err.is_transient(),
            Self::VectorStore(VectorStoreError::Database(err)) | Self::Database(err) => {
                is_transient_sqlx(err)
            }
            _ => false,
        }
    }
}

fn log_error(error: &ContestError) {
    match error {
        ContestError::Database(e) => error!("Database query failed: {}", e),
        e => warn!("Contest request failed: {}", e),
    }
}

impl IntoResponse for ContestError {
    fn into_response(self) -> Response {
        log_error(&self);

        let status = self.status_code();
        let error_message = match self {
            Self::Database(_) | Self::VectorStore(VectorStoreError::Database(_)) => {
                "A database error occurred.".to_string()
            }
            e => e.to_string(),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

impl From<DbError> for ContestError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UniqueViolation(err) | DbError::Sqlx(err) => Self::Database(err),
        }
    }
}
