use crate::database::is_transient_sqlx;
use crate::database::vector_store::VectorStoreError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common_types::{Collection, SimilarityError};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum CompareError {
    #[error("Photo not found: {0}")]
    PhotoNotFound(String),

    #[error("User {0} has no profile photo")]
    NoProfile(String),

    #[error("Cannot compare embeddings: {0}")]
    Similarity(#[from] SimilarityError),

    #[error(transparent)]
    VectorStore(VectorStoreError),
}

impl From<VectorStoreError> for CompareError {
    fn from(err: VectorStoreError) -> Self {
        match err {
            VectorStoreError::NotFound {
                collection: Collection::Photo,
                entity_id,
            } => Self::PhotoNotFound(entity_id),
            VectorStoreError::NotFound {
                collection: Collection::UserProfile,
                entity_id,
            } => Self::NoProfile(entity_id),
            VectorStoreError::Similarity(err) => Self::Similarity(err),
            err => Self::VectorStore(err),
        }
    }
}

impl CompareError {
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::PhotoNotFound(_) | Self::NoProfile(_) => StatusCode::NOT_FOUND,
            Self::Similarity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::VectorStore(err) => err.status_code(),
        }
    }

    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::VectorStore(VectorStoreError::Database(err)) => is_transient_sqlx(err),
            _ => false,
        }
    }
}

fn log_error(error: &CompareError) {
    match error {
        CompareError::VectorStore(VectorStoreError::Database(e)) => {
            error!("Vector store query failed: {}", e);
        }
        e => warn!("Comparison failed: {}", e),
    }
}

impl IntoResponse for CompareError {
    fn into_response(self) -> Response {
        log_error(&self);

        let status = self.status_code();
        let error_message = match self {
            Self::VectorStore(VectorStoreError::Database(_)) => {
                "A database error occurred.".to_string()
            }
            e => e.to_string(),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
