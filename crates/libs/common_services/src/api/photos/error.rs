use crate::database::vector_store::VectorStoreError;
use crate::database::{DbError, is_transient_sqlx};
use crate::embedding_client::EmbeddingClientError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("Photo not found: {0}")]
    NotFound(String),

    #[error("Photo {photo_id} does not belong to user {user_id}")]
    Forbidden { photo_id: String, user_id: i32 },

    #[error(transparent)]
    Embedding(#[from] EmbeddingClientError),

    #[error(transparent)]
    VectorStore(#[from] VectorStoreError),

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl PhotoError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Embedding(err) => err.status_code(),
            Self::VectorStore(err) => err.status_code(),
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Embedding(err) => err.is_transient(),
            Self::VectorStore(VectorStoreError::Database(err)) | Self::Database(err) => {
                is_transient_sqlx(err)
            }
            _ => false,
        }
    }
}

fn log_error(error: &PhotoError) {
    match error {
        PhotoError::Database(e) => error!("Database query failed: {}", e),
        e => warn!("Photo request failed: {}", e),
    }
}

impl IntoResponse for PhotoError {
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

impl From<DbError> for PhotoError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UniqueViolation(err) | DbError::Sqlx(err) => Self::Database(err),
        }
    }
}
