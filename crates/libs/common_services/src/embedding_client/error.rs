use axum::http::StatusCode;
use common_types::EmbeddingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingClientError {
    /// The retry budget ran out on transient failures.
    #[error("Embedding service unavailable after {attempts} attempts: {cause}")]
    Unavailable { attempts: u32, cause: String },

    #[error("Embedding service returned an invalid embedding: {0}")]
    InvalidEmbeddingShape(#[from] EmbeddingError),

    #[error("Embedding service rejected the image ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Embedding service responded {status}: {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response from embedding service: {0}")]
    InvalidResponse(String),

    #[error("Embedding service request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl EmbeddingClientError {
    /// Whether trying the same request again later could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unavailable { .. } | Self::ServerError { .. } => true,
            Self::Request(err) => err.is_connect() || err.is_timeout(),
            Self::InvalidEmbeddingShape(_) | Self::Rejected { .. } | Self::InvalidResponse(_) => {
                false
            }
        }
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unavailable { .. } | Self::ServerError { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Request(err) if err.is_connect() || err.is_timeout() => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Rejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidEmbeddingShape(_) | Self::InvalidResponse(_) | Self::Request(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}
