//! Storage and nearest-neighbour search of face embeddings.
//!
//! Two backends implement [`VectorStore`]:
//! - [`PgVectorStore`]: postgres with the pgvector extension, cosine distance via `<=>`.
//! - [`MemoryVectorStore`]: brute force search, for tests and dry runs.
//!
//! Both order neighbours by ascending cosine distance and break exact ties by
//! insertion order, first inserted wins.

mod memory;
mod postgres;

pub use memory::*;
pub use postgres::*;

use async_trait::async_trait;
use axum::http::StatusCode;
use common_types::similarity::cosine_similarity;
use common_types::{Collection, Embedding, EmbeddingError, SimilarityError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("invalid embedding: {0}")]
    InvalidEmbeddingShape(#[from] EmbeddingError),

    #[error("{0}")]
    Similarity(#[from] SimilarityError),

    #[error("no embeddings stored in collection '{0}'")]
    EmptyCollection(Collection),

    #[error("no embedding stored for {collection} '{entity_id}'")]
    NotFound {
        collection: Collection,
        entity_id: String,
    },

    #[error("vector store database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl VectorStoreError {
    pub(crate) fn not_found(collection: Collection, entity_id: &str) -> Self {
        Self::NotFound {
            collection,
            entity_id: entity_id.to_string(),
        }
    }

    /// Status code a client should see for this failure.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidEmbeddingShape(_) | Self::Similarity(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::EmptyCollection(_) | Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// One result of a nearest-neighbour query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Neighbor {
    pub entity_id: String,
    /// Cosine distance to the query, `1 - similarity`.
    pub distance: f64,
    pub similarity: f64,
}

impl Neighbor {
    #[must_use]
    pub fn new(entity_id: String, distance: f64) -> Self {
        Self {
            entity_id,
            distance,
            similarity: 1.0 - distance,
        }
    }
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Persist an embedding for an entity, replacing a previous one.
    ///
    /// Replacing keeps the entity's original insertion order.
    async fn store(
        &self,
        collection: Collection,
        entity_id: &str,
        embedding: &[f64],
    ) -> Result<(), VectorStoreError>;

    /// Fetch the stored embedding of one entity.
    async fn get(
        &self,
        collection: Collection,
        entity_id: &str,
    ) -> Result<Embedding, VectorStoreError>;

    /// The `k` entities of `collection` closest to `query` by cosine distance,
    /// nearest first.
    async fn find_nearest(
        &self,
        query: &[f64],
        collection: Collection,
        k: usize,
    ) -> Result<Vec<Neighbor>, VectorStoreError>;

    /// Returns whether anything was removed.
    async fn remove(
        &self,
        collection: Collection,
        entity_id: &str,
    ) -> Result<bool, VectorStoreError>;
}

/// Shape and magnitude checks shared by every backend, run on stored embeddings
/// and queries before touching storage.
pub(crate) fn validate_query(query: &[f64]) -> Result<(), VectorStoreError> {
    common_types::embedding::validate_values(query)?;
    // Cosine distance to a zero vector is undefined; surface it instead of letting
    // the backend return NaN.
    cosine_similarity(query, query)?;
    Ok(())
}
