use crate::database::FacialArea;
use async_trait::async_trait;
use common_types::Embedding;
use serde::Deserialize;

use super::EmbeddingClientError;

/// An image to embed, as uploaded by a user.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

/// A validated embedding with the detection metadata that came with it.
#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    pub embedding: Embedding,
    pub facial_area: Option<FacialArea>,
    pub facial_confidence: Option<f64>,
}

/// Body returned by the embedding service, before validation.
#[derive(Debug, Deserialize)]
pub(crate) struct EmbedResponse {
    pub embedding: Vec<f64>,
    #[serde(default)]
    pub facial_area: Option<FacialArea>,
    #[serde(default)]
    pub facial_confidence: Option<f64>,
}

impl TryFrom<EmbedResponse> for EmbeddingResult {
    type Error = EmbeddingClientError;

    fn try_from(response: EmbedResponse) -> Result<Self, Self::Error> {
        Ok(Self {
            embedding: Embedding::new(response.embedding)?,
            facial_area: response.facial_area,
            facial_confidence: response.facial_confidence,
        })
    }
}

/// Anything that can turn an image into a face embedding.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, image: &ImageUpload) -> Result<EmbeddingResult, EmbeddingClientError>;
}
