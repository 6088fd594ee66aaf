#![allow(dead_code)]

use app_state::{
    AppSettings, DatabaseSettings, LoggingSettings, RawContestSettings,
    RawEmbeddingServiceSettings, RawRetrySettings, RawSettings, SecretSettings,
};
use async_trait::async_trait;
use common_services::context::ServiceContext;
use common_services::database::stores::{ContestStore, MemoryPhotoStore};
use common_services::database::vector_store::MemoryVectorStore;
use common_services::embedding_client::{
    Embedder, EmbeddingClientError, EmbeddingResult, ImageUpload,
};
use common_types::{ContestPolicy, EMBEDDING_DIM, Embedding};
use std::collections::HashMap;
use std::sync::Arc;

/// A unit face whose cosine similarity to [`target_face`] is exactly `similarity`.
pub fn face(similarity: f64) -> Vec<f64> {
    let mut values = vec![0.0; EMBEDDING_DIM];
    values[0] = similarity;
    values[1] = similarity.mul_add(-similarity, 1.0).max(0.0).sqrt();
    values
}

pub fn target_face() -> Vec<f64> {
    face(1.0)
}

pub fn image(file_name: &str) -> ImageUpload {
    ImageUpload::new(file_name, vec![0xFF, 0xD8, 0xFF])
}

/// Embeds images by file name, rejecting names it doesn't know.
#[derive(Default)]
pub struct FakeEmbedder {
    faces: HashMap<String, Vec<f64>>,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_face(mut self, file_name: &str, values: Vec<f64>) -> Self {
        self.faces.insert(file_name.to_string(), values);
        self
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, image: &ImageUpload) -> Result<EmbeddingResult, EmbeddingClientError> {
        let values = self.faces.get(&image.file_name).cloned().ok_or_else(|| {
            EmbeddingClientError::Rejected {
                status: 400,
                message: "no face detected".to_string(),
            }
        })?;
        Ok(EmbeddingResult {
            embedding: Embedding::new(values)?,
            facial_area: None,
            facial_confidence: Some(0.99),
        })
    }
}

pub fn settings_with(policy: ContestPolicy, max_ranking_attempts: u32) -> AppSettings {
    RawSettings {
        logging: LoggingSettings {
            level: "debug".to_string(),
        },
        secrets: SecretSettings {
            database_url: "postgres://localhost/unused".to_string(),
        },
        database: DatabaseSettings {
            max_connections: 1,
            min_connection: 1,
            max_lifetime: 60,
            idle_timeout: 60,
            acquire_timeout: 1,
            photo_id_length: 10,
            contest_id_length: 8,
        },
        embedding_service: RawEmbeddingServiceSettings {
            url: "http://localhost:0".to_string(),
            endpoint: "embed".to_string(),
            connect_timeout_secs: 1,
            request_timeout_secs: 1,
            retry: RawRetrySettings {
                max_attempts: 1,
                initial_interval_ms: 1,
                backoff_coefficient: 2,
                maximum_interval_ms: 1,
            },
        },
        contest: RawContestSettings {
            entry_statuses: policy.entry_statuses,
            ranking_statuses: policy.ranking_statuses,
            max_ranking_attempts,
        },
    }
    .into()
}

pub fn settings() -> AppSettings {
    settings_with(ContestPolicy::default(), 5)
}

pub fn context(embedder: FakeEmbedder) -> ServiceContext {
    ServiceContext::in_memory(Arc::new(embedder), &settings())
}

/// In-memory services around a custom contest store.
pub fn context_with_contest_store(
    embedder: FakeEmbedder,
    contest_store: Arc<dyn ContestStore>,
    settings: &AppSettings,
) -> ServiceContext {
    ServiceContext::new(
        Arc::new(MemoryPhotoStore::new()),
        contest_store,
        Arc::new(MemoryVectorStore::new()),
        Arc::new(embedder),
        settings,
    )
}
