use crate::api::contest::ContestService;
use crate::api::photos::PhotoService;
use crate::api::similarity::SimilarityService;
use crate::database::stores::{
    ContestStore, MemoryContestStore, MemoryPhotoStore, PgContestStore, PgPhotoStore, PhotoStore,
};
use crate::database::vector_store::{MemoryVectorStore, PgVectorStore, VectorStore};
use crate::embedding_client::{Embedder, EmbeddingClientError, HttpEmbeddingClient};
use app_state::AppSettings;
use sqlx::PgPool;
use std::sync::Arc;

/// The services, wired to one set of stores.
#[derive(Clone)]
pub struct ServiceContext {
    pub photos: PhotoService,
    pub similarity: SimilarityService,
    pub contests: ContestService,
}

impl ServiceContext {
    #[must_use]
    pub fn new(
        photo_store: Arc<dyn PhotoStore>,
        contest_store: Arc<dyn ContestStore>,
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        settings: &AppSettings,
    ) -> Self {
        let photos = PhotoService::new(
            photo_store,
            Arc::clone(&vector_store),
            embedder,
            settings.database.photo_id_length,
        );
        let similarity = SimilarityService::new(Arc::clone(&vector_store));
        let contests = ContestService::new(
            contest_store,
            vector_store,
            photos.clone(),
            settings.contest.policy.clone(),
            settings.contest.max_ranking_attempts,
            settings.database.contest_id_length,
        );
        Self {
            photos,
            similarity,
            contests,
        }
    }

    /// Services backed by postgres, embedding through the configured HTTP service.
    pub fn postgres(pool: PgPool, settings: &AppSettings) -> Result<Self, EmbeddingClientError> {
        let embedder = HttpEmbeddingClient::new(&settings.embedding_service)?;
        Ok(Self::new(
            Arc::new(PgPhotoStore::new(pool.clone())),
            Arc::new(PgContestStore::new(pool.clone())),
            Arc::new(PgVectorStore::new(pool)),
            Arc::new(embedder),
            settings,
        ))
    }

    /// Services backed by in-memory stores that live as long as the context.
    #[must_use]
    pub fn in_memory(embedder: Arc<dyn Embedder>, settings: &AppSettings) -> Self {
        Self::new(
            Arc::new(MemoryPhotoStore::new()),
            Arc::new(MemoryContestStore::new()),
            Arc::new(MemoryVectorStore::new()),
            embedder,
            settings,
        )
    }
}
