use crate::api::photos::error::PhotoError;
use crate::database::stores::PhotoStore;
use crate::database::vector_store::VectorStore;
use crate::database::{NewPhoto, Photo};
use crate::embedding_client::{Embedder, EmbeddingResult, ImageUpload};
use crate::utils::nice_id;
use common_types::{Collection, Embedding};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Registers uploaded photos and keeps their embeddings in the vector store.
#[derive(Clone)]
pub struct PhotoService {
    photos: Arc<dyn PhotoStore>,
    vectors: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    id_length: usize,
}

impl PhotoService {
    #[must_use]
    pub fn new(
        photos: Arc<dyn PhotoStore>,
        vectors: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        id_length: usize,
    ) -> Self {
        Self {
            photos,
            vectors,
            embedder,
            id_length,
        }
    }

    /// Embeds the image, records the photo, and indexes its embedding under
    /// [`Collection::Photo`]. A photo is never left behind without its embedding.
    #[instrument(skip(self, image), fields(file_name = %image.file_name), err(Debug))]
    pub async fn register(
        &self,
        user_id: Option<i32>,
        storage_path: &str,
        image: &ImageUpload,
    ) -> Result<Photo, PhotoError> {
        let embedded = self.embedder.embed(image).await?;
        let photo = self.create_record(user_id, storage_path, &embedded).await?;
        self.index_or_rollback(&photo, Collection::Photo, &photo.id, &embedded.embedding)
            .await?;
        info!("Registered photo {} for user {:?}", photo.id, user_id);
        Ok(photo)
    }

    /// Registers the reference image of a contest. Its embedding is indexed
    /// under [`Collection::ContestTarget`] keyed by the contest id, so it never
    /// shows up in lookalike searches over user photos.
    #[instrument(skip(self, image), fields(file_name = %image.file_name), err(Debug))]
    pub async fn register_contest_target(
        &self,
        contest_id: &str,
        storage_path: &str,
        image: &ImageUpload,
    ) -> Result<Photo, PhotoError> {
        let embedded = self.embedder.embed(image).await?;
        let photo = self.create_record(None, storage_path, &embedded).await?;
        self.index_or_rollback(
            &photo,
            Collection::ContestTarget,
            contest_id,
            &embedded.embedding,
        )
        .await?;
        Ok(photo)
    }

    pub async fn get(&self, photo_id: &str) -> Result<Photo, PhotoError> {
        self.photos
            .find_by_id(photo_id)
            .await?
            .ok_or_else(|| PhotoError::NotFound(photo_id.to_string()))
    }

    /// A photo that must belong to `user_id`.
    pub async fn get_owned(&self, user_id: i32, photo_id: &str) -> Result<Photo, PhotoError> {
        let photo = self.get(photo_id).await?;
        if photo.user_id != Some(user_id) {
            return Err(PhotoError::Forbidden {
                photo_id: photo_id.to_string(),
                user_id,
            });
        }
        Ok(photo)
    }

    pub async fn embedding(&self, photo_id: &str) -> Result<Embedding, PhotoError> {
        Ok(self.vectors.get(Collection::Photo, photo_id).await?)
    }

    /// Uses one of the user's photos as their face for friend comparisons.
    #[instrument(skip(self), err(Debug))]
    pub async fn set_profile_photo(&self, user_id: i32, photo_id: &str) -> Result<Photo, PhotoError> {
        let photo = self.get_owned(user_id, photo_id).await?;
        let embedding = self.embedding(photo_id).await?;
        self.vectors
            .store(
                Collection::UserProfile,
                &user_id.to_string(),
                embedding.as_slice(),
            )
            .await?;
        info!("User {user_id} now uses photo {photo_id} as profile face");
        Ok(photo)
    }

    /// Removes a registered photo together with its indexed embedding.
    pub async fn discard(
        &self,
        photo_id: &str,
        collection: Collection,
        entity_id: &str,
    ) -> Result<(), PhotoError> {
        self.vectors.remove(collection, entity_id).await?;
        self.photos.delete(photo_id).await?;
        Ok(())
    }

    async fn create_record(
        &self,
        user_id: Option<i32>,
        storage_path: &str,
        embedded: &EmbeddingResult,
    ) -> Result<Photo, PhotoError> {
        let new_photo = NewPhoto {
            id: nice_id(self.id_length),
            user_id,
            storage_path: storage_path.to_string(),
            facial_area: embedded.facial_area,
            facial_confidence: embedded.facial_confidence,
        };
        Ok(self.photos.create(&new_photo).await?)
    }

    async fn index_or_rollback(
        &self,
        photo: &Photo,
        collection: Collection,
        entity_id: &str,
        embedding: &Embedding,
    ) -> Result<(), PhotoError> {
        if let Err(err) = self
            .vectors
            .store(collection, entity_id, embedding.as_slice())
            .await
        {
            if let Err(delete_err) = self.photos.delete(&photo.id).await {
                warn!(
                    "Could not roll back photo {} after failed indexing: {delete_err}",
                    photo.id
                );
            }
            return Err(err.into());
        }
        Ok(())
    }
}
