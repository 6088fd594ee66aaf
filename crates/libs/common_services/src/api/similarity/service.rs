use crate::api::similarity::error::CompareError;
use crate::api::similarity::interfaces::{FriendMatch, Lookalike};
use crate::database::vector_store::{VectorStore, VectorStoreError};
use common_types::{Collection, Similarity};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Scores stored faces against each other.
///
/// Every score is recomputed from the stored embeddings, nothing is cached.
#[derive(Clone)]
pub struct SimilarityService {
    vectors: Arc<dyn VectorStore>,
}

impl SimilarityService {
    #[must_use]
    pub fn new(vectors: Arc<dyn VectorStore>) -> Self {
        Self { vectors }
    }

    #[instrument(skip(self), err(Debug))]
    pub async fn compare_photos(
        &self,
        photo_a: &str,
        photo_b: &str,
    ) -> Result<Similarity, CompareError> {
        let a = self.vectors.get(Collection::Photo, photo_a).await?;
        let b = self.vectors.get(Collection::Photo, photo_b).await?;
        Ok(Similarity::between(a.as_slice(), b.as_slice())?)
    }

    /// Compares the profile faces of two users.
    #[instrument(skip(self), err(Debug))]
    pub async fn compare_users(&self, user_a: i32, user_b: i32) -> Result<Similarity, CompareError> {
        let a = self.profile(user_a).await?;
        let b = self.profile(user_b).await?;
        Ok(Similarity::between(a.as_slice(), b.as_slice())?)
    }

    /// Friends ordered by how much their profile face resembles the user's,
    /// most similar first. Equal scores keep the order of `friend_ids`.
    /// Friends without a profile face are left out.
    #[instrument(skip(self, friend_ids), fields(friends = friend_ids.len()), err(Debug))]
    pub async fn rank_friends(
        &self,
        user_id: i32,
        friend_ids: &[i32],
    ) -> Result<Vec<FriendMatch>, CompareError> {
        let own = self.profile(user_id).await?;

        let mut matches = Vec::with_capacity(friend_ids.len());
        for &friend_id in friend_ids {
            if friend_id == user_id {
                continue;
            }
            let friend = match self
                .vectors
                .get(Collection::UserProfile, &friend_id.to_string())
                .await
            {
                Ok(embedding) => embedding,
                Err(VectorStoreError::NotFound { .. }) => {
                    warn!("Skipping friend {friend_id}: no profile photo");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            matches.push(FriendMatch {
                user_id: friend_id,
                similarity: Similarity::between(own.as_slice(), friend.as_slice())?,
            });
        }

        // Stable sort, so ties stay in the given order.
        matches.sort_by(|a, b| b.similarity.score.total_cmp(&a.similarity.score));
        Ok(matches)
    }

    /// The `k` faces in `collection` closest to a stored photo, excluding the
    /// photo itself.
    #[instrument(skip(self), err(Debug))]
    pub async fn find_lookalikes(
        &self,
        photo_id: &str,
        collection: Collection,
        k: usize,
    ) -> Result<Vec<Lookalike>, CompareError> {
        let query = self.vectors.get(Collection::Photo, photo_id).await?;
        let excludes_self = collection == Collection::Photo;
        let fetch = if excludes_self { k.saturating_add(1) } else { k };

        let neighbors = match self
            .vectors
            .find_nearest(query.as_slice(), collection, fetch)
            .await
        {
            Ok(neighbors) => neighbors,
            Err(VectorStoreError::EmptyCollection(_)) => Vec::new(),
            Err(err) => return Err(err.into()),
        };

        let lookalikes: Vec<Lookalike> = neighbors
            .into_iter()
            .filter(|n| !(excludes_self && n.entity_id == photo_id))
            .take(k)
            .map(|n| Lookalike {
                similarity: Similarity::from_score(n.similarity),
                distance: n.distance,
                entity_id: n.entity_id,
            })
            .collect();
        debug!("Found {} lookalikes for photo {photo_id}", lookalikes.len());
        Ok(lookalikes)
    }

    async fn profile(&self, user_id: i32) -> Result<common_types::Embedding, CompareError> {
        Ok(self
            .vectors
            .get(Collection::UserProfile, &user_id.to_string())
            .await?)
    }
}
