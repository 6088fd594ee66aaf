use super::{Neighbor, VectorStore, VectorStoreError, validate_query};
use async_trait::async_trait;
use common_types::similarity::cosine_distance;
use common_types::{Collection, Embedding};
use std::collections::HashMap;
use tokio::sync::RwLock;

struct StoredEmbedding {
    seq: u64,
    embedding: Embedding,
}

#[derive(Default)]
struct Index {
    next_seq: u64,
    collections: HashMap<Collection, HashMap<String, StoredEmbedding>>,
}

/// In-memory vector store with brute force cosine search.
///
/// Suitable for tests and small dry runs.
#[derive(Default)]
pub struct MemoryVectorStore {
    index: RwLock<Index>,
}

impl MemoryVectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self, collection: Collection) -> usize {
        self.index
            .read()
            .await
            .collections
            .get(&collection)
            .map_or(0, HashMap::len)
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn store(
        &self,
        collection: Collection,
        entity_id: &str,
        embedding: &[f64],
    ) -> Result<(), VectorStoreError> {
        validate_query(embedding)?;
        let embedding = Embedding::new(embedding.to_vec())?;

        let mut index = self.index.write().await;
        let seq = index.next_seq;
        let entries = index.collections.entry(collection).or_default();
        if let Some(existing) = entries.get_mut(entity_id) {
            existing.embedding = embedding;
        } else {
            entries.insert(entity_id.to_string(), StoredEmbedding { seq, embedding });
            index.next_seq += 1;
        }
        Ok(())
    }

    async fn get(
        &self,
        collection: Collection,
        entity_id: &str,
    ) -> Result<Embedding, VectorStoreError> {
        self.index
            .read()
            .await
            .collections
            .get(&collection)
            .and_then(|entries| entries.get(entity_id))
            .map(|stored| stored.embedding.clone())
            .ok_or_else(|| VectorStoreError::not_found(collection, entity_id))
    }

    async fn find_nearest(
        &self,
        query: &[f64],
        collection: Collection,
        k: usize,
    ) -> Result<Vec<Neighbor>, VectorStoreError> {
        validate_query(query)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let index = self.index.read().await;
        let entries = index
            .collections
            .get(&collection)
            .filter(|entries| !entries.is_empty())
            .ok_or(VectorStoreError::EmptyCollection(collection))?;

        let mut scored = entries
            .iter()
            .map(|(entity_id, stored)| -> Result<_, VectorStoreError> {
                let distance = cosine_distance(query, stored.embedding.as_slice())?;
                Ok((stored.seq, entity_id, distance))
            })
            .collect::<Result<Vec<_>, VectorStoreError>>()?;

        scored.sort_by(|(seq_a, _, dist_a), (seq_b, _, dist_b)| {
            dist_a.total_cmp(dist_b).then(seq_a.cmp(seq_b))
        });

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(_, entity_id, distance)| Neighbor::new(entity_id.clone(), distance))
            .collect())
    }

    async fn remove(
        &self,
        collection: Collection,
        entity_id: &str,
    ) -> Result<bool, VectorStoreError> {
        Ok(self
            .index
            .write()
            .await
            .collections
            .get_mut(&collection)
            .and_then(|entries| entries.remove(entity_id))
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_types::{EMBEDDING_DIM, SimilarityError};

    /// A unit-length embedding pointing `angle` radians away from the first axis.
    fn at_angle(angle: f64) -> Vec<f64> {
        let mut values = vec![0.0; EMBEDDING_DIM];
        values[0] = angle.cos();
        values[1] = angle.sin();
        values
    }

    fn ids(neighbors: &[Neighbor]) -> Vec<&str> {
        neighbors.iter().map(|n| n.entity_id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_find_nearest_orders_by_distance() -> Result<(), VectorStoreError> {
        let store = MemoryVectorStore::new();
        store.store(Collection::Photo, "far", &at_angle(1.4)).await?;
        store.store(Collection::Photo, "near", &at_angle(0.2)).await?;
        store.store(Collection::Photo, "mid", &at_angle(0.8)).await?;

        let query = at_angle(0.0);
        let neighbors = store.find_nearest(&query, Collection::Photo, 3).await?;
        assert_eq!(ids(&neighbors), ["near", "mid", "far"]);
        assert!(neighbors.windows(2).all(|w| w[0].distance < w[1].distance));
        for neighbor in &neighbors {
            assert!((neighbor.similarity + neighbor.distance - 1.0).abs() < 1e-12);
        }

        // A closer fourth embedding takes over the top spot.
        store.store(Collection::Photo, "closest", &at_angle(0.05)).await?;
        let neighbors = store.find_nearest(&query, Collection::Photo, 3).await?;
        assert_eq!(ids(&neighbors), ["closest", "near", "mid"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_exact_ties_keep_insertion_order() -> Result<(), VectorStoreError> {
        let store = MemoryVectorStore::new();
        for id in ["b", "a", "c"] {
            store.store(Collection::Photo, id, &at_angle(0.3)).await?;
        }
        // Re-storing keeps the original slot.
        store.store(Collection::Photo, "b", &at_angle(0.3)).await?;

        let neighbors = store
            .find_nearest(&at_angle(0.0), Collection::Photo, 3)
            .await?;
        assert_eq!(ids(&neighbors), ["b", "a", "c"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_collections_are_separate() -> Result<(), VectorStoreError> {
        let store = MemoryVectorStore::new();
        store.store(Collection::Photo, "p1", &at_angle(0.1)).await?;
        store
            .store(Collection::ContestTarget, "c1", &at_angle(0.0))
            .await?;

        let neighbors = store
            .find_nearest(&at_angle(0.0), Collection::Photo, 10)
            .await?;
        assert_eq!(ids(&neighbors), ["p1"]);
        assert_eq!(store.len(Collection::ContestTarget).await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_collection() {
        let store = MemoryVectorStore::new();
        let result = store
            .find_nearest(&at_angle(0.0), Collection::UserProfile, 5)
            .await;
        assert!(matches!(
            result,
            Err(VectorStoreError::EmptyCollection(Collection::UserProfile))
        ));
    }

    #[tokio::test]
    async fn test_rejects_wrong_shape() {
        let store = MemoryVectorStore::new();
        let result = store.store(Collection::Photo, "short", &[1.0, 0.0]).await;
        assert!(matches!(
            result,
            Err(VectorStoreError::InvalidEmbeddingShape(_))
        ));

        let result = store.find_nearest(&[1.0; 3], Collection::Photo, 1).await;
        assert!(matches!(
            result,
            Err(VectorStoreError::InvalidEmbeddingShape(_))
        ));
    }

    #[tokio::test]
    async fn test_zero_query_is_degenerate() -> Result<(), VectorStoreError> {
        let store = MemoryVectorStore::new();
        store.store(Collection::Photo, "p1", &at_angle(0.0)).await?;
        let result = store
            .find_nearest(&vec![0.0; EMBEDDING_DIM], Collection::Photo, 1)
            .await;
        assert!(matches!(result, Err(VectorStoreError::Similarity(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_zero_embedding_is_never_indexed() -> Result<(), VectorStoreError> {
        let store = MemoryVectorStore::new();
        store.store(Collection::Photo, "good", &at_angle(0.0)).await?;

        let result = store
            .store(Collection::Photo, "blank", &vec![0.0; EMBEDDING_DIM])
            .await;
        assert!(matches!(
            result,
            Err(VectorStoreError::Similarity(SimilarityError::DegenerateVector))
        ));
        assert_eq!(store.len(Collection::Photo).await, 1);

        let neighbors = store
            .find_nearest(&at_angle(0.0), Collection::Photo, 1)
            .await?;
        assert_eq!(ids(&neighbors), ["good"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_and_remove() -> Result<(), VectorStoreError> {
        let store = MemoryVectorStore::new();
        store.store(Collection::Photo, "p1", &at_angle(0.7)).await?;
        assert_eq!(store.get(Collection::Photo, "p1").await?.to_vec(), at_angle(0.7));

        assert!(store.remove(Collection::Photo, "p1").await?);
        assert!(!store.remove(Collection::Photo, "p1").await?);
        assert!(matches!(
            store.get(Collection::Photo, "p1").await,
            Err(VectorStoreError::NotFound { .. })
        ));
        Ok(())
    }
}
