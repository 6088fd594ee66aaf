use super::{Neighbor, VectorStore, VectorStoreError, validate_query};
use async_trait::async_trait;
use common_types::embedding::format_literal;
use common_types::{Collection, Embedding};
use sqlx::{FromRow, PgPool};
use tracing::debug;

#[derive(Debug, FromRow)]
struct NeighborRow {
    entity_id: String,
    distance: f64,
}

/// Embeddings in the `embedding_index` table, searched with pgvector's `<=>` operator.
///
/// Embeddings go in and come out as the bracketed text literal. Searches are
/// exact scans over one collection.
#[derive(Clone)]
pub struct PgVectorStore {
    pool: PgPool,
}

impl PgVectorStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VectorStore for PgVectorStore {
    async fn store(
        &self,
        collection: Collection,
        entity_id: &str,
        embedding: &[f64],
    ) -> Result<(), VectorStoreError> {
        validate_query(embedding)?;

        sqlx::query(
            r"
            INSERT INTO embedding_index (collection, entity_id, embedding)
            VALUES ($1, $2, $3::vector)
            ON CONFLICT (collection, entity_id) DO UPDATE
                SET embedding = EXCLUDED.embedding
            ",
        )
        .bind(collection)
        .bind(entity_id)
        .bind(format_literal(embedding))
        .execute(&self.pool)
        .await?;

        debug!("Stored {collection} embedding for '{entity_id}'");
        Ok(())
    }

    async fn get(
        &self,
        collection: Collection,
        entity_id: &str,
    ) -> Result<Embedding, VectorStoreError> {
        let literal: String = sqlx::query_scalar(
            "SELECT embedding::text FROM embedding_index WHERE collection = $1 AND entity_id = $2",
        )
        .bind(collection)
        .bind(entity_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| VectorStoreError::not_found(collection, entity_id))?;

        Ok(Embedding::parse_literal(&literal)?)
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

        // `seq` makes exact ties deterministic instead of depending on index order.
        let rows = sqlx::query_as::<_, NeighborRow>(
            r"
            SELECT entity_id, (embedding <=> $1::vector)::float8 AS distance
            FROM embedding_index
            WHERE collection = $2
            ORDER BY embedding <=> $1::vector, seq
            LIMIT $3
            ",
        )
        .bind(format_literal(query))
        .bind(collection)
        .bind(i64::try_from(k).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Err(VectorStoreError::EmptyCollection(collection));
        }

        Ok(rows
            .into_iter()
            .map(|row| Neighbor::new(row.entity_id, row.distance))
            .collect())
    }

    async fn remove(
        &self,
        collection: Collection,
        entity_id: &str,
    ) -> Result<bool, VectorStoreError> {
        let result =
            sqlx::query("DELETE FROM embedding_index WHERE collection = $1 AND entity_id = $2")
                .bind(collection)
                .bind(entity_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
