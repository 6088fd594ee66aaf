use crate::database::{DbError, NewPhoto, Photo};
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;

#[async_trait]
pub trait PhotoStore: Send + Sync {
    async fn create(&self, photo: &NewPhoto) -> Result<Photo, DbError>;

    async fn find_by_id(&self, photo_id: &str) -> Result<Option<Photo>, DbError>;

    /// Returns whether a row was deleted.
    async fn delete(&self, photo_id: &str) -> Result<bool, DbError>;
}

#[derive(Clone)]
pub struct PgPhotoStore {
    pool: PgPool,
}

impl PgPhotoStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PhotoStore for PgPhotoStore {
    async fn create(&self, photo: &NewPhoto) -> Result<Photo, DbError> {
        Ok(sqlx::query_as::<_, Photo>(
            r"
            INSERT INTO photo (id, user_id, storage_path, facial_area, facial_confidence)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            ",
        )
        .bind(&photo.id)
        .bind(photo.user_id)
        .bind(&photo.storage_path)
        .bind(photo.facial_area.map(Json))
        .bind(photo.facial_confidence)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_by_id(&self, photo_id: &str) -> Result<Option<Photo>, DbError> {
        Ok(
            sqlx::query_as::<_, Photo>("SELECT * FROM photo WHERE id = $1")
                .bind(photo_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn delete(&self, photo_id: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM photo WHERE id = $1")
            .bind(photo_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
