use uuid::Uuid;

use crate::{
    api::error,
    modules::media::{
        model::NewMedia,
        repository::MediaRepository,
        schema::{MediaEntity, MediaStats},
    },
};

#[derive(Clone)]
pub struct MediaPgRepository {
    pool: sqlx::PgPool,
}

impl MediaPgRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl MediaRepository for MediaPgRepository {
    async fn create(&self, media: &NewMedia) -> Result<MediaEntity, error::SystemError> {
        let entity = sqlx::query_as::<_, MediaEntity>(
            r#"
            INSERT INTO media_files (id, filename, file_type, file_size, storage_key, storage_url, uploaded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(media.id)
        .bind(&media.filename)
        .bind(&media.file_type)
        .bind(media.file_size)
        .bind(&media.storage_key)
        .bind(&media.storage_url)
        .bind(media.uploaded_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(entity)
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<MediaEntity>, error::SystemError> {
        let media = sqlx::query_as::<_, MediaEntity>(
            "SELECT * FROM media_files WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(media)
    }

    async fn find_recent(&self, limit: i64) -> Result<Vec<MediaEntity>, error::SystemError> {
        // has partial index on (uploaded_at DESC, id DESC) where deleted_at IS NULL
        let media = sqlx::query_as::<_, MediaEntity>(
            "SELECT * FROM media_files WHERE deleted_at IS NULL ORDER BY uploaded_at DESC, id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(media)
    }

    async fn soft_delete(&self, id: &Uuid) -> Result<bool, error::SystemError> {
        let rows = sqlx::query(
            "UPDATE media_files SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows > 0)
    }

    async fn live_storage_keys(&self) -> Result<Vec<String>, error::SystemError> {
        let keys = sqlx::query_scalar::<_, String>(
            "SELECT storage_key FROM media_files WHERE deleted_at IS NULL",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(keys)
    }

    async fn stats(&self) -> Result<MediaStats, error::SystemError> {
        let stats = sqlx::query_as::<_, MediaStats>(
            r#"
            SELECT
                COUNT(*)                            AS total_media,
                COALESCE(SUM(file_size), 0)::BIGINT AS storage_used_bytes
            FROM media_files
            WHERE deleted_at IS NULL
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}
