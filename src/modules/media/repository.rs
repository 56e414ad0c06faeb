use uuid::Uuid;

use crate::{
    api::error,
    modules::media::{
        model::NewMedia,
        schema::{MediaEntity, MediaStats},
    },
};

#[async_trait::async_trait]
pub trait MediaRepository {
    async fn create(&self, media: &NewMedia) -> Result<MediaEntity, error::SystemError>;

    /// Soft-deleted rows are never returned.
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<MediaEntity>, error::SystemError>;

    /// Live rows, newest first.
    async fn find_recent(&self, limit: i64) -> Result<Vec<MediaEntity>, error::SystemError>;

    /// Sets `deleted_at` once. Returns false when the row is missing or
    /// already deleted.
    async fn soft_delete(&self, id: &Uuid) -> Result<bool, error::SystemError>;

    async fn live_storage_keys(&self) -> Result<Vec<String>, error::SystemError>;

    async fn stats(&self) -> Result<MediaStats, error::SystemError>;
}
