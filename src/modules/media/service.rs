use bytes::Bytes;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::api::error;
use crate::constants::LIST_LIMIT;
use crate::modules::media::{
    model::{NewMedia, UploadCandidate, UploadConfig},
    repository::MediaRepository,
    schema::{MediaEntity, MediaStats},
};
use crate::storage::ObjectStoreGateway;
use crate::utils::{storage_key, MillisClock};

#[derive(Clone)]
pub struct MediaService<R>
where
    R: MediaRepository + Send + Sync,
{
    media_repo: Arc<R>,
    storage: Arc<dyn ObjectStoreGateway>,
    config: UploadConfig,
    clock: Arc<MillisClock>,
}

impl<R> MediaService<R>
where
    R: MediaRepository + Send + Sync,
{
    pub fn new(media_repo: Arc<R>, storage: Arc<dyn ObjectStoreGateway>, config: UploadConfig) -> Self {
        log::info!("MediaService initialized with {:?} storage", storage.backend());
        Self { media_repo, storage, config, clock: Arc::new(MillisClock::default()) }
    }

    pub fn with_defaults(media_repo: Arc<R>, storage: Arc<dyn ObjectStoreGateway>) -> Self {
        Self::new(media_repo, storage, UploadConfig::default())
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn ObjectStoreGateway> {
        &self.storage
    }

    /// Checked before any byte of the body is read.
    pub fn check_file_type(&self, file_type: &str) -> Result<(), error::SystemError> {
        if !self.config.allowed_mime_types.iter().any(|allowed| allowed == file_type) {
            return Err(error::SystemError::bad_request(format!(
                "File type '{}' is not allowed. Please upload an image (JPG, PNG, GIF) or video (MP4, WebM)",
                file_type
            )));
        }
        Ok(())
    }

    pub fn check_file_size(&self, file_size: i64) -> Result<(), error::SystemError> {
        if file_size > self.config.max_file_size {
            return Err(error::SystemError::bad_request(format!(
                "File size exceeds maximum allowed size of {} bytes",
                self.config.max_file_size
            )));
        }
        if file_size == 0 {
            return Err(error::SystemError::bad_request("File is empty"));
        }
        Ok(())
    }

    fn validate_file(&self, candidate: &UploadCandidate) -> Result<(), error::SystemError> {
        self.check_file_type(&candidate.file_type)?;
        self.check_file_size(candidate.file_size)?;
        candidate.validate()?;
        Ok(())
    }

    /// Validate, write the object, then record it in the ledger.
    ///
    /// A ledger failure removes the object again before the error is
    /// returned, so a failed upload leaves no record and, barring a crash,
    /// no object.
    pub async fn upload(
        &self,
        filename: String,
        file_type: String,
        bytes: Bytes,
    ) -> Result<MediaEntity, error::SystemError> {
        let candidate =
            UploadCandidate { filename, file_type, file_size: bytes.len() as i64 };
        self.validate_file(&candidate)?;

        let uploaded_at = self.clock.now();
        let key = storage_key(&uploaded_at, &candidate.filename);

        let storage_url = self.storage.put(&key, bytes, &candidate.file_type).await?;

        let new_media = NewMedia {
            id: Uuid::now_v7(),
            filename: candidate.filename,
            file_type: candidate.file_type,
            file_size: candidate.file_size,
            storage_key: key,
            storage_url: Some(storage_url),
            uploaded_at,
        };

        match self.media_repo.create(&new_media).await {
            Ok(media) => {
                log::info!("Media {} stored at {}", media.id, media.storage_key);
                Ok(media)
            }
            Err(e) => {
                if let Err(cleanup) = self.storage.delete(&new_media.storage_key).await {
                    log::error!(
                        "Orphaned object {} after failed insert: {}",
                        new_media.storage_key,
                        cleanup
                    );
                }
                Err(e)
            }
        }
    }

    pub async fn list(&self) -> Result<Vec<MediaEntity>, error::SystemError> {
        self.media_repo.find_recent(LIST_LIMIT).await
    }

    pub async fn get(&self, id: &Uuid) -> Result<MediaEntity, error::SystemError> {
        self.media_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Media not found"))
    }

    /// Lookup, object removal, then soft delete. The row is left untouched
    /// when the lookup misses or the object store refuses the delete.
    pub async fn delete(&self, id: &Uuid) -> Result<(), error::SystemError> {
        let media = self.get(id).await?;

        self.storage.delete(&media.storage_key).await?;

        if !self.media_repo.soft_delete(id).await? {
            return Err(error::SystemError::not_found("Media not found or already deleted"));
        }

        log::info!("Media {} deleted ({})", id, media.storage_key);
        Ok(())
    }

    pub async fn stats(&self) -> Result<MediaStats, error::SystemError> {
        self.media_repo.stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{InMemoryMediaRepository, MemoryStorage};

    fn service() -> (MediaService<InMemoryMediaRepository>, Arc<InMemoryMediaRepository>, Arc<MemoryStorage>)
    {
        let repo = Arc::new(InMemoryMediaRepository::default());
        let storage = Arc::new(MemoryStorage::default());
        let service = MediaService::with_defaults(repo.clone(), storage.clone());
        (service, repo, storage)
    }

    #[actix_web::test]
    async fn test_upload_stores_object_and_record() {
        let (service, repo, storage) = service();

        let media = service
            .upload("a b?.jpg".into(), "image/jpeg".into(), Bytes::from_static(b"0123456789"))
            .await
            .unwrap();

        assert_eq!(media.filename, "a b?.jpg");
        assert_eq!(media.file_type, "image/jpeg");
        assert_eq!(media.file_size, 10);
        assert!(media.deleted_at.is_none());
        assert_eq!(media.storage_url.as_deref(), Some(format!("memory://{}", media.storage_key).as_str()));

        let name = media.storage_key.strip_prefix("media/").unwrap();
        assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-'));
        assert!(!name.chars().any(char::is_whitespace));
        assert!(name.ends_with("-ab.jpg"));

        assert!(storage.contains(&media.storage_key));
        assert_eq!(repo.rows().len(), 1);
    }

    #[actix_web::test]
    async fn test_disallowed_type_creates_nothing() {
        let (service, repo, storage) = service();

        for file_type in ["application/pdf", "image/webp", "text/plain", ""] {
            let result =
                service.upload("a.bin".into(), file_type.into(), Bytes::from_static(b"x")).await;
            assert!(matches!(result, Err(error::SystemError::BadRequest(_))));
        }

        assert!(repo.rows().is_empty());
        assert_eq!(storage.len(), 0);
    }

    #[actix_web::test]
    async fn test_oversize_creates_nothing() {
        let repo = Arc::new(InMemoryMediaRepository::default());
        let storage = Arc::new(MemoryStorage::default());
        let config = UploadConfig { max_file_size: 8, ..UploadConfig::default() };
        let service = MediaService::new(repo.clone(), storage.clone(), config);

        let result =
            service.upload("big.png".into(), "image/png".into(), Bytes::from_static(b"123456789")).await;
        assert!(matches!(result, Err(error::SystemError::BadRequest(_))));

        let result =
            service.upload("ok.png".into(), "image/png".into(), Bytes::from_static(b"12345678")).await;
        assert!(result.is_ok());

        assert_eq!(repo.rows().len(), 1);
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_default_limit_is_100_mib() {
        let (service, _, _) = service();
        assert!(service.check_file_size(100 * 1024 * 1024).is_ok());
        assert!(service.check_file_size(100 * 1024 * 1024 + 1).is_err());
        assert!(service.check_file_size(0).is_err());
    }

    #[actix_web::test]
    async fn test_overlong_filename_rejected() {
        let (service, repo, _) = service();
        let filename = format!("{}.jpg", "x".repeat(300));
        let result = service.upload(filename, "image/jpeg".into(), Bytes::from_static(b"x")).await;
        assert!(matches!(result, Err(error::SystemError::BadRequest(_))));
        assert!(repo.rows().is_empty());
    }

    #[actix_web::test]
    async fn test_storage_failure_creates_no_record() {
        let (service, repo, storage) = service();
        storage.fail_puts(true);

        let result =
            service.upload("a.gif".into(), "image/gif".into(), Bytes::from_static(b"GIF89a")).await;
        assert!(matches!(result, Err(error::SystemError::StorageError(_))));
        assert!(repo.rows().is_empty());
    }

    #[actix_web::test]
    async fn test_ledger_failure_removes_object() {
        let (service, repo, storage) = service();
        repo.fail_inserts(true);

        let result =
            service.upload("a.mp4".into(), "video/mp4".into(), Bytes::from_static(b"....")).await;
        assert!(result.is_err());
        assert_eq!(storage.len(), 0);
    }

    #[actix_web::test]
    async fn test_same_name_uploads_get_distinct_keys() {
        let (service, _, storage) = service();

        let first =
            service.upload("a.png".into(), "image/png".into(), Bytes::from_static(b"1")).await.unwrap();
        let second =
            service.upload("a.png".into(), "image/png".into(), Bytes::from_static(b"2")).await.unwrap();

        assert_ne!(first.storage_key, second.storage_key);
        assert_eq!(storage.len(), 2);
    }

    #[actix_web::test]
    async fn test_upload_then_list_returns_newest_first() {
        let (service, _, _) = service();

        service.upload("old.png".into(), "image/png".into(), Bytes::from_static(b"1")).await.unwrap();
        let newest = service
            .upload("new.webm".into(), "video/webm".into(), Bytes::from_static(b"123"))
            .await
            .unwrap();

        let listed = service.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, newest.id);
        assert_eq!(listed[0].filename, "new.webm");
        assert_eq!(listed[0].file_type, "video/webm");
        assert_eq!(listed[0].file_size, 3);
    }

    #[actix_web::test]
    async fn test_list_is_capped() {
        let (service, _, _) = service();
        for i in 0..(LIST_LIMIT + 5) {
            service
                .upload(format!("{i}.png"), "image/png".into(), Bytes::from_static(b"1"))
                .await
                .unwrap();
        }
        assert_eq!(service.list().await.unwrap().len() as i64, LIST_LIMIT);
    }

    #[actix_web::test]
    async fn test_delete_removes_object_and_soft_deletes() {
        let (service, repo, storage) = service();
        let media =
            service.upload("a.jpg".into(), "image/jpeg".into(), Bytes::from_static(b"1")).await.unwrap();

        service.delete(&media.id).await.unwrap();

        assert!(!storage.contains(&media.storage_key));
        let rows = repo.rows();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].deleted_at.is_some());
        assert!(service.list().await.unwrap().is_empty());
        assert!(matches!(service.get(&media.id).await, Err(error::SystemError::NotFound(_))));
    }

    #[actix_web::test]
    async fn test_delete_unknown_id_leaves_ledger_unchanged() {
        let (service, repo, _) = service();
        service.upload("a.jpg".into(), "image/jpeg".into(), Bytes::from_static(b"1")).await.unwrap();
        let before = repo.rows();

        let result = service.delete(&Uuid::now_v7()).await;

        assert!(matches!(result, Err(error::SystemError::NotFound(_))));
        assert_eq!(repo.rows(), before);
    }

    #[actix_web::test]
    async fn test_delete_twice_is_not_found() {
        let (service, _, _) = service();
        let media =
            service.upload("a.jpg".into(), "image/jpeg".into(), Bytes::from_static(b"1")).await.unwrap();

        service.delete(&media.id).await.unwrap();
        assert!(matches!(service.delete(&media.id).await, Err(error::SystemError::NotFound(_))));
    }

    #[actix_web::test]
    async fn test_store_delete_failure_keeps_record() {
        let (service, repo, storage) = service();
        let media =
            service.upload("a.jpg".into(), "image/jpeg".into(), Bytes::from_static(b"1")).await.unwrap();
        storage.fail_deletes(true);

        let result = service.delete(&media.id).await;

        assert!(matches!(result, Err(error::SystemError::StorageError(_))));
        assert!(repo.rows()[0].deleted_at.is_none());
        assert!(storage.contains(&media.storage_key));
    }

    #[actix_web::test]
    async fn test_stats_count_live_media() {
        let (service, _, _) = service();
        let a = service.upload("a.jpg".into(), "image/jpeg".into(), Bytes::from_static(b"12")).await.unwrap();
        service.upload("b.jpg".into(), "image/jpeg".into(), Bytes::from_static(b"123")).await.unwrap();
        service.delete(&a.id).await.unwrap();

        let stats = service.stats().await.unwrap();
        assert_eq!(stats, MediaStats { total_media: 1, storage_used_bytes: 3 });
    }
}
