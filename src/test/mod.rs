//! In-memory doubles for the ledger and the object store.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use crate::api::error::SystemError;
use crate::modules::media::{
    model::NewMedia,
    repository::MediaRepository,
    schema::{MediaEntity, MediaStats},
};
use crate::storage::{
    ObjectStoreGateway, StorageBackend, StorageError, StorageResult, StoredObject,
};

#[derive(Default)]
pub struct InMemoryMediaRepository {
    rows: Mutex<Vec<MediaEntity>>,
    fail_inserts: AtomicBool,
}

impl InMemoryMediaRepository {
    pub fn rows(&self) -> Vec<MediaEntity> {
        self.rows.lock().unwrap().clone()
    }

    pub fn insert_row(&self, row: MediaEntity) {
        self.rows.lock().unwrap().push(row);
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MediaRepository for InMemoryMediaRepository {
    async fn create(&self, media: &NewMedia) -> Result<MediaEntity, SystemError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(SystemError::DatabaseError("connection refused".into()));
        }

        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|r| r.storage_key == media.storage_key) {
            return Err(SystemError::DatabaseError("duplicate storage_key".into()));
        }

        let entity = MediaEntity {
            id: media.id,
            filename: media.filename.clone(),
            file_type: media.file_type.clone(),
            file_size: media.file_size,
            storage_key: media.storage_key.clone(),
            storage_url: media.storage_url.clone(),
            uploaded_at: media.uploaded_at,
            deleted_at: None,
        };
        rows.push(entity.clone());
        Ok(entity)
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<MediaEntity>, SystemError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|r| r.id == *id && r.deleted_at.is_none()).cloned())
    }

    async fn find_recent(&self, limit: i64) -> Result<Vec<MediaEntity>, SystemError> {
        let mut live: Vec<MediaEntity> =
            self.rows.lock().unwrap().iter().filter(|r| r.deleted_at.is_none()).cloned().collect();
        live.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then_with(|| b.id.cmp(&a.id)));
        live.truncate(limit.max(0) as usize);
        Ok(live)
    }

    async fn soft_delete(&self, id: &Uuid) -> Result<bool, SystemError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|r| r.id == *id && r.deleted_at.is_none()) {
            Some(row) => {
                row.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn live_storage_keys(&self) -> Result<Vec<String>, SystemError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().filter(|r| r.deleted_at.is_none()).map(|r| r.storage_key.clone()).collect())
    }

    async fn stats(&self) -> Result<MediaStats, SystemError> {
        let rows = self.rows.lock().unwrap();
        let live = rows.iter().filter(|r| r.deleted_at.is_none());
        Ok(MediaStats {
            total_media: live.clone().count() as i64,
            storage_used_bytes: live.map(|r| r.file_size).sum(),
        })
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, (Bytes, DateTime<Utc>)>>,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryStorage {
    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn insert_object(&self, key: &str, data: &'static [u8], last_modified: DateTime<Utc>) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (Bytes::from_static(data), last_modified));
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStoreGateway for MemoryStorage {
    async fn put(&self, key: &str, data: Bytes, _content_type: &str) -> StorageResult<String> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed("bucket unreachable".into()));
        }
        self.objects.lock().unwrap().insert(key.to_string(), (data, Utc::now()));
        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::DeleteFailed("bucket unreachable".into()));
        }
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(data, _)| data.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<StoredObject>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, (data, last_modified))| StoredObject {
                key: key.clone(),
                size: data.len() as u64,
                last_modified: *last_modified,
            })
            .collect())
    }

    fn public_url(&self, key: &str) -> String {
        format!("memory://{key}")
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
