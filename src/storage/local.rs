use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{ObjectStoreGateway, StorageBackend, StorageError, StorageResult, StoredObject};

/// Filesystem backend. Objects live under `base_path/{key}` and are served by
/// the application at `base_url/{key}`.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path, base_url })
    }

    /// Only plain relative segments are accepted, so a key can never leave
    /// `base_path`.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
        }

        let relative = Path::new(key);
        if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(StorageError::InvalidKey(format!("{key} escapes the storage directory")));
        }

        Ok(self.base_path.join(relative))
    }

    fn path_to_key(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.base_path).ok()?;
        let segments: Option<Vec<&str>> =
            relative.components().map(|c| c.as_os_str().to_str()).collect();
        segments.map(|s| s.join("/"))
    }
}

#[async_trait]
impl ObjectStoreGateway for LocalStorage {
    async fn put(&self, key: &str, data: Bytes, _content_type: &str) -> StorageResult<String> {
        let path = self.key_to_path(key)?;
        let size = data.len();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        }

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;
        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;
        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(path = %path.display(), key = %key, size_bytes = size, "Local upload successful");

        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(key = %key, "Local delete successful");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(key = %key, "Local delete of absent object");
                Ok(())
            }
            Err(e) => Err(StorageError::DeleteFailed(format!("{}: {}", path.display(), e))),
        }
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let path = self.key_to_path(key)?;

        // a directory is never an object
        if fs::metadata(&path).await.is_ok_and(|meta| meta.is_dir()) {
            return Err(StorageError::NotFound(key.to_string()));
        }

        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(StorageError::DownloadFailed(format!("{}: {}", path.display(), e))),
        }
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<StoredObject>> {
        let root = self.key_to_path(prefix.trim_end_matches('/'))?;
        let mut objects = Vec::new();
        let mut pending = vec![root];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StorageError::ListFailed(e.to_string())),
            };

            while let Some(entry) =
                entries.next_entry().await.map_err(|e| StorageError::ListFailed(e.to_string()))?
            {
                let metadata =
                    entry.metadata().await.map_err(|e| StorageError::ListFailed(e.to_string()))?;
                let path = entry.path();

                if metadata.is_dir() {
                    pending.push(path);
                    continue;
                }

                let Some(key) = self.path_to_key(&path) else {
                    continue;
                };
                let last_modified = metadata
                    .modified()
                    .map(DateTime::<Utc>::from)
                    .map_err(|e| StorageError::ListFailed(e.to_string()))?;

                objects.push(StoredObject { key, size: metadata.len(), last_modified });
            }
        }

        Ok(objects)
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
