//! Object Store Gateway.
//!
//! Every deployment runs exactly one backend, picked at startup from
//! [`crate::constants::StorageSettings`]. Keys are opaque `/`-separated paths
//! such as `media/1700000000000-cat.jpg`.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

pub mod local;
pub mod s3;

pub use local::LocalStorage;
pub use s3::S3Storage;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Listing failed: {0}")]
    ListFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    Local,
}

/// An object as reported by a listing.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

#[async_trait]
pub trait ObjectStoreGateway: Send + Sync {
    /// Writes `data` under `key` and returns the public address of the object.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<String>;

    /// Removes the object. Removing an absent object succeeds.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    async fn list(&self, prefix: &str) -> StorageResult<Vec<StoredObject>>;

    fn public_url(&self, key: &str) -> String;

    fn backend(&self) -> StorageBackend;
}
