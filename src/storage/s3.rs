use async_trait::async_trait;
use bytes::Bytes;
use futures_util::TryStreamExt;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::{
    Attribute, Attributes, Error as ObjectStoreError, ObjectStoreExt, PutOptions, PutPayload,
};

use super::{ObjectStoreGateway, StorageBackend, StorageError, StorageResult, StoredObject};

/// S3 (or S3-compatible) backend.
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    region: String,
    endpoint: Option<String>,
}

impl S3Storage {
    /// Credentials are picked up from the usual `AWS_*` environment variables.
    /// `endpoint` points at S3-compatible providers such as MinIO.
    pub fn new(bucket: String, region: String, endpoint: Option<String>) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint {
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(endpoint.starts_with("http://"));
        }

        let store = builder.build().map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage { store, bucket, region, endpoint })
    }
}

#[async_trait]
impl ObjectStoreGateway for S3Storage {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<String> {
        let size = data.len();
        let location = Path::from(key);
        let start = std::time::Instant::now();

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let options = PutOptions { attributes, ..Default::default() };

        object_store::ObjectStore::put_opts(
            &self.store,
            &location,
            PutPayload::from(data),
            options,
        )
        .await
        .map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let location = Path::from(key);

        match self.store.delete(&location).await {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {
                tracing::info!(bucket = %self.bucket, key = %key, "S3 delete successful");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, bucket = %self.bucket, key = %key, "S3 delete failed");
                Err(StorageError::DeleteFailed(e.to_string()))
            }
        }
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let location = Path::from(key);

        let result = self.store.get(&location).await.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => StorageError::DownloadFailed(other.to_string()),
        })?;

        result.bytes().await.map_err(|e| StorageError::DownloadFailed(e.to_string()))
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<StoredObject>> {
        let prefix = Path::from(prefix);

        let metas: Vec<_> = object_store::ObjectStore::list(&self.store, Some(&prefix))
            .try_collect()
            .await
            .map_err(|e| StorageError::ListFailed(e.to_string()))?;

        Ok(metas
            .into_iter()
            .map(|meta| StoredObject {
                key: meta.location.to_string(),
                size: meta.size as u64,
                last_modified: meta.last_modified,
            })
            .collect())
    }

    fn public_url(&self, key: &str) -> String {
        match self.endpoint {
            // path-style for S3-compatible providers
            Some(ref endpoint) => {
                format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key)
            }
            None => format!("https://{}.s3.{}.amazonaws.com/{}", self.bucket, self.region, key),
        }
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
