use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// One row of the `media_files` ledger.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct MediaEntity {
    pub id: Uuid,
    pub filename: String,
    pub file_type: String,
    pub file_size: i64,
    pub storage_key: String,
    pub storage_url: Option<String>,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Aggregates over live media.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct MediaStats {
    pub total_media: i64,
    pub storage_used_bytes: i64,
}
