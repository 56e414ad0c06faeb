use uuid::Uuid;
use validator::Validate;

use crate::constants::{ALLOWED_MIME_TYPES, MAX_FILE_SIZE};

/// What the ingress learned about an incoming file before it is stored.
#[derive(Debug, Validate)]
pub struct UploadCandidate {
    #[validate(length(min = 1, max = 255, message = "Filename must be 1 to 255 characters long"))]
    pub filename: String,
    pub file_type: String,
    pub file_size: i64,
}

/// Ledger row to insert after the object write succeeded.
#[derive(Debug, Clone)]
pub struct NewMedia {
    pub id: Uuid,
    pub filename: String,
    pub file_type: String,
    pub file_size: i64,
    pub storage_key: String,
    pub storage_url: Option<String>,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

/// Upload ingress limits
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_file_size: i64,
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
            allowed_mime_types: ALLOWED_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    pub scanned_objects: usize,
    pub orphans_removed: Vec<String>,
    /// Live rows whose object is missing from the store.
    pub dangling: Vec<String>,
}
