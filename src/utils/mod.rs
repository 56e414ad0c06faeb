use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

use crate::constants::MEDIA_PREFIX;

/// Keeps only `[A-Za-z0-9.-]` from a client-supplied filename.
pub fn sanitize_filename(filename: &str) -> String {
    filename.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-').collect()
}

/// `media/{unixMillis}-{sanitizedFilename}`
pub fn storage_key(uploaded_at: &DateTime<Utc>, filename: &str) -> String {
    let sanitized = sanitize_filename(filename);
    let name = if sanitized.is_empty() { "upload" } else { sanitized.as_str() };
    format!("{}{}-{}", MEDIA_PREFIX, uploaded_at.timestamp_millis(), name)
}

/// Millisecond wall clock that never hands out the same instant twice, so
/// two uploads of the same filename cannot derive the same storage key.
#[derive(Debug, Default)]
pub struct MillisClock {
    last: AtomicI64,
}

impl MillisClock {
    pub fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now().timestamp_millis();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let next = wall.max(last + 1);
            match self.last.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return DateTime::from_timestamp_millis(next).unwrap_or_else(Utc::now),
                Err(actual) => last = actual,
            }
        }
    }
}
