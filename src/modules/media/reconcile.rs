//! Periodic sweep that repairs divergence between the object store and the
//! ledger.
//!
//! Upload writes the object before the row and delete removes the object
//! before soft-deleting the row, so a crash between the two steps leaves
//! either an object nobody references or a live row pointing at nothing.
//! Unreferenced objects older than the grace period are removed; rows without
//! an object are only reported.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::api::error;
use crate::constants::MEDIA_PREFIX;
use crate::modules::media::{model::ReconcileReport, repository::MediaRepository};
use crate::storage::ObjectStoreGateway;

pub struct Reconciler<R>
where
    R: MediaRepository + Send + Sync,
{
    media_repo: Arc<R>,
    storage: Arc<dyn ObjectStoreGateway>,
    grace: Duration,
}

impl<R> Reconciler<R>
where
    R: MediaRepository + Send + Sync + 'static,
{
    pub fn new(media_repo: Arc<R>, storage: Arc<dyn ObjectStoreGateway>, grace: Duration) -> Self {
        Self { media_repo, storage, grace }
    }

    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<ReconcileReport, error::SystemError> {
        // objects first: an upload racing this pass is at worst a young orphan
        let objects = self.storage.list(MEDIA_PREFIX).await?;
        let live_keys: HashSet<String> =
            self.media_repo.live_storage_keys().await?.into_iter().collect();

        let grace = chrono::Duration::from_std(self.grace)
            .map_err(|e| error::SystemError::InternalError(Box::new(e)))?;
        let cutoff = now - grace;

        let mut report = ReconcileReport { scanned_objects: objects.len(), ..Default::default() };
        let mut present = HashSet::with_capacity(objects.len());

        for object in objects {
            if live_keys.contains(&object.key) {
                present.insert(object.key);
                continue;
            }
            if object.last_modified > cutoff {
                continue;
            }
            match self.storage.delete(&object.key).await {
                Ok(()) => {
                    log::warn!("Removed orphaned object {} ({} bytes)", object.key, object.size);
                    report.orphans_removed.push(object.key);
                }
                Err(e) => log::error!("Failed to remove orphaned object {}: {}", object.key, e),
            }
        }

        report.dangling = live_keys.into_iter().filter(|key| !present.contains(key)).collect();
        report.dangling.sort();
        for key in &report.dangling {
            log::warn!("Ledger row references missing object {}", key);
        }

        Ok(report)
    }

    /// Runs [`Self::sweep`] every `every` on the current actix runtime.
    pub fn start(self: Arc<Self>, every: Duration) -> actix_web::rt::task::JoinHandle<()> {
        actix_web::rt::spawn(async move {
            let mut interval = actix_web::rt::time::interval(every);

            loop {
                interval.tick().await;

                match self.sweep(Utc::now()).await {
                    Ok(report) => log::info!(
                        "Reconciliation scanned {} objects, removed {} orphans, found {} dangling rows",
                        report.scanned_objects,
                        report.orphans_removed.len(),
                        report.dangling.len()
                    ),
                    Err(e) => log::error!("Reconciliation failed: {:?}", e),
                }
            }
        })
    }
}
