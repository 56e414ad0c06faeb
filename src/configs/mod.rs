use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;

use crate::{
    api::error,
    constants::{Env, StorageSettings},
    storage::{LocalStorage, ObjectStoreGateway, S3Storage},
};

pub async fn connect_database(env: &Env) -> Result<PgPool, error::SystemError> {
    let pool = PgPoolOptions::new()
        .max_connections(env.db_max_connections)
        .min_connections(1)
        .acquire_slow_threshold(std::time::Duration::from_secs(3))
        .connect(&env.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    log::info!("Database migrations applied");

    Ok(pool)
}

/// Builds the single storage backend used for the lifetime of the process.
pub async fn connect_storage(
    settings: &StorageSettings,
) -> Result<Arc<dyn ObjectStoreGateway>, error::SystemError> {
    let storage: Arc<dyn ObjectStoreGateway> = match settings {
        StorageSettings::S3 { bucket, region, endpoint } => {
            log::info!("Using S3 storage (bucket {bucket}, region {region})");
            Arc::new(S3Storage::new(bucket.clone(), region.clone(), endpoint.clone())?)
        }
        StorageSettings::Local { dir, base_url } => {
            log::info!("Using local storage under {dir}");
            Arc::new(LocalStorage::new(dir, base_url.clone()).await?)
        }
    };
    Ok(storage)
}
