use std::borrow::Cow;
use std::time::Duration;

use crate::api::error::SystemError;

/// MIME types accepted by the upload ingress.
pub const ALLOWED_MIME_TYPES: [&str; 5] =
    ["image/jpeg", "image/png", "image/gif", "video/mp4", "video/webm"];

/// 100 MiB
pub const MAX_FILE_SIZE: i64 = 100 * 1024 * 1024;

/// Maximum number of records returned by a listing.
pub const LIST_LIMIT: i64 = 100;

/// Every object this service writes lives under this prefix.
pub const MEDIA_PREFIX: &str = "media/";

#[derive(Debug, Clone, PartialEq)]
pub enum StorageSettings {
    S3 { bucket: String, region: String, endpoint: Option<String> },
    Local { dir: String, base_url: String },
}

#[derive(Debug, Clone)]
pub struct Env {
    pub database_url: String,
    pub db_max_connections: u32,
    pub frontend_url: String,
    pub ip: String,
    pub port: u16,
    pub storage: StorageSettings,
    pub reconcile_interval: Option<Duration>,
    pub reconcile_grace: Duration,
}

impl Env {
    pub fn load() -> Result<Self, SystemError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the environment from any key lookup, which keeps parsing
    /// independent of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SystemError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = match var("DATABASE_URL") {
            Some(url) => url,
            None => Self::database_url_from_parts(&var)?,
        };

        let db_max_connections = parse_or(&var, "DB_MAX_CONNECTIONS", 5u32)?;
        let frontend_url =
            var("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".to_string());
        let ip = var("IP").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_or(&var, "PORT", 8080u16)?;

        let storage = match var("STORAGE_BACKEND").as_deref().unwrap_or("s3") {
            "s3" => {
                let bucket = var("AWS_S3_BUCKET_NAME").ok_or_else(|| {
                    SystemError::config("AWS_S3_BUCKET_NAME must be set for the s3 backend")
                })?;
                if var("AWS_ACCESS_KEY_ID").is_none() {
                    return Err(SystemError::config(
                        "AWS_ACCESS_KEY_ID must be set for the s3 backend",
                    ));
                }
                StorageSettings::S3 {
                    bucket,
                    region: var("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                    endpoint: var("S3_ENDPOINT"),
                }
            }
            "local" => StorageSettings::Local {
                dir: var("LOCAL_STORAGE_DIR").unwrap_or_else(|| "./uploads".to_string()),
                base_url: var("LOCAL_STORAGE_BASE_URL").unwrap_or_else(|| "/uploads".to_string()),
            },
            other => {
                return Err(SystemError::config(format!(
                    "STORAGE_BACKEND must be 's3' or 'local', got '{other}'"
                )))
            }
        };

        let reconcile_interval = match parse_or(&var, "RECONCILE_INTERVAL_SECS", 3600u64)? {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        let reconcile_grace = Duration::from_secs(parse_or(&var, "RECONCILE_GRACE_SECS", 600u64)?);

        Ok(Env {
            database_url,
            db_max_connections,
            frontend_url,
            ip,
            port,
            storage,
            reconcile_interval,
            reconcile_grace,
        })
    }

    fn database_url_from_parts<F>(var: &F) -> Result<String, SystemError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            var(key).ok_or_else(|| {
                SystemError::config(format!("DATABASE_URL or {key} must be set"))
            })
        };

        let host = required("DB_HOST")?;
        let user = required("DB_USER")?;
        let name = required("DB_NAME")?;
        let port = var("DB_PORT").unwrap_or_else(|| "5432".to_string());

        Ok(match var("DB_PASSWORD") {
            Some(password) => format!("postgres://{user}:{password}@{host}:{port}/{name}"),
            None => format!("postgres://{user}@{host}:{port}/{name}"),
        })
    }
}

fn parse_or<F, T>(var: &F, key: &str, default: T) -> Result<T, SystemError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match var(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|_| {
            SystemError::Config(Cow::Owned(format!("{key} has an invalid value '{raw}'")))
        }),
        None => Ok(default),
    }
}
