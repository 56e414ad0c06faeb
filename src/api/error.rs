use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::borrow::Cow;

use crate::storage::StorageError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Bad Request: {0}")]
    BadRequest(Cow<'static, str>),
    #[error("Not Found: {0}")]
    NotFound(Cow<'static, str>),
    #[error("Internal Server Error")]
    InternalServer(Cow<'static, str>),
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct ErrorBody {
    pub error: Cow<'static, str>,
}

impl Error {
    pub fn bad_request(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match *self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InternalServer(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            Error::BadRequest(msg) | Error::NotFound(msg) | Error::InternalServer(msg) => {
                msg.clone()
            }
        };
        HttpResponse::build(self.status_code()).json(ErrorBody { error: message })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SystemError {
    // sqlx errors
    #[error("Database Error : {0}")]
    DatabaseError(Cow<'static, str>),
    #[error("Migration Error")]
    MigrateError(#[from] sqlx::migrate::MigrateError),
    // object store errors
    #[error("Storage Error : {0}")]
    StorageError(#[from] StorageError),
    #[error("Configuration Error: {0}")]
    Config(Cow<'static, str>),
    // Custom Errors
    #[error("Bad Request: {0}")]
    BadRequest(Cow<'static, str>),
    #[error("Not Found: {0}")]
    NotFound(Cow<'static, str>),
    #[error("Internal System Error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl From<SystemError> for Error {
    fn from(value: SystemError) -> Self {
        match value {
            SystemError::BadRequest(msg) => Error::BadRequest(msg),
            SystemError::NotFound(msg) => Error::NotFound(msg),
            SystemError::StorageError(StorageError::NotFound(key))
            | SystemError::StorageError(StorageError::InvalidKey(key)) => {
                Error::NotFound(format!("Object {key} not found").into())
            }
            SystemError::StorageError(ref err) => {
                log::error!("Storage error: {:?}", err);
                Error::InternalServer("Storage operation failed".into())
            }
            _ => {
                log::error!("Internal Server Error: {:?}", value);
                Error::InternalServer("Internal Server Error".into())
            }
        }
    }
}

impl From<sqlx::Error> for SystemError {
    fn from(err: sqlx::Error) -> Self {
        log::error!("{:?}", err);
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                log::error!(
                    "Unique constraint violated: {}",
                    db_err.constraint().unwrap_or("unknown")
                );
            }
            return SystemError::DatabaseError(db_err.message().to_string().into());
        }
        SystemError::InternalError(Box::new(err))
    }
}

impl From<validator::ValidationErrors> for SystemError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .next()
            .unwrap_or_else(|| errors.to_string());
        SystemError::BadRequest(message.into())
    }
}

impl SystemError {
    pub fn bad_request(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn config(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Config(msg.into())
    }
}
