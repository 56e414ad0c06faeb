use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse};
use bytes::BytesMut;
use futures_util::TryStreamExt;
use uuid::Uuid;

use crate::api::success::{Acknowledged, Success};
use crate::api::{error, success};
use crate::modules::media::{
    repository::MediaRepository,
    schema::{MediaEntity, MediaStats},
    service::MediaService,
};

const FILE_FIELD: &str = "file";

/// List live media, newest first
pub async fn list_media<R>(
    service: web::Data<MediaService<R>>,
) -> Result<success::Success<Vec<MediaEntity>>, error::Error>
where
    R: MediaRepository + Send + Sync + 'static,
{
    let media = service.list().await?;
    Ok(Success::ok(media))
}

pub async fn get_media<R>(
    media_id: web::Path<Uuid>,
    service: web::Data<MediaService<R>>,
) -> Result<success::Success<MediaEntity>, error::Error>
where
    R: MediaRepository + Send + Sync + 'static,
{
    let media = service.get(&media_id.into_inner()).await?;
    Ok(Success::ok(media))
}

pub async fn media_stats<R>(
    service: web::Data<MediaService<R>>,
) -> Result<success::Success<MediaStats>, error::Error>
where
    R: MediaRepository + Send + Sync + 'static,
{
    let stats = service.stats().await?;
    Ok(Success::ok(stats))
}

/// Upload the multipart part named `file`
pub async fn upload_media<R>(
    mut payload: Multipart,
    service: web::Data<MediaService<R>>,
) -> Result<success::Success<MediaEntity>, error::Error>
where
    R: MediaRepository + Send + Sync + 'static,
{
    while let Some(mut field) = payload.try_next().await.map_err(malformed)? {
        if field.name() != Some(FILE_FIELD) {
            // drain parts we do not care about
            while field.try_next().await.map_err(malformed)?.is_some() {}
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| error::Error::bad_request("No file provided"))?
            .to_string();

        let file_type = match field.content_type() {
            Some(mime) => mime.essence_str().to_string(),
            None => mime_guess::from_path(&filename).first_or_octet_stream().essence_str().to_string(),
        };

        service.check_file_type(&file_type)?;
        let bytes = read_limited(&mut field, service.config().max_file_size).await?;

        let media = service.upload(filename, file_type, bytes.freeze()).await?;
        return Ok(Success::ok(media));
    }

    Err(error::Error::bad_request("No file provided"))
}

/// Collects the field, giving up as soon as it grows past `limit`.
async fn read_limited(field: &mut Field, limit: i64) -> Result<BytesMut, error::Error> {
    let mut bytes = BytesMut::new();
    while let Some(chunk) = field.try_next().await.map_err(malformed)? {
        if (bytes.len() + chunk.len()) as i64 > limit {
            return Err(error::Error::bad_request(format!(
                "File size exceeds maximum allowed size of {limit} bytes"
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

fn malformed(e: actix_multipart::MultipartError) -> error::Error {
    error::Error::bad_request(format!("Malformed multipart body: {e}"))
}

pub async fn delete_media<R>(
    media_id: web::Path<Uuid>,
    service: web::Data<MediaService<R>>,
) -> Result<success::Success<Acknowledged>, error::Error>
where
    R: MediaRepository + Send + Sync + 'static,
{
    service.delete(&media_id.into_inner()).await?;
    Ok(Success::ok(Acknowledged::yes()))
}

/// Serves objects of the local backend.
pub async fn serve_object<R>(
    key: web::Path<String>,
    service: web::Data<MediaService<R>>,
) -> Result<HttpResponse, error::Error>
where
    R: MediaRepository + Send + Sync + 'static,
{
    let key = key.into_inner();
    let data = service.storage().get(&key).await.map_err(error::SystemError::from)?;
    let content_type = mime_guess::from_path(&key).first_or_octet_stream();

    Ok(HttpResponse::Ok().content_type(content_type.essence_str()).body(data))
}

pub async fn not_found() -> Result<HttpResponse, error::Error> {
    Err(error::Error::not_found("Route not found"))
}
