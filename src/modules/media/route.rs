use actix_web::web;

use crate::api::error;
use crate::modules::media::handle::*;
use crate::modules::media::repository::MediaRepository;

const MEDIA_ID: &str = "/media/{id:[0-9a-fA-F-]{36}}";

pub fn configure<R>(cfg: &mut web::ServiceConfig)
where
    R: MediaRepository + Send + Sync + 'static,
{
    // ids that fit the route pattern but are not UUIDs
    cfg.app_data(
        web::PathConfig::default()
            .error_handler(|_, _| error::Error::not_found("Media not found").into()),
    );

    cfg.service(web::resource("/media").route(web::get().to(list_media::<R>)))
        .service(web::resource("/media/stats").route(web::get().to(media_stats::<R>)))
        .service(
            web::resource(MEDIA_ID)
                .route(web::get().to(get_media::<R>))
                .route(web::delete().to(delete_media::<R>)),
        )
        .service(web::resource("/upload").route(web::post().to(upload_media::<R>)));
}

/// Public read access to objects written by the local backend.
pub fn configure_local_files<R>(cfg: &mut web::ServiceConfig)
where
    R: MediaRepository + Send + Sync + 'static,
{
    cfg.service(web::resource("/uploads/{key:.+}").route(web::get().to(serve_object::<R>)));
}
