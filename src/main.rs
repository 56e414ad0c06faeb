use actix_cors::Cors;
use actix_web::{self, http::header, middleware::Logger, web, App, HttpServer};
use std::sync::Arc;

use crate::{
    configs::{connect_database, connect_storage},
    modules::media::{
        handle::not_found, reconcile::Reconciler, repository_pg::MediaPgRepository, route,
        service::MediaService,
    },
    storage::StorageBackend,
};

mod api;
mod configs;
mod constants;
mod modules;
mod storage;
#[cfg(test)]
mod test;
mod utils;

#[actix_web::get("/")]
async fn health_check() -> &'static str {
    "Server is running"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let env = constants::Env::load().map_err(|e| {
        log::error!("{e}");
        std::io::Error::other("Configuration error")
    })?;

    let db_pool = connect_database(&env).await.map_err(|e| {
        log::error!("{e}");
        std::io::Error::other("Database connection error")
    })?;

    let storage = connect_storage(&env.storage).await.map_err(|e| {
        log::error!("{e}");
        std::io::Error::other("Storage initialization error")
    })?;
    let serve_local_files = storage.backend() == StorageBackend::Local;

    let media_repo = Arc::new(MediaPgRepository::new(db_pool));
    let media_service = web::Data::new(MediaService::with_defaults(media_repo.clone(), storage.clone()));

    if let Some(every) = env.reconcile_interval {
        log::info!("Reconciliation every {:?} (grace {:?})", every, env.reconcile_grace);
        Arc::new(Reconciler::new(media_repo, storage, env.reconcile_grace)).start(every);
    }

    let frontend_url = env.frontend_url.clone();

    log::info!("Starting server at http://{}:{}", env.ip, env.port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_url)
            .allowed_methods(vec!["GET", "POST", "DELETE"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
            .max_age(3600);

        let mut app = App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(media_service.clone())
            .service(health_check)
            .service(web::scope("/api").configure(route::configure::<MediaPgRepository>));

        if serve_local_files {
            app = app.configure(route::configure_local_files::<MediaPgRepository>);
        }

        app.default_service(web::to(not_found))
    })
    .bind((env.ip.as_str(), env.port))?
    .workers(2)
    .run()
    .await
}
