use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use dotenvy::dotenv;
use std::sync::Arc;

mod api;
mod attendance;
mod auth;
mod badges;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod qr;
mod routes;
mod store;
mod swap;
mod utils;

use attendance::{AttendancePolicy, CheckinService};
use badges::DbBadgeHook;
use config::Config;
use db::init_db;
use qr::token::QrSigner;
use store::MySqlStore;
use swap::marketplace::Marketplace;

use crate::docs::ApiDoc;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    let config = Config::from_env();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await;
    let store = MySqlStore::new(pool.clone());
    let signer = QrSigner::new(&config.qr_secret);

    let checkin = Data::new(CheckinService::new(
        store.clone(),
        signer.clone(),
        AttendancePolicy::from(&config),
        Arc::new(DbBadgeHook::new(pool)),
    ));
    let marketplace = Data::new(Marketplace::new(store));
    let signer = Data::new(signer);
    let config_data = Data::new(config.clone());

    let server_addr = config.server_addr.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(config_data.clone())
            .app_data(checkin.clone())
            .app_data(marketplace.clone())
            .app_data(signer.clone())
            // Public scan + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
