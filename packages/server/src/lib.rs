#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web server for the car park dashboard.
//!
//! Serves the JSON views behind the dashboard page under `/api` and the
//! page itself from `app/`. The dataset is loaded before the server starts
//! and shared read-only across workers; every request recomputes its view
//! from it.

mod handlers;
pub mod interactive;

use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use carpark_dashboard_dataset::Dataset;
use carpark_dashboard_dataset::config::DashboardConfig;
use carpark_dashboard_dataset::paths;

/// Shared application state.
pub struct AppState {
    /// Every input file, loaded once.
    pub dataset: Arc<Dataset>,
    /// Calendar, cluster, and map settings the views depend on.
    pub config: Arc<DashboardConfig>,
}

/// Registers the `/api` routes.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/meta", web::get().to(handlers::meta))
            .route("/availability", web::get().to(handlers::availability))
            .route("/weekday/carparks", web::get().to(handlers::weekday_carparks))
            .route("/weekday/trends", web::get().to(handlers::weekday_trends))
            .route("/clusters/trends", web::get().to(handlers::cluster_trends))
            .route("/clusters/map", web::get().to(handlers::cluster_map))
            .route("/towns/compare", web::get().to(handlers::town_compare)),
    );
}

/// Starts the dashboard server on `config.server`.
///
/// This is a regular async function; the caller provides the runtime
/// (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: DashboardConfig, dataset: Dataset) -> std::io::Result<()> {
    let bind_addr = config.server.bind_addr.clone();
    let port = config.server.port;

    let state = web::Data::new(AppState {
        dataset: Arc::new(dataset),
        config: Arc::new(config),
    });

    let app_dir = paths::app_dir();
    log::info!("Serving page from {}", app_dir.display());
    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure_api)
            .service(Files::new("/", &app_dir).index_file("index.html"))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
