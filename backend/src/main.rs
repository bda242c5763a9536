mod config;
mod error;
mod job_controller;
mod remote;
mod services;
mod store;
mod sync;

use crate::config::Config;
use crate::job_controller::state::JobsState;
use crate::remote::auth::OAuthRefresher;
use crate::remote::sheets::SheetsClient;
use crate::store::LocalStore;
use crate::sync::InspectionEngine;
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::{error, info};
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let config = Config::load();
    let host = config.host.clone();
    let port = config.port;

    let local = LocalStore::open(&config.db_path).map_err(|e| {
        error!("Cannot open local store {}: {}", config.db_path, e);
        io::Error::new(io::ErrorKind::Other, e.to_string())
    })?;
    let remote = SheetsClient::new(&config)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    let auth = OAuthRefresher::new(&config);

    // Debounce ticks flow to the save worker
    let (save_tx, save_rx) = mpsc::channel(16);
    let engine = Arc::new(InspectionEngine::new(
        config,
        Arc::new(remote),
        Arc::new(auth),
        local,
        save_tx,
    ));
    tokio::spawn(sync::start_save_worker(engine.clone(), save_rx));

    // Initialize job controller state
    let (tx, rx) = mpsc::channel(100);
    let jobs_state = JobsState::new(tx);
    tokio::spawn(job_controller::state::start_job_updater(
        jobs_state.clone(),
        rx,
    ));

    engine.resume_pending().await;

    info!("Server running at http://{}:{}", host, port);

    let data = web::Data::from(engine.clone());
    let served = HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(10 * 1024 * 1024)) // 10 MB
            .app_data(data.clone())
            .app_data(web::Data::new(jobs_state.clone()))
            .service(services::auth::configure_routes())
            .service(services::files::configure_routes())
            .service(services::session::configure_routes())
            .service(services::master::configure_routes())
            .service(services::trade_logs::configure_routes())
            .service(services::jobs::configure_routes())
    })
    .bind((host.as_str(), port))?
    .run()
    .await;

    engine.flush_local().await;
    served
}
