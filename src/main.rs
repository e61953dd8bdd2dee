mod api;
mod config;
mod error;
mod geo;
mod lifecycle;
mod models;
mod notify;
mod observability;
mod state;
mod store;
mod tracking;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::notify::channel::LogChannel;
use crate::state::TrackerSettings;
use crate::store::JsonStore;

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    let config = config::Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let settings = TrackerSettings {
        tracking_base_url: config.tracking_base_url.clone(),
        average_speed_kmh: config.average_speed_kmh,
        strict_statuses: config.strict_statuses,
    };
    let store = JsonStore::new(config.data_dir.clone());
    let channel = Arc::new(LogChannel);

    let app_state = state::AppState::load(settings, store, channel).await;
    let shared_state = Arc::new(app_state);

    {
        let book = shared_state.routes.read().await;
        shared_state
            .metrics
            .live_drivers
            .set(shared_state.live_positions.read().await.len() as i64);
        tracing::info!(
            drivers = book.drivers.len(),
            routes = book.routes.len(),
            stops = book.stop_count(),
            data_dir = %config.data_dir.display(),
            "state loaded"
        );
    }

    let app = api::rest::router(shared_state.clone());

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| error::AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| error::AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
