use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use tracing::info;

use crate::error::AppError;
use crate::lifecycle;
use crate::models::delivery::ProofRecord;
use crate::models::route::{RouteBook, Stop, StopStatus};
use crate::state::{AppState, index_routes};
use crate::store;
use crate::tracking::{self, StopContext};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/routes", get(get_routes).put(import_routes))
        .route("/api/stops/:id", get(get_stop))
        .route("/api/stops/:id/status", post(update_status))
        .route("/api/stops/:id/proof", post(attach_proof))
        .route("/api/deliveries", get(list_deliveries))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct AttachProofRequest {
    pub file: String,
}

async fn get_routes(State(state): State<Arc<AppState>>) -> Json<RouteBook> {
    let book = state.routes.read().await;
    Json(book.clone())
}

/// Replaces the whole book; the stop index is rebuilt only after the save
/// succeeds.
async fn import_routes(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RouteBook>,
) -> Result<Json<RouteBook>, AppError> {
    payload.validate().map_err(AppError::InvalidInput)?;

    let mut book = state.routes.write().await;
    let previous = std::mem::replace(&mut *book, payload);

    if let Err(err) = state.store.save(store::ROUTES, &*book).await {
        *book = previous;
        return Err(err);
    }

    index_routes(&state.stop_index, &book);

    info!(
        drivers = book.drivers.len(),
        routes = book.routes.len(),
        stops = book.stop_count(),
        "route book imported"
    );

    Ok(Json(book.clone()))
}

async fn get_stop(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StopContext>, AppError> {
    let context = tracking::find_stop(&state, &id).await?;
    Ok(Json(context))
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Stop>, AppError> {
    let label = payload.status.trim();
    if label.is_empty() {
        return Err(AppError::InvalidInput("status cannot be empty".to_string()));
    }
    let status = StopStatus::parse(label);

    let start = Instant::now();
    let result = lifecycle::update_stop_status(&state, &id, status, payload.reason).await;

    let outcome = if result.is_ok() { "success" } else { "error" };
    state
        .metrics
        .status_update_seconds
        .with_label_values(&[outcome])
        .observe(start.elapsed().as_secs_f64());
    state
        .metrics
        .status_updates_total
        .with_label_values(&[outcome])
        .inc();

    Ok(Json(result?))
}

async fn attach_proof(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<AttachProofRequest>,
) -> Result<Json<Stop>, AppError> {
    let (stop, _record) = lifecycle::attach_proof(&state, &id, payload.file).await?;
    Ok(Json(stop))
}

async fn list_deliveries(State(state): State<Arc<AppState>>) -> Json<Vec<ProofRecord>> {
    let proofs = state.proofs.read().await;
    Json(proofs.clone())
}
