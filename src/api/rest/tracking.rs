use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;
use crate::tracking::{self, TrackingSnapshot};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/stops/:id/tracking", get(get_snapshot))
        .route("/track", get(track_page))
}

#[derive(Deserialize)]
pub struct TrackQuery {
    #[serde(rename = "stopId")]
    pub stop_id: String,
}

async fn get_snapshot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TrackingSnapshot>, AppError> {
    let snapshot = tracking::snapshot(&state, &id).await?;
    Ok(Json(snapshot))
}

async fn track_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TrackQuery>,
) -> Result<Json<TrackingSnapshot>, AppError> {
    let snapshot = tracking::snapshot(&state, &query.stop_id).await?;
    Ok(Json(snapshot))
}
