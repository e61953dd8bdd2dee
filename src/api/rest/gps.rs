use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use crate::error::AppError;
use crate::models::position::{GeoPoint, LivePosition};
use crate::state::AppState;
use crate::store;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/drivers/:id/gps", post(record_ping))
        .route("/api/positions", get(list_positions))
}

#[derive(Deserialize)]
pub struct GpsPingRequest {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub speed_kmh: Option<f64>,
    #[serde(default)]
    pub heading_deg: Option<f64>,
    #[serde(default)]
    pub accuracy_m: Option<f64>,
}

/// Pings from unknown driver ids are accepted; routes may arrive later.
async fn record_ping(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<GpsPingRequest>,
) -> Result<Json<LivePosition>, AppError> {
    if !payload.lat.is_finite() || !(-90.0..=90.0).contains(&payload.lat) {
        return Err(AppError::InvalidInput(format!(
            "latitude {} out of range",
            payload.lat
        )));
    }
    if !payload.lng.is_finite() || !(-180.0..=180.0).contains(&payload.lng) {
        return Err(AppError::InvalidInput(format!(
            "longitude {} out of range",
            payload.lng
        )));
    }

    let position = LivePosition {
        driver_id: id.clone(),
        point: GeoPoint {
            lat: payload.lat,
            lng: payload.lng,
        },
        speed_kmh: payload.speed_kmh,
        heading_deg: payload.heading_deg,
        accuracy_m: payload.accuracy_m,
        recorded_at: Utc::now(),
    };

    {
        let mut positions = state.live_positions.write().await;
        let previous = positions.insert(id.clone(), position.clone());

        if let Err(err) = state.store.save(store::POSITIONS, &*positions).await {
            match previous {
                Some(previous) => {
                    positions.insert(id, previous);
                }
                None => {
                    positions.remove(&id);
                }
            }
            return Err(err);
        }

        state.metrics.gps_pings_total.inc();
        state.metrics.live_drivers.set(positions.len() as i64);
    }

    debug!(driver_id = %position.driver_id, lat = payload.lat, lng = payload.lng, "gps ping recorded");

    Ok(Json(position))
}

async fn list_positions(State(state): State<Arc<AppState>>) -> Json<Vec<LivePosition>> {
    let positions = state.live_positions.read().await;
    let mut all: Vec<LivePosition> = positions.values().cloned().collect();
    all.sort_by(|a, b| a.driver_id.cmp(&b.driver_id));
    Json(all)
}
