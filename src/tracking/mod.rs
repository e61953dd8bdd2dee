use serde::Serialize;

use crate::error::AppError;
use crate::geo;
use crate::models::position::LivePosition;
use crate::models::route::{Driver, Stop};
use crate::notify::templates;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct StopContext {
    pub route_id: String,
    pub driver: Driver,
    pub stop: Stop,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackingSnapshot {
    pub stop: Stop,
    pub driver: Driver,
    pub live_position: Option<LivePosition>,
    pub eta_minutes: Option<u32>,
    pub tracking_url: String,
}

/// Index fast path with a scan fallback for entries the index has not
/// caught up with. Reads never write the index back.
pub async fn find_stop(state: &AppState, stop_id: &str) -> Result<StopContext, AppError> {
    let book = state.routes.read().await;

    let indexed_route_id = state
        .stop_index
        .get(stop_id)
        .map(|entry| entry.value().clone());

    let found = indexed_route_id
        .and_then(|route_id| {
            let route = book.route(&route_id)?;
            let stop = route.stops.iter().find(|s| s.id == stop_id)?;
            Some((route, stop))
        })
        .or_else(|| book.find_stop(stop_id));

    let Some((route, stop)) = found else {
        return Err(AppError::NotFound(format!("stop {stop_id} not found")));
    };

    let Some(driver) = book.driver(&route.driver_id) else {
        return Err(AppError::NotFound(format!(
            "driver {} not found",
            route.driver_id
        )));
    };

    Ok(StopContext {
        route_id: route.id.clone(),
        driver: driver.clone(),
        stop: stop.clone(),
    })
}

pub async fn snapshot(state: &AppState, stop_id: &str) -> Result<TrackingSnapshot, AppError> {
    let context = find_stop(state, stop_id).await?;

    let live_position = {
        let positions = state.live_positions.read().await;
        positions.get(&context.driver.id).cloned()
    };

    let eta_minutes = geo::eta_minutes(
        live_position.as_ref().map(|p| &p.point),
        context.stop.location.as_ref(),
        state.settings.average_speed_kmh,
    );

    let tracking_url = templates::tracking_url(&state.settings.tracking_base_url, stop_id);

    Ok(TrackingSnapshot {
        stop: context.stop,
        driver: context.driver,
        live_position,
        eta_minutes,
        tracking_url,
    })
}
