pub mod gps;
pub mod notifications;
pub mod routes;
pub mod tracking;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::models::user::UserAccount;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::router())
        .merge(gps::router())
        .merge(tracking::router())
        .merge(notifications::router())
        .route("/api/users", get(list_users))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(CorsLayer::permissive())
        .with_state(state)
        .fallback_service(ServeDir::new("static"))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    drivers: usize,
    routes: usize,
    stops: usize,
    live_positions: usize,
    notifications: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let (drivers, routes, stops) = {
        let book = state.routes.read().await;
        (book.drivers.len(), book.routes.len(), book.stop_count())
    };
    let live_positions = state.live_positions.read().await.len();
    let notifications = state.notifications.read().await.len();

    Json(HealthResponse {
        status: "ok",
        drivers,
        routes,
        stops,
        live_positions,
        notifications,
    })
}

async fn list_users(State(state): State<Arc<AppState>>) -> Json<Vec<UserAccount>> {
    let users = state.users.read().await;
    Json(users.clone())
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
