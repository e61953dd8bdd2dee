use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::models::notification::{EventKind, NotificationEvent};
use crate::notify::register_notification;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/notifications", get(list_notifications))
        .route("/api/audit", post(record_audit))
}

#[derive(Deserialize)]
pub struct NotificationFilter {
    #[serde(default)]
    pub facility: Option<String>,
    #[serde(default)]
    pub kind: Option<EventKind>,
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
    #[serde(default)]
    pub until: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct AuditRequest {
    pub action: String,
    #[serde(default)]
    pub details: Option<Value>,
    #[serde(default)]
    pub driver_id: Option<String>,
}

async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<NotificationFilter>,
) -> Json<Vec<NotificationEvent>> {
    let log = state.notifications.read().await;

    let events = log
        .iter()
        .filter(|event| {
            if let Some(facility) = &filter.facility {
                if event.facility.as_deref() != Some(facility.as_str()) {
                    return false;
                }
            }
            if let Some(kind) = filter.kind {
                if event.kind != kind {
                    return false;
                }
            }
            if let Some(since) = filter.since {
                if event.created_at < since {
                    return false;
                }
            }
            if let Some(until) = filter.until {
                if event.created_at > until {
                    return false;
                }
            }
            true
        })
        .cloned()
        .collect();

    Json(events)
}

/// Audit entries share the notification log, as `generic` records with no
/// stop attached.
async fn record_audit(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AuditRequest>,
) -> Result<Json<NotificationEvent>, AppError> {
    let action = payload.action.trim();
    if action.is_empty() {
        return Err(AppError::InvalidInput("action cannot be empty".to_string()));
    }

    let event = register_notification(
        &state,
        EventKind::Generic,
        payload.driver_id.as_deref(),
        None,
        json!({
            "action": action,
            "details": payload.details,
        }),
    )
    .await?;

    Ok(Json(event))
}
