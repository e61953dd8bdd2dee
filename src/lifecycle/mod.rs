use chrono::Utc;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::delivery::ProofRecord;
use crate::models::notification::EventKind;
use crate::models::route::{Stop, StopStatus};
use crate::notify::register_notification;
use crate::state::AppState;
use crate::store;

/// The route book is persisted before the route lock drops; concurrent
/// updates serialize as full read-modify-write cycles. Every accepted
/// update records a `status_change` event, repeats included.
pub async fn update_stop_status(
    state: &AppState,
    stop_id: &str,
    new_status: StopStatus,
    reason: Option<String>,
) -> Result<Stop, AppError> {
    if state.settings.strict_statuses && !new_status.is_recognized() {
        return Err(AppError::InvalidInput(format!(
            "unrecognized status {new_status}"
        )));
    }

    let (updated, driver_id) = {
        let mut book = state.routes.write().await;
        let Some((_, driver_id, stop)) = book.find_stop_mut(stop_id) else {
            return Err(AppError::NotFound(format!("stop {stop_id} not found")));
        };
        let driver_id = driver_id.to_string();

        let previous = (
            stop.status.clone(),
            stop.failure_reason.clone(),
            stop.updated_at,
        );
        stop.status = new_status.clone();
        stop.failure_reason = if new_status.is_failure() { reason } else { None };
        stop.updated_at = Some(Utc::now());
        let updated = stop.clone();

        if let Err(err) = state.store.save(store::ROUTES, &*book).await {
            // A failed save must leave memory agreeing with disk.
            if let Some((_, _, stop)) = book.find_stop_mut(stop_id) {
                stop.status = previous.0;
                stop.failure_reason = previous.1;
                stop.updated_at = previous.2;
            }
            return Err(err);
        }

        (updated, driver_id)
    };

    info!(
        stop_id = %updated.id,
        driver_id = %driver_id,
        status = %updated.status,
        "stop status updated"
    );

    register_notification(
        state,
        EventKind::StatusChange,
        Some(&driver_id),
        Some(&updated),
        json!({
            "status": updated.status,
            "reason": updated.failure_reason,
        }),
    )
    .await?;

    Ok(updated)
}

pub async fn attach_proof(
    state: &AppState,
    stop_id: &str,
    file: String,
) -> Result<(Stop, ProofRecord), AppError> {
    if file.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "proof file name cannot be empty".to_string(),
        ));
    }

    let (updated, driver_id) = {
        let mut book = state.routes.write().await;
        let Some((_, driver_id, stop)) = book.find_stop_mut(stop_id) else {
            return Err(AppError::NotFound(format!("stop {stop_id} not found")));
        };
        let driver_id = driver_id.to_string();

        let previous = (
            stop.status.clone(),
            stop.proof_file.clone(),
            stop.failure_reason.clone(),
            stop.updated_at,
        );
        stop.status = StopStatus::Delivered;
        stop.proof_file = Some(file.clone());
        stop.failure_reason = None;
        stop.updated_at = Some(Utc::now());
        let updated = stop.clone();

        if let Err(err) = state.store.save(store::ROUTES, &*book).await {
            if let Some((_, _, stop)) = book.find_stop_mut(stop_id) {
                stop.status = previous.0;
                stop.proof_file = previous.1;
                stop.failure_reason = previous.2;
                stop.updated_at = previous.3;
            }
            return Err(err);
        }

        (updated, driver_id)
    };

    let record = {
        let mut proofs = state.proofs.write().await;
        let record = ProofRecord {
            id: Uuid::new_v4(),
            stop_id: stop_id.to_string(),
            file: file.clone(),
            uploaded_at: Utc::now(),
        };
        proofs.push(record.clone());
        if let Err(err) = state.store.save(store::DELIVERIES, &*proofs).await {
            proofs.pop();
            return Err(err);
        }
        record
    };

    info!(
        stop_id = %updated.id,
        driver_id = %driver_id,
        file = %file,
        "proof of delivery recorded"
    );

    register_notification(
        state,
        EventKind::ProofUploaded,
        Some(&driver_id),
        Some(&updated),
        json!({ "file": file }),
    )
    .await?;

    Ok((updated, record))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use tokio::sync::RwLock;

    use super::*;
    use crate::models::route::{Driver, Route, RouteBook};
    use crate::notify::channel::LogChannel;
    use crate::observability::metrics::Metrics;
    use crate::state::{AppState, TrackerSettings};
    use crate::store::JsonStore;

    fn sample_book() -> RouteBook {
        RouteBook {
            drivers: vec![Driver {
                id: "D1".to_string(),
                name: "Dana".to_string(),
            }],
            routes: vec![Route {
                id: "R1".to_string(),
                driver_id: "D1".to_string(),
                stops: vec![Stop {
                    id: "S1".to_string(),
                    patient: "P. Smith".to_string(),
                    facility: "Mercy Pharmacy".to_string(),
                    location: None,
                    status: StopStatus::Assigned,
                    proof_file: None,
                    failure_reason: None,
                    updated_at: None,
                }],
            }],
        }
    }

    fn scratch_state(settings: TrackerSettings) -> AppState {
        let dir = std::env::temp_dir().join(format!("careline-lifecycle-{}", Uuid::new_v4()));
        AppState {
            settings,
            store: JsonStore::new(dir),
            routes: RwLock::new(sample_book()),
            stop_index: dashmap::DashMap::new(),
            live_positions: RwLock::new(HashMap::new()),
            notifications: RwLock::new(Vec::new()),
            proofs: RwLock::new(Vec::new()),
            users: RwLock::new(Vec::new()),
            channel: Arc::new(LogChannel),
            metrics: Metrics::new(),
        }
    }

    #[tokio::test]
    async fn failure_reason_is_stored_then_cleared() {
        let state = scratch_state(TrackerSettings::default());

        let stop = update_stop_status(
            &state,
            "S1",
            StopStatus::Failed,
            Some("nobody home".to_string()),
        )
        .await
        .unwrap();
        assert_eq!(stop.failure_reason.as_deref(), Some("nobody home"));

        let stop = update_stop_status(&state, "S1", StopStatus::OutForDelivery, None)
            .await
            .unwrap();
        assert!(stop.failure_reason.is_none());
    }

    #[tokio::test]
    async fn strict_mode_rejects_free_text_statuses() {
        let settings = TrackerSettings {
            strict_statuses: true,
            ..TrackerSettings::default()
        };
        let state = scratch_state(settings);

        let err = update_stop_status(&state, "S1", StopStatus::parse("held at depot"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let log = state.notifications.read().await;
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn repeating_a_status_still_appends_an_event() {
        let state = scratch_state(TrackerSettings::default());

        update_stop_status(&state, "S1", StopStatus::Delivered, None)
            .await
            .unwrap();
        update_stop_status(&state, "S1", StopStatus::Delivered, None)
            .await
            .unwrap();

        let log = state.notifications.read().await;
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].id, 1);
        assert_eq!(log[1].id, 2);
    }

    #[tokio::test]
    async fn proof_upload_marks_delivered_and_logs_once() {
        let state = scratch_state(TrackerSettings::default());

        let (stop, record) = attach_proof(&state, "S1", "S1-door.jpg".to_string())
            .await
            .unwrap();
        assert_eq!(stop.status, StopStatus::Delivered);
        assert_eq!(stop.proof_file.as_deref(), Some("S1-door.jpg"));
        assert_eq!(record.stop_id, "S1");

        let log = state.notifications.read().await;
        let uploads = log
            .iter()
            .filter(|e| e.kind == EventKind::ProofUploaded)
            .count();
        assert_eq!(uploads, 1);
    }

    #[tokio::test]
    async fn unknown_stop_is_not_found() {
        let state = scratch_state(TrackerSettings::default());

        let err = update_stop_status(&state, "S9", StopStatus::Delivered, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
