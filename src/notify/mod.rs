pub mod channel;
pub mod templates;

use chrono::Utc;
use serde_json::Value;
use tracing::warn;

use crate::error::AppError;
use crate::models::notification::{EventKind, NotificationEvent};
use crate::models::route::Stop;
use crate::notify::channel::{Audience, Recipient};
use crate::state::AppState;
use crate::store;

/// One call appends exactly one event; the log is persisted before the
/// channel hook runs. Channel-echo kinds (`sms_sent`, `facility_email_sent`)
/// are recorded by integrations calling this themselves, never as a cascade.
pub async fn register_notification(
    state: &AppState,
    kind: EventKind,
    driver_id: Option<&str>,
    stop: Option<&Stop>,
    extra: Value,
) -> Result<NotificationEvent, AppError> {
    let templates = templates::build(
        kind,
        driver_id,
        stop,
        &extra,
        &state.settings.tracking_base_url,
    );

    let event = {
        let mut log = state.notifications.write().await;
        let id = log.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        let event = NotificationEvent {
            id,
            kind,
            stop_id: stop.map(|s| s.id.clone()),
            driver_id: driver_id.map(str::to_string),
            facility: stop.map(|s| s.facility.clone()),
            status: stop.map(|s| s.status.clone()),
            templates,
            extra,
            created_at: Utc::now(),
        };
        log.push(event.clone());
        if let Err(err) = state.store.save(store::NOTIFICATIONS, &*log).await {
            // Memory must not keep an event the disk never saw.
            log.pop();
            return Err(err);
        }
        event
    };

    state
        .metrics
        .notifications_recorded_total
        .with_label_values(&[event.kind.as_str()])
        .inc();

    if let Some(stop) = stop {
        offer_to_channel(state, &event, stop);
    }

    Ok(event)
}

/// Channel failures are logged, not propagated; the event is already
/// durably recorded by the time this runs.
fn offer_to_channel(state: &AppState, event: &NotificationEvent, stop: &Stop) {
    let targets = [
        (
            Audience::Patient,
            stop.patient.as_str(),
            event.templates.patient.as_ref(),
        ),
        (
            Audience::Facility,
            stop.facility.as_str(),
            event.templates.facility.as_ref(),
        ),
    ];

    for (audience, name, message) in targets {
        let Some(message) = message else { continue };
        let recipient = Recipient {
            audience,
            name: name.to_string(),
        };
        if let Err(err) = state.channel.deliver(&recipient, message) {
            warn!(
                audience = audience.as_str(),
                stop_id = ?event.stop_id,
                error = %err,
                "notification channel delivery failed"
            );
        }
    }
}
