use serde_json::Value;

use crate::models::notification::{AudienceMessage, EventKind, TemplateSet};
use crate::models::route::Stop;

/// Public tracking link for a stop. Existing links are distributed in this
/// exact shape, so the path and parameter name must not change.
pub fn tracking_url(base_url: &str, stop_id: &str) -> String {
    format!(
        "{}/track?stopId={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(stop_id)
    )
}

pub fn build(
    kind: EventKind,
    driver_id: Option<&str>,
    stop: Option<&Stop>,
    extra: &Value,
    base_url: &str,
) -> TemplateSet {
    match (kind, stop) {
        (EventKind::StatusChange, Some(stop)) => status_change_set(stop, driver_id, base_url),
        (EventKind::ProofUploaded, Some(stop)) => proof_uploaded_set(stop, driver_id),
        _ => admin_only_set(kind, driver_id, stop, extra),
    }
}

fn status_change_set(stop: &Stop, driver_id: Option<&str>, base_url: &str) -> TemplateSet {
    let link = tracking_url(base_url, &stop.id);

    TemplateSet {
        patient: Some(AudienceMessage {
            subject: format!("Delivery update for {}", stop.patient),
            body: format!(
                "Hi {}, your delivery is now marked {}. Follow it live: {}",
                stop.patient, stop.status, link
            ),
        }),
        facility: Some(AudienceMessage {
            subject: format!("Status update for stop {}", stop.id),
            body: format!(
                "Stop {} ({}) at {} changed status to {}.",
                stop.id, stop.patient, stop.facility, stop.status
            ),
        }),
        admin: AudienceMessage {
            subject: format!("status_change {}", stop.id),
            body: format!(
                "stop={} driver={} status={}",
                stop.id,
                driver_id.unwrap_or("-"),
                stop.status
            ),
        },
    }
}

fn proof_uploaded_set(stop: &Stop, driver_id: Option<&str>) -> TemplateSet {
    let file = stop.proof_file.as_deref().unwrap_or("-");

    TemplateSet {
        patient: Some(AudienceMessage {
            subject: "Delivery complete".to_string(),
            body: format!(
                "Hi {}, your delivery is complete and proof of delivery is on file.",
                stop.patient
            ),
        }),
        facility: Some(AudienceMessage {
            subject: format!("Proof of delivery for stop {}", stop.id),
            body: format!(
                "Proof of delivery for stop {} ({}) has been uploaded: {}",
                stop.id, stop.patient, file
            ),
        }),
        admin: AudienceMessage {
            subject: format!("proof_uploaded {}", stop.id),
            body: format!(
                "stop={} driver={} proof={}",
                stop.id,
                driver_id.unwrap_or("-"),
                file
            ),
        },
    }
}

fn admin_only_set(
    kind: EventKind,
    driver_id: Option<&str>,
    stop: Option<&Stop>,
    extra: &Value,
) -> TemplateSet {
    let action = extra
        .get("action")
        .and_then(Value::as_str)
        .unwrap_or(kind.as_str());

    TemplateSet {
        patient: None,
        facility: None,
        admin: AudienceMessage {
            subject: format!("{} {}", kind.as_str(), action),
            body: format!(
                "kind={} stop={} driver={}",
                kind.as_str(),
                stop.map(|s| s.id.as_str()).unwrap_or("-"),
                driver_id.unwrap_or("-"),
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::{build, tracking_url};
    use crate::models::notification::EventKind;
    use crate::models::route::{Stop, StopStatus};

    fn stop(id: &str) -> Stop {
        Stop {
            id: id.to_string(),
            patient: "Rosa Vance".to_string(),
            facility: "Harborview Dialysis".to_string(),
            location: None,
            status: StopStatus::OutForDelivery,
            proof_file: None,
            failure_reason: None,
            updated_at: None,
        }
    }

    #[test]
    fn tracking_url_encodes_the_stop_id() {
        let url = tracking_url("http://localhost:3000", "stop 7/a");
        assert_eq!(url, "http://localhost:3000/track?stopId=stop%207%2Fa");
    }

    #[test]
    fn tracking_url_tolerates_trailing_slash() {
        let url = tracking_url("https://courier.example.com/", "S1");
        assert_eq!(url, "https://courier.example.com/track?stopId=S1");
    }

    #[test]
    fn status_change_addresses_all_audiences() {
        let set = build(
            EventKind::StatusChange,
            Some("D1"),
            Some(&stop("S1")),
            &Value::Null,
            "http://localhost:3000",
        );

        let patient = set.patient.unwrap();
        assert!(patient.body.contains("OutForDelivery"));
        assert!(patient.body.contains("/track?stopId=S1"));

        let facility = set.facility.unwrap();
        assert!(facility.body.contains("Harborview Dialysis"));

        assert_eq!(set.admin.body, "stop=S1 driver=D1 status=OutForDelivery");
    }

    #[test]
    fn proof_uploaded_references_the_file() {
        let mut delivered = stop("S2");
        delivered.status = StopStatus::Delivered;
        delivered.proof_file = Some("pod-991.jpg".to_string());

        let set = build(
            EventKind::ProofUploaded,
            Some("D1"),
            Some(&delivered),
            &Value::Null,
            "http://localhost:3000",
        );

        assert!(set.facility.unwrap().body.contains("pod-991.jpg"));
        assert_eq!(set.admin.body, "stop=S2 driver=D1 proof=pod-991.jpg");
    }

    #[test]
    fn unrecognized_kinds_fall_back_to_admin_only() {
        let set = build(
            EventKind::Generic,
            None,
            None,
            &json!({ "action": "PAGE_ACCESS" }),
            "http://localhost:3000",
        );

        assert!(set.patient.is_none());
        assert!(set.facility.is_none());
        assert_eq!(set.admin.subject, "generic PAGE_ACCESS");
        assert_eq!(set.admin.body, "kind=generic stop=- driver=-");
    }
}
