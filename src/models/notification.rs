use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::route::StopStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    StatusChange,
    ProofUploaded,
    SmsSent,
    FacilityEmailSent,
    Generic,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StatusChange => "status_change",
            Self::ProofUploaded => "proof_uploaded",
            Self::SmsSent => "sms_sent",
            Self::FacilityEmailSent => "facility_email_sent",
            Self::Generic => "generic",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudienceMessage {
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSet {
    #[serde(default)]
    pub patient: Option<AudienceMessage>,
    #[serde(default)]
    pub facility: Option<AudienceMessage>,
    pub admin: AudienceMessage,
}

/// Append-only; the log doubles as the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub id: u64,
    pub kind: EventKind,
    #[serde(default)]
    pub stop_id: Option<String>,
    #[serde(default)]
    pub driver_id: Option<String>,
    #[serde(default)]
    pub facility: Option<String>,
    #[serde(default)]
    pub status: Option<StopStatus>,
    pub templates: TemplateSet,
    #[serde(default)]
    pub extra: Value,
    pub created_at: DateTime<Utc>,
}
