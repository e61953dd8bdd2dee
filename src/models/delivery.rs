use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ties a proof filename to a stop; the file itself lives with the upload
/// layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofRecord {
    pub id: Uuid,
    pub stop_id: String,
    pub file: String,
    pub uploaded_at: DateTime<Utc>,
}
