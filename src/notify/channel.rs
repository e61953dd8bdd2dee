use tracing::info;

use crate::error::AppError;
use crate::models::notification::AudienceMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Patient,
    Facility,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Facility => "facility",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Recipient {
    pub audience: Audience,
    pub name: String,
}

/// Outbound send seam; the stock implementation only logs.
pub trait NotificationChannel: Send + Sync {
    fn deliver(&self, recipient: &Recipient, message: &AudienceMessage) -> Result<(), AppError>;
}

#[derive(Debug, Default)]
pub struct LogChannel;

impl NotificationChannel for LogChannel {
    fn deliver(&self, recipient: &Recipient, message: &AudienceMessage) -> Result<(), AppError> {
        info!(
            audience = recipient.audience.as_str(),
            recipient = %recipient.name,
            subject = %message.subject,
            "notification channel stub; nothing sent"
        );
        Ok(())
    }
}
