//! Outbound SMS.
//!
//! Everything that talks to the SMS vendor goes through [`SmsClient`] so the
//! alert dispatcher can be exercised against fakes.

pub mod twilio;

pub use twilio::TwilioClient;

use crate::error::SmsError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A single message to hand to the vendor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundSms {
    pub body: String,
    pub from: String,
    pub to: String,
}

/// What the vendor reports back for an accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SentMessage {
    pub sid: String,
    pub status: String,
    pub to: String,
    pub from: String,
}

#[async_trait::async_trait]
pub trait SmsClient: Send + Sync {
    /// Submits one message. An `Ok` means the vendor accepted it for delivery,
    /// not that the handset received it.
    async fn send(&self, message: OutboundSms) -> Result<SentMessage, SmsError>;
}
