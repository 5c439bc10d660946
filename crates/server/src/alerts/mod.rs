//! Emergency alert fan-out to a patient's emergency contacts.
//!
//! ## Submodules
//!
//! - `message` - SMS text shared by all recipients of one alert
//! - `dispatcher` - per-contact normalize/validate/send loop and outcome aggregation

pub mod dispatcher;
pub mod message;

pub use dispatcher::{AlertDispatcher, TestSmsOutcome};
pub use message::AlertMessage;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A person to notify. `phone` is kept exactly as the user typed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
    pub relationship: String,
}

/// Where the patient is. Coordinates take precedence over the address when
/// both are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Location {
    /// A map link for coordinates, else the textual address.
    pub fn describe(&self) -> Option<String> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(format!("https://maps.google.com/?q={lat},{lng}")),
            _ => self
                .address
                .as_deref()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string),
        }
    }
}

/// One alert, built per request and never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRequest {
    pub patient_name: String,
    pub location: Option<Location>,
    pub emergency_contacts: Vec<EmergencyContact>,
    pub custom_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
}

/// What happened for one contact. Exactly one of `status` or `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertResult {
    pub contact: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DeliveryStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AlertResult {
    pub fn is_sent(&self) -> bool {
        self.status == Some(DeliveryStatus::Sent)
    }
}

/// Aggregate over all contacts of one alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AlertOutcome {
    /// True when at least one contact was messaged.
    pub success: bool,
    pub message: String,
    /// One entry per contact, in contact order.
    pub results: Vec<AlertResult>,
}

impl AlertOutcome {
    pub fn sent_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_sent()).count()
    }

    /// Builds the summary from per-contact results.
    pub fn from_results(results: Vec<AlertResult>) -> Self {
        let total = results.len();
        let sent = results.iter().filter(|r| r.is_sent()).count();
        let failed = total - sent;

        let (success, message) = if sent == 0 {
            (false, format!("Failed to send alerts to all {total} contacts."))
        } else if failed > 0 {
            (
                true,
                format!("Alerts sent to {sent}/{total} contacts. {failed} failed."),
            )
        } else {
            (
                true,
                format!("Emergency alerts successfully sent to all {total} contacts."),
            )
        };

        Self {
            success,
            message,
            results,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            results: Vec::new(),
        }
    }
}
