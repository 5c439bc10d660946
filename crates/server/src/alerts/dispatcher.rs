//! Sends one alert to every emergency contact and reports per-contact results.

use super::message::TEST_SMS_BODY;
use super::{AlertMessage, AlertOutcome, AlertRequest, AlertResult, DeliveryStatus, EmergencyContact};
use crate::config::AppConfig;
use crate::phone::{PhoneIssue, PhoneNormalizer, US_AREA_CODE_SUGGESTIONS, diagnose, validate};
use crate::sms::{OutboundSms, SentMessage, SmsClient, TwilioClient};
use futures::StreamExt;
use futures::stream;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

const NOT_CONFIGURED: &str = "Twilio not configured. Cannot send SMS alerts.";
const NO_SENDER_NUMBER: &str = "Twilio phone number not configured.";

/// Result of a one-off test message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TestSmsOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SentMessage>,
}

/// Holds the SMS client and sending number for the lifetime of the process.
///
/// Without credentials the dispatcher still exists, but every call returns a
/// failed outcome instead of touching the network.
#[derive(Clone)]
pub struct AlertDispatcher {
    client: Option<Arc<dyn SmsClient>>,
    from_number: Option<String>,
    normalizer: PhoneNormalizer,
    concurrency: usize,
}

impl AlertDispatcher {
    pub fn new(
        client: Arc<dyn SmsClient>,
        from_number: impl Into<String>,
        normalizer: PhoneNormalizer,
    ) -> Self {
        Self {
            client: Some(client),
            from_number: Some(from_number.into()),
            normalizer,
            concurrency: 1,
        }
    }

    /// A dispatcher that refuses to send anything.
    pub fn unconfigured(normalizer: PhoneNormalizer) -> Self {
        Self {
            client: None,
            from_number: None,
            normalizer,
            concurrency: 1,
        }
    }

    /// Allows up to `concurrency` sends in flight. Results keep contact order.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Builds the Twilio-backed dispatcher, degrading to an unconfigured one
    /// (with a warning) when credentials are missing.
    pub fn from_config(config: &AppConfig) -> Self {
        let normalizer = PhoneNormalizer::new(config.phone.default_country);
        let missing = config.twilio.missing_credentials();
        if !missing.is_empty() {
            tracing::warn!(
                name = "alerts.dispatcher.not_configured",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                missing = ?missing,
                message = "Twilio credentials not configured. SMS alerts will not work."
            );
        }

        let client = match TwilioClient::from_config(&config.twilio) {
            Ok(client) => Some(Arc::new(client) as Arc<dyn SmsClient>),
            Err(e) => {
                tracing::debug!(
                    name = "alerts.dispatcher.client_unavailable",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    error = %e,
                    message = "Twilio client not created"
                );
                None
            }
        };
        let from_number = config
            .twilio
            .phone_number
            .clone()
            .filter(|n| !n.trim().is_empty());

        Self {
            client,
            from_number,
            normalizer,
            concurrency: config.alerts.dispatch_concurrency.max(1),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some() && self.from_number.is_some()
    }

    pub fn normalizer(&self) -> &PhoneNormalizer {
        &self.normalizer
    }

    fn sender(&self, not_configured: &'static str) -> Result<(&dyn SmsClient, &str), &'static str> {
        let client = self.client.as_deref().ok_or(not_configured)?;
        let from = self.from_number.as_deref().ok_or(NO_SENDER_NUMBER)?;
        Ok((client, from))
    }

    /// Messages every contact in `request`. Failures are recorded per contact
    /// and never abort the batch; nothing is retried.
    #[tracing::instrument(skip_all, fields(contacts = request.emergency_contacts.len()))]
    pub async fn send_emergency_alert(&self, request: &AlertRequest) -> AlertOutcome {
        let (client, from) = match self.sender(NOT_CONFIGURED) {
            Ok(sender) => sender,
            Err(message) => return AlertOutcome::failure(message),
        };

        let body = AlertMessage {
            patient_name: &request.patient_name,
            custom_message: request.custom_message.as_deref(),
            location: request.location.as_ref(),
        }
        .render_text();

        let pending: Vec<_> = request
            .emergency_contacts
            .iter()
            .map(|contact| self.deliver(client, from, &body, contact))
            .collect();
        let results: Vec<AlertResult> = stream::iter(pending)
            .buffered(self.concurrency)
            .collect()
            .await;

        let outcome = AlertOutcome::from_results(results);
        tracing::info!(
            name = "alerts.dispatcher.completed",
            target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
            success = outcome.success,
            sent = outcome.sent_count(),
            total = outcome.results.len(),
            message = %outcome.message
        );
        outcome
    }

    async fn deliver(
        &self,
        client: &dyn SmsClient,
        from: &str,
        body: &str,
        contact: &EmergencyContact,
    ) -> AlertResult {
        let formatted = self.normalizer.normalize(&contact.phone);
        let failed = |error: String| {
            tracing::error!(
                name = "alerts.dispatcher.contact_failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                contact = %contact.name,
                phone = %contact.phone,
                error = %error,
                message = "Failed to send alert"
            );
            AlertResult {
                contact: contact.name.clone(),
                phone: contact.phone.clone(),
                formatted_phone: None,
                status: None,
                sid: None,
                error: Some(error),
            }
        };

        if !validate(&formatted) {
            return failed(invalid_number_message(&contact.phone, &formatted));
        }

        let sms = OutboundSms {
            body: body.to_string(),
            from: from.to_string(),
            to: formatted.clone(),
        };
        match client.send(sms).await {
            Ok(sent) => {
                tracing::info!(
                    name = "alerts.dispatcher.contact_sent",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    contact = %contact.name,
                    to = %formatted,
                    sid = %sent.sid,
                    message = "Alert sent"
                );
                AlertResult {
                    contact: contact.name.clone(),
                    phone: contact.phone.clone(),
                    formatted_phone: Some(formatted),
                    status: Some(DeliveryStatus::Sent),
                    sid: Some(sent.sid),
                    error: None,
                }
            }
            Err(e) => failed(e.to_string()),
        }
    }

    /// Sends a fixed test message to `to` as given, without normalization.
    #[tracing::instrument(skip(self))]
    pub async fn send_test_sms(&self, to: &str) -> TestSmsOutcome {
        let (client, from) = match self.sender("Twilio not configured.") {
            Ok(sender) => sender,
            Err(message) => {
                return TestSmsOutcome {
                    success: false,
                    message: message.to_string(),
                    result: None,
                };
            }
        };

        let sms = OutboundSms {
            body: TEST_SMS_BODY.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        };
        match client.send(sms).await {
            Ok(sent) => {
                tracing::info!(
                    name = "alerts.test_sms.sent",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    to = %to,
                    sid = %sent.sid,
                    message = "Test SMS sent"
                );
                TestSmsOutcome {
                    success: true,
                    message: format!("Test SMS sent successfully to {to}"),
                    result: Some(sent),
                }
            }
            Err(e) => {
                tracing::error!(
                    name = "alerts.test_sms.failed",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    to = %to,
                    error = %e,
                    message = "Failed to send test SMS"
                );
                TestSmsOutcome {
                    success: false,
                    message: format!("Failed to send test SMS: {e}"),
                    result: None,
                }
            }
        }
    }
}

/// Per-contact error text, with a hint for the rejections we can explain.
fn invalid_number_message(raw: &str, formatted: &str) -> String {
    let mut message = format!("Invalid phone number: {raw}");
    match diagnose(formatted) {
        Some(PhoneIssue::UnassignedAreaCode(code)) => {
            let suggestions = US_AREA_CODE_SUGGESTIONS[..3].join(", ");
            message.push_str(&format!(
                " (Area code {code} is not assigned. Try: {suggestions})"
            ));
        }
        Some(issue) => message.push_str(&format!(" ({issue})")),
        None => {}
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_number_messages_carry_hints() {
        assert_eq!(
            invalid_number_message("1 748 234 5678", "+17482345678"),
            "Invalid phone number: 1 748 234 5678 (Area code 748 is not assigned. Try: 213, 310, 323)"
        );
        assert_eq!(
            invalid_number_message("1 123 234 5678", "+11232345678"),
            "Invalid phone number: 1 123 234 5678 (Area code cannot start with 1)"
        );
        assert_eq!(
            invalid_number_message("911876543210", "+911876543210"),
            "Invalid phone number: 911876543210 (Indian mobile numbers must start with 6, 7, 8, or 9)"
        );
        assert_eq!(
            invalid_number_message("1 555 234 5678", "+15552345678"),
            "Invalid phone number: 1 555 234 5678"
        );
    }

    #[tokio::test]
    async fn unconfigured_dispatcher_fails_without_results() {
        let dispatcher = AlertDispatcher::unconfigured(PhoneNormalizer::default());
        assert!(!dispatcher.is_configured());

        let outcome = dispatcher
            .send_emergency_alert(&AlertRequest {
                patient_name: "Sam".into(),
                location: None,
                emergency_contacts: vec![EmergencyContact {
                    name: "Alex".into(),
                    phone: "4152345678".into(),
                    relationship: "Sibling".into(),
                }],
                custom_message: None,
            })
            .await;
        assert!(!outcome.success);
        assert_eq!(outcome.message, NOT_CONFIGURED);
        assert!(outcome.results.is_empty());

        let test = dispatcher.send_test_sms("+15005550006").await;
        assert!(!test.success);
        assert_eq!(test.message, "Twilio not configured.");
    }
}
