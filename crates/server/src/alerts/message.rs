//! Alert text shared by every recipient of one alert.

use super::Location;

pub const ALERT_BANNER: &str = "🚨 EMERGENCY ALERT 🚨";
pub const ALERT_FOOTER: &str =
    "This is an automated emergency alert from MedGuard. Please respond immediately.";
pub const TEST_SMS_BODY: &str =
    "🧪 Test SMS from MedGuard - This is a test message to verify Twilio SMS functionality.";

/// Plain text body of an emergency SMS.
#[derive(Debug, Clone, Copy)]
pub struct AlertMessage<'a> {
    pub patient_name: &'a str,
    pub custom_message: Option<&'a str>,
    pub location: Option<&'a Location>,
}

impl AlertMessage<'_> {
    pub fn render_text(&self) -> String {
        let mut text = format!(
            "{ALERT_BANNER}\n\n{} needs immediate help!\n\n",
            self.patient_name
        );

        if let Some(custom) = self.custom_message.map(str::trim).filter(|m| !m.is_empty()) {
            text.push_str(&format!("Message: {custom}\n\n"));
        }

        if let Some(location) = self.location.and_then(Location::describe) {
            text.push_str(&format!("📍 Location: {location}\n\n"));
        }

        text.push_str(ALERT_FOOTER);
        text
    }
}
