//! Phone number handling for emergency contacts.
//!
//! Contacts are entered by hand, so numbers arrive in every shape imaginable
//! ("(415) 555-0100", "098765 43210", "+44 20 7946 0958"). This module:
//! - `normalize` - turns loose input into an E.164 candidate
//! - `validate` - syntactic E.164 checks plus US/Canada and India rules
//! - `check_phone_number` - combines both with diagnostics and suggestions
//!
//! None of this consults a numbering registry; the area code deny-list and the
//! country heuristics are best-effort.

pub mod normalize;
pub mod validate;

pub use normalize::{DefaultCountry, PhoneNormalizer, normalize};
pub use validate::{PhoneIssue, diagnose, validate};

use serde::Serialize;
use utoipa::ToSchema;

/// Area codes offered when a US number is rejected.
pub const US_AREA_CODE_SUGGESTIONS: &[&str] = &[
    "213", "310", "323", "424", "661", "747", "818", // Los Angeles
    "415", "628", "650", // San Francisco
    "212", "646", "917", "929", // New York
    "202", // Washington DC
    "305", "786", // Miami
    "312", "773", "872", // Chicago
    "617", "857", // Boston
    "214", "469", "972", // Dallas
    "713", "281", "832", // Houston
    "480", "602", "623", // Phoenix
];

/// Example Indian mobile numbers offered when an Indian number is rejected.
pub const INDIAN_NUMBER_SUGGESTIONS: &[&str] = &[
    "+91 9876543210",
    "+91 8123456789",
    "+91 7890123456",
    "+91 6987654321",
];

/// Result of checking a user-entered phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhoneCheck {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

/// Normalizes and validates `raw`, explaining why it was rejected if it was.
pub fn check_phone_number(normalizer: &PhoneNormalizer, raw: &str) -> PhoneCheck {
    let formatted = normalizer.normalize(raw);
    if validate(&formatted) {
        return PhoneCheck {
            is_valid: true,
            formatted: Some(formatted),
            error: None,
            suggestions: Vec::new(),
        };
    }

    let (error, suggestions) = match diagnose(&formatted) {
        Some(issue @ (PhoneIssue::UnassignedAreaCode(_) | PhoneIssue::AreaCodeLeadingDigit(_))) => (
            issue.to_string(),
            US_AREA_CODE_SUGGESTIONS
                .iter()
                .take(5)
                .map(|s| s.to_string())
                .collect(),
        ),
        Some(issue @ PhoneIssue::IndianMobilePrefix) => (
            issue.to_string(),
            INDIAN_NUMBER_SUGGESTIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        ),
        // Recognised country shape but a rule without a specific hint (e.g. 555)
        None if is_us_shape(&formatted) || is_indian_shape(&formatted) => {
            (format!("Invalid phone number: {raw}"), Vec::new())
        }
        None => (format!("Invalid phone number: {raw}"), general_suggestions()),
    };

    PhoneCheck {
        is_valid: false,
        formatted: None,
        error: Some(error),
        suggestions,
    }
}

fn general_suggestions() -> Vec<String> {
    INDIAN_NUMBER_SUGGESTIONS
        .iter()
        .take(2)
        .map(|s| s.to_string())
        .chain(
            US_AREA_CODE_SUGGESTIONS
                .iter()
                .take(3)
                .map(|code| format!("+1 {code}12345678")),
        )
        .collect()
}

pub(crate) fn is_us_shape(formatted: &str) -> bool {
    formatted.starts_with("+1") && formatted.len() == 12
}

pub(crate) fn is_indian_shape(formatted: &str) -> bool {
    formatted.starts_with("+91") && formatted.len() == 13
}
