use super::{FieldErrors, Validate};
use crate::alerts::Location;
use crate::auth::PUBLIC_TOKEN_LEN;
use crate::error::FieldError;
use serde::Deserialize;
use utoipa::ToSchema;

pub const MAX_CUSTOM_MESSAGE_LEN: usize = 500;
pub const MAX_ADDRESS_LEN: usize = 500;

/// Body of `POST /api/alert`. Without `publicToken` the caller must be signed in.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertPayload {
    pub public_token: Option<String>,
    pub location: Option<Location>,
    pub custom_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidAlert {
    pub public_token: Option<String>,
    pub location: Option<Location>,
    pub custom_message: Option<String>,
}

impl Validate for AlertPayload {
    type Output = ValidAlert;

    fn validate(self) -> Result<ValidAlert, Vec<FieldError>> {
        let mut errors = FieldErrors::default();

        let public_token = self.public_token.filter(|t| !t.is_empty());
        if let Some(token) = &public_token {
            if token.chars().count() != PUBLIC_TOKEN_LEN {
                errors.push("publicToken", "Invalid public token format");
            }
        }

        if let Some(location) = &self.location {
            check_location(&mut errors, location);
        }

        let custom_message = self.custom_message.filter(|m| !m.trim().is_empty());
        if let Some(message) = &custom_message {
            if message.chars().count() > MAX_CUSTOM_MESSAGE_LEN {
                errors.push("customMessage", "Custom message cannot exceed 500 characters");
            }
        }

        errors.finish(ValidAlert {
            public_token,
            location: self.location,
            custom_message,
        })
    }
}

fn check_location(errors: &mut FieldErrors, location: &Location) {
    if let Some(lat) = location.latitude {
        if !(-90.0..=90.0).contains(&lat) {
            errors.push("location.latitude", "Invalid latitude");
        }
    }
    if let Some(lng) = location.longitude {
        if !(-180.0..=180.0).contains(&lng) {
            errors.push("location.longitude", "Invalid longitude");
        }
    }
    if let Some(address) = &location.address {
        if address.chars().count() > MAX_ADDRESS_LEN {
            errors.push("location.address", "Address cannot exceed 500 characters");
        }
    }

    let partial = location.latitude.is_some() != location.longitude.is_some();
    let has_address = location.address.as_deref().is_some_and(|a| !a.is_empty());
    if partial && !has_address {
        errors.push(
            "location",
            "Either provide both latitude and longitude, or an address, or neither",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> String {
        "ab".repeat(PUBLIC_TOKEN_LEN / 2)
    }

    #[test]
    fn empty_payload_is_an_authenticated_alert() {
        let alert = AlertPayload::default().validate().unwrap();
        assert_eq!(alert.public_token, None);
        assert_eq!(alert.location, None);
    }

    #[test]
    fn token_length_is_exact() {
        let errors = AlertPayload {
            public_token: Some("abc".into()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors[0].field, "publicToken");

        let ok = AlertPayload {
            public_token: Some(token()),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn coordinates_are_range_checked() {
        let errors = AlertPayload {
            location: Some(Location {
                latitude: Some(91.0),
                longitude: Some(-181.0),
                address: None,
            }),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["location.latitude", "location.longitude"]);
    }

    #[test]
    fn partial_coordinates_need_an_address() {
        let partial = Location {
            latitude: Some(12.9),
            longitude: None,
            address: None,
        };
        let errors = AlertPayload {
            location: Some(partial.clone()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors[0].field, "location");

        let with_address = Location {
            address: Some("MG Road, Bengaluru".into()),
            ..partial
        };
        assert!(
            AlertPayload {
                location: Some(with_address),
                ..Default::default()
            }
            .validate()
            .is_ok()
        );
    }

    #[test]
    fn long_custom_message_is_rejected() {
        let errors = AlertPayload {
            custom_message: Some("x".repeat(MAX_CUSTOM_MESSAGE_LEN + 1)),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors[0].field, "customMessage");
    }
}
