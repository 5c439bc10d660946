//! Request body validation.
//!
//! Each request type implements [`Validate`], turning the raw JSON body into a
//! cleaned value or the full list of field errors. Nested fields are reported
//! with dotted paths such as `emergencyContacts.0.phone`.

pub mod account;
pub mod alert;
pub mod profile;

pub use account::{Credentials, LoginRequest, NewAccount, RegisterRequest};
pub use alert::{AlertPayload, ValidAlert};
pub use profile::{ContactInput, ProfileUpdate, ValidProfile};

use crate::error::FieldError;

pub const BLOOD_TYPES: [&str; 8] = ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];

pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_CONTACT_PHONE_DIGITS: usize = 16;

pub trait Validate {
    type Output;

    fn validate(self) -> Result<Self::Output, Vec<FieldError>>;
}

/// Collects every failure before reporting.
#[derive(Debug, Default)]
pub(crate) struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub(crate) fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    /// Length check in characters, not bytes.
    pub(crate) fn check_len(
        &mut self,
        field: &str,
        value: &str,
        (min, too_short): (usize, &str),
        (max, too_long): (usize, &str),
    ) {
        let len = value.chars().count();
        if len < min {
            self.push(field, too_short);
        } else if len > max {
            self.push(field, too_long);
        }
    }

    pub(crate) fn finish<T>(self, value: T) -> Result<T, Vec<FieldError>> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(self.0)
        }
    }
}

/// A pragmatic address check: one `@`, a non-empty local part, and a dotted
/// domain made of letters, digits and hyphens.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || local.starts_with('.') || local.ends_with('.') {
        return false;
    }
    if !domain.contains('.') || domain.contains("..") {
        return false;
    }
    domain.split('.').all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

/// Removes the separators people type into phone fields.
pub fn clean_contact_phone(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
        .collect()
}

/// An optional `+`, then 1 to 16 digits, the first of which is not `0`.
pub fn is_valid_contact_phone(cleaned: &str) -> bool {
    let digits = cleaned.strip_prefix('+').unwrap_or(cleaned);
    match digits.as_bytes().first() {
        Some(b'1'..=b'9') => {}
        _ => return false,
    }
    digits.len() <= MAX_CONTACT_PHONE_DIGITS && digits.bytes().all(|b| b.is_ascii_digit())
}
