use super::{FieldErrors, MAX_EMAIL_LEN, Validate, is_valid_email};
use crate::error::FieldError;
use serde::Deserialize;
use utoipa::ToSchema;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 128;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// A registration that passed validation. `email` is lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Validate for RegisterRequest {
    type Output = NewAccount;

    fn validate(self) -> Result<NewAccount, Vec<FieldError>> {
        let mut errors = FieldErrors::default();

        let name = self.name.trim().to_string();
        errors.check_len(
            "name",
            &name,
            (1, "Name is required"),
            (100, "Name cannot exceed 100 characters"),
        );

        let email = check_email(&mut errors, &self.email);
        if email.chars().count() > MAX_EMAIL_LEN {
            errors.push("email", "Email cannot exceed 254 characters");
        }

        errors.check_len(
            "password",
            &self.password,
            (MIN_PASSWORD_LEN, "Password must be at least 6 characters"),
            (MAX_PASSWORD_LEN, "Password cannot exceed 128 characters"),
        );
        if self.password != self.confirm_password {
            errors.push("confirmPassword", "Passwords don't match");
        }

        errors.finish(NewAccount {
            name,
            email,
            password: self.password,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    type Output = Credentials;

    fn validate(self) -> Result<Credentials, Vec<FieldError>> {
        let mut errors = FieldErrors::default();
        let email = check_email(&mut errors, &self.email);
        if self.password.is_empty() {
            errors.push("password", "Password is required");
        }
        errors.finish(Credentials {
            email,
            password: self.password,
        })
    }
}

fn check_email(errors: &mut FieldErrors, raw: &str) -> String {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        errors.push("email", "Email is required");
    } else if !is_valid_email(&email) && email.chars().count() <= MAX_EMAIL_LEN {
        errors.push("email", "Please enter a valid email address");
    }
    email
}
