use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum SmsError {
    #[error("SMS provider not configured: {0}")]
    NotConfigured(&'static str),
    #[error("Network error: {0}")]
    Network(String),
    #[error("{message}")]
    Vendor {
        status: u16,
        code: Option<i64>,
        message: String,
    },
    #[error("Unexpected response from SMS provider: {0}")]
    InvalidResponse(String),
}

impl SmsError {
    /// Errors where the message may be accepted if sent again later.
    pub fn is_retryable(&self) -> bool {
        match self {
            SmsError::Network(_) => true,
            SmsError::Vendor { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for SmsError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SmsError::InvalidResponse(e.to_string())
        } else {
            SmsError::Network(e.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    MissingToken,
    #[error("Invalid or expired token")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("Password hashing failed: {0}")]
    Hash(String),
    #[error("Token signing failed: {0}")]
    Signing(String),
    #[error("Random number generation failed: {0}")]
    Rng(String),
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors returned by HTTP handlers, rendered as `{message, errors?}` JSON.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Hash(_) | AuthError::Signing(_) | AuthError::Rng(_) => ApiError::Internal(e.to_string()),
            _ => ApiError::Unauthorized(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation(errors) => json!({
                "message": self.to_string(),
                "errors": errors,
            }),
            ApiError::Database(e) => {
                tracing::error!(
                    name = "api.error.database",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    error = %e,
                    message = "Database error while handling request"
                );
                json!({ "message": "Internal server error" })
            }
            _ => json!({ "message": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
