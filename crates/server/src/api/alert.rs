//! Emergency alerts and test messages.
//!
//! - `/api/alert` - message every emergency contact of a profile
//! - `/api/test-sms` - send a fixed message to one number

use crate::AppResources;
use crate::alerts::{AlertRequest, AlertResult, TestSmsOutcome};
use crate::entity::user;
use crate::error::{ApiError, AuthError};
use crate::profiles;
use crate::validation::{AlertPayload, Validate};
use axum::{
    Extension, Json,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Tag for OpenAPI documentation.
pub const ALERTS_TAG: &str = "Alerts API";

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertResponse {
    pub success: bool,
    pub message: String,
    /// Contacts that were messaged.
    pub alerts_sent: usize,
    /// True when triggered through the public token rather than a session.
    pub is_public: bool,
    pub results: Vec<AlertResult>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AlertFailure {
    pub message: String,
    pub details: Vec<AlertResult>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct TestSmsRequest {
    pub test_number: Option<String>,
}

pub(crate) fn alert_router() -> OpenApiRouter {
    OpenApiRouter::new().routes(routes!(send_alert))
}

pub(crate) fn test_sms_router() -> OpenApiRouter {
    OpenApiRouter::new().routes(routes!(send_test_sms))
}

/// Finds whose contacts to message: the public token's owner, else the
/// session's user.
async fn resolve_patient(
    resources: &AppResources,
    headers: &HeaderMap,
    public_token: Option<&str>,
) -> Result<user::Model, ApiError> {
    if let Some(token) = public_token {
        return profiles::find_active_by_public_token(&resources.db, token)
            .await?
            .ok_or_else(|| ApiError::NotFound("Invalid public token".into()));
    }

    let claims = resources
        .tokens
        .authenticate(headers)
        .map_err(|e| match e {
            AuthError::MissingToken => {
                ApiError::Unauthorized("Authentication required or public token missing".into())
            }
            other => other.into(),
        })?;
    profiles::find_active_by_id(&resources.db, claims.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))
}

#[tracing::instrument(skip_all)]
#[utoipa::path(
    post,
    path = "/api/alert",
    tag = ALERTS_TAG,
    operation_id = "Send Emergency Alert",
    summary = "Text every emergency contact",
    description = "Sends one SMS per emergency contact of the profile identified by `publicToken`, or of the \
                   signed-in user when no token is given. Contacts are attempted in order and one failure \
                   never stops the rest. Responds 500 only when no contact could be messaged.",
    request_body(content = AlertPayload, description = "Who is in trouble and where"),
    responses(
        (status = 200, description = "At least one contact was messaged", body = AlertResponse),
        (status = 400, description = "Validation failed or no emergency contacts", content_type = "application/json"),
        (status = 401, description = "No public token and no valid session", content_type = "application/json"),
        (status = 404, description = "Unknown public token or inactive account", content_type = "application/json"),
        (status = 429, description = "Too many alert requests", content_type = "application/json"),
        (status = 500, description = "No contact could be messaged", body = AlertFailure)
    )
)]
async fn send_alert(
    Extension(resources): Extension<AppResources>,
    headers: HeaderMap,
    Json(payload): Json<AlertPayload>,
) -> Result<Response, ApiError> {
    let alert = payload.validate().map_err(ApiError::Validation)?;
    let is_public = alert.public_token.is_some();
    let patient = resolve_patient(&resources, &headers, alert.public_token.as_deref()).await?;

    let contacts = patient.emergency_contacts();
    if contacts.is_empty() {
        return Err(ApiError::BadRequest("No emergency contacts configured".into()));
    }

    let outcome = resources
        .dispatcher
        .send_emergency_alert(&AlertRequest {
            patient_name: patient.name.clone(),
            location: alert.location,
            emergency_contacts: contacts,
            custom_message: alert.custom_message,
        })
        .await;

    tracing::info!(
        name = "api.alert.dispatched",
        target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
        user_id = patient.id,
        is_public,
        success = outcome.success,
        message = "Emergency alert processed"
    );

    if !outcome.success {
        let failure = AlertFailure {
            message: outcome.message,
            details: outcome.results,
        };
        return Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(failure)).into_response());
    }

    Ok(Json(AlertResponse {
        success: true,
        alerts_sent: outcome.sent_count(),
        message: outcome.message,
        is_public,
        results: outcome.results,
    })
    .into_response())
}

#[tracing::instrument(skip_all)]
#[utoipa::path(
    post,
    path = "/api/test-sms",
    tag = ALERTS_TAG,
    operation_id = "Send Test SMS",
    summary = "Check the SMS setup",
    description = "Sends a fixed test message to `testNumber` exactly as given.",
    request_body(content = TestSmsRequest, description = "Destination number"),
    responses(
        (status = 200, description = "Message accepted by the provider", body = TestSmsOutcome),
        (status = 400, description = "No number given", body = TestSmsOutcome),
        (status = 429, description = "API rate limit exceeded", content_type = "application/json"),
        (status = 500, description = "Provider unavailable or rejected the message", body = TestSmsOutcome)
    )
)]
async fn send_test_sms(
    Extension(resources): Extension<AppResources>,
    Json(payload): Json<TestSmsRequest>,
) -> (StatusCode, Json<TestSmsOutcome>) {
    let Some(number) = payload.test_number.filter(|n| !n.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(TestSmsOutcome {
                success: false,
                message: "Test phone number is required".into(),
                result: None,
            }),
        );
    };

    let outcome = resources.dispatcher.send_test_sms(&number).await;
    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(outcome))
}
