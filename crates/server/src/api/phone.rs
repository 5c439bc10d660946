//! Phone number diagnostics for the profile editor.

use crate::AppResources;
use crate::api::PROFILE_TAG;
use crate::error::ApiError;
use crate::phone::{PhoneCheck, check_phone_number};
use axum::{Extension, Json, extract::Query};
use serde::Deserialize;
use utoipa::IntoParams;
use utoipa_axum::{router::OpenApiRouter, routes};

#[derive(Debug, Deserialize, IntoParams)]
pub struct PhoneQuery {
    /// The number as typed, in any format.
    #[serde(default)]
    pub phone: String,
}

pub(crate) fn router() -> OpenApiRouter {
    OpenApiRouter::new().routes(routes!(check_phone))
}

#[tracing::instrument(skip(resources))]
#[utoipa::path(
    get,
    path = "/check",
    params(PhoneQuery),
    tag = PROFILE_TAG,
    operation_id = "Check Phone Number",
    summary = "Normalize and validate a phone number",
    description = "Returns the E.164 form the alert dispatcher would use, whether it would be accepted, \
                   and example numbers when it would not.",
    responses(
        (status = 200, description = "Diagnosis", body = PhoneCheck),
        (status = 400, description = "No number given", content_type = "application/json"),
        (status = 429, description = "API rate limit exceeded", content_type = "application/json")
    )
)]
async fn check_phone(
    Extension(resources): Extension<AppResources>,
    Query(query): Query<PhoneQuery>,
) -> Result<Json<PhoneCheck>, ApiError> {
    if query.phone.trim().is_empty() {
        return Err(ApiError::BadRequest("Phone number is required".into()));
    }
    Ok(Json(check_phone_number(
        resources.dispatcher.normalizer(),
        &query.phone,
    )))
}
