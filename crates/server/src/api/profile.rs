//! The signed-in user's medical profile.

use crate::AppResources;
use crate::api::CurrentUser;
use crate::error::ApiError;
use crate::profiles::{self, ProfileView};
use crate::validation::{ProfileUpdate, Validate};
use axum::{Extension, Json};
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Tag for OpenAPI documentation.
pub const PROFILE_TAG: &str = "Profile API";

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub profile: ProfileView,
}

pub(crate) fn router() -> OpenApiRouter {
    OpenApiRouter::new().routes(routes!(get_profile, update_profile))
}

#[tracing::instrument(skip_all)]
#[utoipa::path(
    get,
    path = "/api/profile",
    tag = PROFILE_TAG,
    operation_id = "Get Profile",
    summary = "Fetch the medical profile",
    responses(
        (status = 200, description = "The profile and its public page link", body = ProfileResponse),
        (status = 401, description = "Missing or invalid session", content_type = "application/json"),
        (status = 404, description = "Account no longer active", content_type = "application/json"),
        (status = 429, description = "API rate limit exceeded", content_type = "application/json")
    ),
    security(("Authorization" = []), ("Cookie" = []))
)]
async fn get_profile(
    Extension(resources): Extension<AppResources>,
    CurrentUser(user): CurrentUser,
) -> Json<ProfileResponse> {
    let public_url = resources.config.public_url(&user.public_token);
    Json(ProfileResponse {
        success: true,
        message: None,
        profile: ProfileView::new(&user, public_url),
    })
}

#[tracing::instrument(skip_all)]
#[utoipa::path(
    put,
    path = "/api/profile",
    tag = PROFILE_TAG,
    operation_id = "Update Profile",
    summary = "Replace the medical profile",
    description = "Replaces name, blood type, allergies, conditions, medications and emergency contacts. \
                   Blank list entries are dropped and contact phone numbers are stored without separators.",
    request_body(content = ProfileUpdate, description = "The complete profile"),
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 400, description = "Validation failed", content_type = "application/json"),
        (status = 401, description = "Missing or invalid session", content_type = "application/json"),
        (status = 404, description = "Account no longer active", content_type = "application/json"),
        (status = 429, description = "API rate limit exceeded", content_type = "application/json")
    ),
    security(("Authorization" = []), ("Cookie" = []))
)]
async fn update_profile(
    Extension(resources): Extension<AppResources>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = payload.validate().map_err(ApiError::Validation)?;
    let updated = profiles::update_profile(&resources.db, user, profile).await?;

    let public_url = resources.config.public_url(&updated.public_token);
    Ok(Json(ProfileResponse {
        success: true,
        message: Some("Profile updated successfully".into()),
        profile: ProfileView::new(&updated, public_url),
    }))
}
