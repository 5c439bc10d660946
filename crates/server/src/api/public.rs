//! Profile pages reached by scanning a QR code. No session required.

use crate::AppResources;
use crate::api::PROFILE_TAG;
use crate::error::ApiError;
use crate::profiles::{self, PublicProfile};
use axum::{Extension, Json, extract::Path};
use utoipa_axum::{router::OpenApiRouter, routes};

pub(crate) fn router() -> OpenApiRouter {
    OpenApiRouter::new().routes(routes!(public_profile))
}

#[tracing::instrument(skip_all)]
#[utoipa::path(
    get,
    path = "/{token}",
    tag = PROFILE_TAG,
    operation_id = "Public Profile",
    summary = "Public view of a profile",
    description = "What a first responder sees after scanning the QR code: name, blood type, \
                   allergies, conditions, medications and emergency contacts.",
    params(("token" = String, Path, description = "Public token from the QR code")),
    responses(
        (status = 200, description = "Public profile", body = PublicProfile),
        (status = 404, description = "Unknown token or deactivated account", content_type = "application/json"),
        (status = 429, description = "Too many requests to public pages", content_type = "application/json")
    )
)]
async fn public_profile(
    Extension(resources): Extension<AppResources>,
    Path(token): Path<String>,
) -> Result<Json<PublicProfile>, ApiError> {
    let user = profiles::find_active_by_public_token(&resources.db, &token)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".into()))?;
    Ok(Json(PublicProfile::from(&user)))
}
