//! OpenAPI/Utoipa configuration.

use crate::api::{ALERTS_TAG, AUTH_TAG, MISC_TAG, PROFILE_TAG};
use crate::auth::TOKEN_COOKIE;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
};

/// Documents the two ways a session token can be presented.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        let bearer = HttpBuilder::new()
            .scheme(HttpAuthScheme::Bearer)
            .bearer_format("JWT")
            .description(Some(
                "Session token returned by `/api/auth/register` or `/api/auth/login`.",
            ))
            .build();
        components.add_security_scheme("Authorization", SecurityScheme::Http(bearer));
        components.add_security_scheme(
            "Cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(TOKEN_COOKIE))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "MedGuard API",
        version = "1.0.0",
        description = "Emergency medical profiles, QR-linked public pages and SMS alerts to emergency contacts."
    ),
    tags(
        (name = MISC_TAG, description = "Miscellaneous endpoints"),
        (name = AUTH_TAG, description = "Account and session endpoints"),
        (name = PROFILE_TAG, description = "Medical profile endpoints"),
        (name = ALERTS_TAG, description = "Emergency alert endpoints")
    )
)]
pub struct ApiDoc;
