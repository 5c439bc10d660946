//! HTTP endpoints.
//!
//! - `auth` - registration, login and the session extractor (/api/auth/*)
//! - `profile` - the signed-in user's medical profile (/api/profile)
//! - `public` - profile pages reached through the QR code (/api/public/*)
//! - `alert` - emergency alerts and test messages (/api/alert, /api/test-sms)
//! - `phone` - phone number diagnostics (/api/phone/*)
//! - `health` - liveness probe (/healthz)
//! - `openapi` - OpenAPI document served at /api-docs

pub mod alert;
pub mod auth;
pub mod health;
pub mod openapi;
pub mod phone;
pub mod profile;
pub mod public;

pub use alert::ALERTS_TAG;
pub use auth::{AUTH_TAG, CurrentUser};
pub use health::MISC_TAG;
pub use profile::PROFILE_TAG;

use crate::AppResources;
use crate::rate_limit::{RateLimiter, enforce_rate_limit};
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa_redoc::{Redoc, Servable};

/// Wraps every route of `router` with `limiter`.
pub(crate) fn rate_limited(router: OpenApiRouter, limiter: &RateLimiter) -> OpenApiRouter {
    router.layer(axum::middleware::from_fn_with_state(
        limiter.clone(),
        enforce_rate_limit,
    ))
}

/// Builds the complete application router, including the docs UI.
pub fn app_router(resources: AppResources) -> Router {
    let limiters = resources.limiters.clone();
    let (router, api) = OpenApiRouter::with_openapi(openapi::ApiDoc::openapi())
        .nest("/api/auth", auth::router(&limiters))
        .merge(rate_limited(profile::router(), &limiters.general_api))
        .nest(
            "/api/public",
            rate_limited(public::router(), &limiters.public_page),
        )
        .merge(rate_limited(alert::alert_router(), &limiters.alert))
        .merge(rate_limited(alert::test_sms_router(), &limiters.general_api))
        .nest(
            "/api/phone",
            rate_limited(phone::router(), &limiters.general_api),
        )
        .routes(routes!(health::health))
        .layer(axum::Extension(resources))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .split_for_parts();

    router.merge(Redoc::with_url("/api-docs", api))
}

/// Serves the API on `config.listen_addr` until the process exits.
#[tracing::instrument(skip(resources))]
pub async fn start_webserver(resources: AppResources) -> color_eyre::Result<()> {
    let addr = resources.config.listen_addr.clone();
    let router = app_router(resources);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        name = "api.server.listening",
        target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
        addr = %addr,
        message = "Server running"
    );
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .map_err(|e| color_eyre::Report::msg(format!("Failed to start server: {e}")))?;

    Ok(())
}
