//! Account endpoints and the session extractor.
//!
//! - `/register` - create an account and start a session
//! - `/login` - start a session
//! - `/logout` - clear the session cookie
//! - `/me` - the signed-in user

use crate::api::rate_limited;
use crate::auth::{
    clear_session_cookie, generate_public_token, hash_password, session_cookie, verify_password,
};
use crate::entity::user;
use crate::error::ApiError;
use crate::profiles::{self, ProfileView, UserSummary};
use crate::rate_limit::RateLimiters;
use crate::validation::{LoginRequest, RegisterRequest, Validate};
use crate::AppResources;
use axum::{
    Extension, Json,
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use sea_orm::SqlErr;
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Tag for OpenAPI documentation.
pub const AUTH_TAG: &str = "Auth API";

const DUPLICATE_EMAIL: &str = "User already exists with this email";
const BAD_CREDENTIALS: &str = "Invalid email or password";

/// The active user behind the request's session token.
///
/// Rejects with 401 when the token is missing or invalid and 404 when the
/// account no longer exists or was deactivated.
pub struct CurrentUser(pub user::Model);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let resources = parts
            .extensions
            .get::<AppResources>()
            .cloned()
            .ok_or_else(|| {
                tracing::error!(
                    name = "api.auth.missing_resources",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    message = "AppResources not found in extensions"
                );
                ApiError::Internal("Internal server error".into())
            })?;

        let claims = resources.tokens.authenticate(&parts.headers)?;
        let user = profiles::find_active_by_id(&resources.db, claims.user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
        Ok(CurrentUser(user))
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub success: bool,
    pub message: String,
    /// Same value as the `token` cookie, for clients that send a bearer header.
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub success: bool,
    pub user: ProfileView,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: String,
}

/// Register and login share the auth limiter; the rest use the general one.
pub(crate) fn router(limiters: &RateLimiters) -> OpenApiRouter {
    let credentials = OpenApiRouter::new()
        .routes(routes!(register))
        .routes(routes!(login));
    let session = OpenApiRouter::new()
        .routes(routes!(logout))
        .routes(routes!(me));

    rate_limited(credentials, &limiters.auth).merge(rate_limited(session, &limiters.general_api))
}

fn start_session(
    resources: &AppResources,
    user: &user::Model,
    status: StatusCode,
    message: &str,
) -> Result<Response, ApiError> {
    let token = resources.tokens.sign(user.id, &user.email)?;
    let cookie = session_cookie(&token);
    Ok((
        status,
        [(header::SET_COOKIE, cookie)],
        Json(SessionResponse {
            success: true,
            message: message.to_string(),
            token,
            user: UserSummary::from(user),
        }),
    )
        .into_response())
}

#[tracing::instrument(skip(resources, payload))]
#[utoipa::path(
    post,
    path = "/register",
    tag = AUTH_TAG,
    operation_id = "Register",
    summary = "Create an account",
    description = "Creates an account with an empty medical profile and a fresh public token, then starts a session.",
    request_body(content = RegisterRequest, description = "New account details"),
    responses(
        (status = 201, description = "Account created; session cookie set", body = SessionResponse),
        (status = 400, description = "Validation failed", content_type = "application/json"),
        (status = 409, description = "Email already registered", content_type = "application/json"),
        (status = 429, description = "Too many authentication attempts", content_type = "application/json")
    )
)]
async fn register(
    Extension(resources): Extension<AppResources>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = payload.validate().map_err(ApiError::Validation)?;

    if profiles::find_by_email(&resources.db, &account.email)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(DUPLICATE_EMAIL.into()));
    }

    let password_hash = hash_password(&account.password)?;
    let public_token = generate_public_token()?;
    let user = profiles::create_user(&resources.db, &account, password_hash, public_token)
        .await
        .map_err(|e| match e.sql_err() {
            // lost a race with a concurrent registration
            Some(SqlErr::UniqueConstraintViolation(_)) => ApiError::Conflict(DUPLICATE_EMAIL.into()),
            _ => ApiError::Database(e),
        })?;

    tracing::info!(
        name = "api.auth.registered",
        target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
        user_id = user.id,
        message = "User registered"
    );
    start_session(&resources, &user, StatusCode::CREATED, "Registration successful")
}

#[tracing::instrument(skip(resources, payload))]
#[utoipa::path(
    post,
    path = "/login",
    tag = AUTH_TAG,
    operation_id = "Login",
    summary = "Start a session",
    request_body(content = LoginRequest, description = "Email and password"),
    responses(
        (status = 200, description = "Logged in; session cookie set", body = SessionResponse),
        (status = 400, description = "Validation failed", content_type = "application/json"),
        (status = 401, description = "Wrong credentials or deactivated account", content_type = "application/json"),
        (status = 429, description = "Too many authentication attempts", content_type = "application/json")
    )
)]
async fn login(
    Extension(resources): Extension<AppResources>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let credentials = payload.validate().map_err(ApiError::Validation)?;

    let user = profiles::find_by_email(&resources.db, &credentials.email)
        .await?
        .filter(|u| u.is_active)
        .filter(|u| verify_password(&credentials.password, &u.password_hash));
    let Some(user) = user else {
        tracing::warn!(
            name = "api.auth.login_failed",
            target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
            message = "Rejected login attempt"
        );
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.into()));
    };

    start_session(&resources, &user, StatusCode::OK, "Login successful")
}

#[tracing::instrument]
#[utoipa::path(
    post,
    path = "/logout",
    tag = AUTH_TAG,
    operation_id = "Logout",
    summary = "Clear the session cookie",
    responses(
        (status = 200, description = "Session cookie cleared", body = LogoutResponse)
    )
)]
async fn logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(LogoutResponse {
            success: true,
            message: "Logout successful".into(),
        }),
    )
}

#[tracing::instrument(skip_all)]
#[utoipa::path(
    get,
    path = "/me",
    tag = AUTH_TAG,
    operation_id = "Current User",
    summary = "The signed-in user",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Missing or invalid session", content_type = "application/json"),
        (status = 404, description = "Account no longer active", content_type = "application/json")
    ),
    security(("Authorization" = []), ("Cookie" = []))
)]
async fn me(
    Extension(resources): Extension<AppResources>,
    CurrentUser(user): CurrentUser,
) -> Json<MeResponse> {
    let public_url = resources.config.public_url(&user.public_token);
    Json(MeResponse {
        success: true,
        user: ProfileView::new(&user, public_url),
    })
}
