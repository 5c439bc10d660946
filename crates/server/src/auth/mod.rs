//! Session tokens and credentials.
//!
//! Sessions are stateless HS256 JWTs valid for 24 hours, carried either as a
//! `Bearer` token or in the `token` cookie.

pub mod password;

pub use password::{PUBLIC_TOKEN_LEN, generate_public_token, hash_password, verify_password};

use crate::error::AuthError;
use axum::http::{HeaderMap, header};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Name of the cookie holding the session token.
pub const TOKEN_COOKIE: &str = "token";

/// How long an issued session token stays valid.
pub const SESSION_TTL: Duration = Duration::hours(24);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub user_id: i32,
    pub email: String,
    pub iat: usize,
    pub exp: usize,
}

/// Signs and verifies session tokens with one shared secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn sign(&self, user_id: i32, email: &str) -> Result<String, AuthError> {
        let now = OffsetDateTime::now_utc();
        let claims = SessionClaims {
            user_id,
            email: email.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: (now + SESSION_TTL).unix_timestamp() as usize,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let data = decode::<SessionClaims>(token, &self.decoding, &Validation::default())?;
        Ok(data.claims)
    }

    /// Verifies the token found in `headers`, if any.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<SessionClaims, AuthError> {
        let token = token_from_headers(headers).ok_or(AuthError::MissingToken)?;
        self.verify(&token)
    }
}

/// Reads the session token from `Authorization: Bearer …`, falling back to the
/// `token` cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == TOKEN_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value carrying a fresh session token.
pub fn session_cookie(token: &str) -> String {
    format!(
        "{TOKEN_COOKIE}={token}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        SESSION_TTL.whole_seconds()
    )
}

/// `Set-Cookie` value removing the session cookie.
pub fn clear_session_cookie() -> String {
    format!("{TOKEN_COOKIE}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn sign_then_verify() {
        let tokens = TokenService::new(SECRET);
        let token = tokens.sign(7, "sam@example.com").unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.email, "sam@example.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = TokenService::new(SECRET).sign(7, "sam@example.com").unwrap();
        let other = TokenService::new("another-secret-another-secret-xx");
        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; token=xyz"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc"));

        headers.remove(header::AUTHORIZATION);
        assert_eq!(token_from_headers(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn missing_token_is_reported() {
        let tokens = TokenService::new(SECRET);
        assert!(matches!(
            tokens.authenticate(&HeaderMap::new()),
            Err(AuthError::MissingToken)
        ));
    }
}
