//! Session resolution
//!
//! A session is a valid access token carried either in the `session` cookie
//! (browser flows) or in an `Authorization: Bearer` header (API clients).
//! The header wins when both are present.
//!
//! # Example
//!
//! ```
//! use axum::http::{header, HeaderMap, HeaderValue};
//! use reciclaje_shared::auth::jwt::{create_token, Claims, TokenType};
//! use reciclaje_shared::auth::session::session_from_headers;
//! use reciclaje_shared::models::role::RoleKind;
//! use uuid::Uuid;
//!
//! let secret = "una-clave-secreta-de-al-menos-32-bytes";
//! let user_id = Uuid::new_v4();
//! let token = create_token(&Claims::new(user_id, RoleKind::Empresa, TokenType::Access), secret).unwrap();
//!
//! let mut headers = HeaderMap::new();
//! headers.insert(header::COOKIE, HeaderValue::from_str(&format!("session={}", token)).unwrap());
//!
//! let auth = session_from_headers(&headers, secret).unwrap();
//! assert_eq!(auth.user_id, user_id);
//! ```

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_access_token, Claims, JwtError};
use crate::models::role::RoleKind;

/// Name of the cookie holding the access token
pub const SESSION_COOKIE: &str = "session";

/// Authenticated caller, inserted into request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,

    /// Role snapshot from the token
    pub role: RoleKind,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
        }
    }
}

/// Why a request has no usable session
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Neither a bearer header nor a session cookie was sent
    #[error("Missing credentials")]
    MissingCredentials,

    /// Authorization header present but not a bearer token
    #[error("{0}")]
    InvalidFormat(String),

    /// Token present but rejected
    #[error("{0}")]
    InvalidToken(String),
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = match self {
            SessionError::InvalidFormat(_) => StatusCode::BAD_REQUEST,
            SessionError::MissingCredentials | SessionError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
        };

        (status, self.to_string()).into_response()
    }
}

/// Extracts the raw token from the request headers
pub fn token_from_headers(headers: &HeaderMap) -> Result<String, SessionError> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| SessionError::InvalidFormat("Invalid authorization header".to_string()))?;

        return value
            .strip_prefix("Bearer ")
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| SessionError::InvalidFormat("Expected Bearer token".to_string()));
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
        .ok_or(SessionError::MissingCredentials)
}

/// Resolves and validates the session carried by a request
pub fn session_from_headers(headers: &HeaderMap, secret: &str) -> Result<AuthContext, SessionError> {
    let token = token_from_headers(headers)?;

    let claims = validate_access_token(&token, secret).map_err(|e| match e {
        JwtError::Expired => SessionError::InvalidToken("Token expired".to_string()),
        other => SessionError::InvalidToken(format!("Invalid token: {}", other)),
    })?;

    Ok(AuthContext::from_claims(&claims))
}

/// Builds the `session` cookie for a freshly issued access token
///
/// No `Max-Age`: the token's own expiry bounds the session.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Cookie to hand to [`CookieJar::remove`] on logout
pub fn session_removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}
