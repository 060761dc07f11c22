//! Session resolution and the protected-path guard
//!
//! [`route_guard`] runs on every request:
//!
//! ```text
//! request
//!   ├─ valid session (cookie or bearer) ─▶ AuthContext into extensions
//!   ├─ static asset ─────────────────────▶ pass
//!   ├─ protected prefix, no session ─────▶ 307 /login?redirect=<path>
//!   └─ otherwise ────────────────────────▶ pass
//! ```
//!
//! Handlers that need a user take an [`AuthUser`] argument; it reads the
//! context the guard stored and rejects with `401` when there is none.

use crate::{app::AppState, error::ApiError};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use reciclaje_shared::auth::{
    guard::GuardDecision,
    session::{session_from_headers, AuthContext, SessionError},
};
use tracing::debug;

/// Resolves the session and redirects visitors away from protected paths
pub async fn route_guard(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let session = session_from_headers(req.headers(), state.jwt_secret());

    let has_session = match session {
        Ok(auth) => {
            req.extensions_mut().insert(auth);
            true
        }
        Err(SessionError::MissingCredentials) => false,
        Err(e) => {
            debug!(error = %e, path = %req.uri().path(), "Ignoring invalid session");
            false
        }
    };

    match state.config.guard.check(req.uri().path(), has_session) {
        GuardDecision::Allow => next.run(req).await,
        GuardDecision::Redirect(location) => {
            debug!(path = %req.uri().path(), location = %location, "Redirecting visitor without session");
            Redirect::temporary(&location).into_response()
        }
    }
}

/// The authenticated caller
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .map(AuthUser)
            .ok_or_else(|| ApiError::Unauthorized("Debes iniciar sesión".to_string()))
    }
}
