//! Authentication endpoints
//!
//! - `POST /v1/auth/register`: create an account and start a session
//! - `POST /v1/auth/login`: start a session
//! - `POST /v1/auth/logout`: drop the session cookie
//! - `POST /v1/auth/refresh`: new access token from a refresh token
//! - `GET /v1/roles`: roles offered on the registration form
//!
//! Register, login and refresh set the `session` cookie and also return the
//! tokens in the body for API clients.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::CookieJar;
use reciclaje_shared::{
    auth::{
        jwt::{self, Claims, TokenType},
        password,
        session::{session_cookie, session_removal_cookie},
    },
    models::{
        role::{Role, RoleKind},
        user::{CreateUser, User},
    },
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Correo inválido"))]
    pub email: String,

    /// Strength is checked separately
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "El nombre debe tener entre 1 y 100 caracteres"))]
    pub name: String,

    /// `persona_natural`, `reciclador` or `empresa`
    pub role: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Correo inválido"))]
    pub email: String,

    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Tokens issued on register and login
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user_id: Uuid,
    pub role: RoleKind,
    pub access_token: String,
    pub refresh_token: String,

    /// Seconds until the access token expires
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoleOption {
    pub id: i32,
    pub kind: RoleKind,
    pub label: String,
    pub description: Option<String>,
}

fn issue_session(state: &AppState, jar: CookieJar, user_id: Uuid, role: RoleKind) -> ApiResult<(CookieJar, SessionResponse)> {
    let access_claims = Claims::new(user_id, role, TokenType::Access);
    let refresh_claims = Claims::new(user_id, role, TokenType::Refresh);

    let access_token = jwt::create_token(&access_claims, state.jwt_secret())?;
    let refresh_token = jwt::create_token(&refresh_claims, state.jwt_secret())?;

    let jar = jar.add(session_cookie(access_token.clone(), state.config.production));

    Ok((
        jar,
        SessionResponse {
            user_id,
            role,
            access_token,
            refresh_token,
            expires_in: access_claims.seconds_until_expiration(),
        },
    ))
}

/// Register a new account
///
/// ```text
/// POST /v1/auth/register
/// { "email": "ana@example.com", "password": "reciclo2024", "name": "Ana", "role": "reciclador" }
/// ```
///
/// # Errors
///
/// - `400`: role is not one of the public roles
/// - `409`: email already registered
/// - `422`: validation failed or weak password
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, CookieJar, Json<SessionResponse>)> {
    req.validate()?;

    password::validate_password_strength(&req.password)
        .map_err(|e| ApiError::ValidationError(vec![ValidationErrorDetail::new("password", e)]))?;

    let kind = RoleKind::from_role_name(&req.role)
        .filter(RoleKind::is_public)
        .ok_or_else(|| ApiError::BadRequest("Rol inválido".to_string()))?;

    let role = Role::find_by_kind(&state.db, kind)
        .await?
        .ok_or_else(|| ApiError::InternalError(format!("Role {} is not seeded", kind.as_str())))?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            name: req.name,
            role_id: role.id,
            password_hash,
        },
    )
    .await?;

    info!(user_id = %user.id, role = kind.as_str(), "User registered");

    let (jar, body) = issue_session(&state, jar, user.id, kind)?;
    Ok((StatusCode::CREATED, jar, Json(body)))
}

/// Log in with email and password
///
/// # Errors
///
/// - `401`: unknown email or wrong password (same message for both)
/// - `422`: malformed email
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Json<SessionResponse>)> {
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Correo o contraseña incorrectos".to_string());

    let user = User::find_by_email(&state.db, &req.email).await?.ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(invalid());
    }

    let role = User::find_with_role(&state.db, user.id)
        .await?
        .and_then(|u| u.role_kind())
        .unwrap_or(RoleKind::PersonaNatural);

    User::update_last_login(&state.db, user.id).await?;

    info!(user_id = %user.id, "User logged in");

    let (jar, body) = issue_session(&state, jar, user.id, role)?;
    Ok((jar, Json(body)))
}

/// Drop the session cookie; always succeeds
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    (jar.remove(session_removal_cookie()), StatusCode::NO_CONTENT)
}

/// Exchange a refresh token for a new access token
///
/// # Errors
///
/// - `401`: invalid, expired, or not a refresh token
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<(CookieJar, Json<RefreshResponse>)> {
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;
    let expires_in = jwt::validate_access_token(&access_token, state.jwt_secret())?.seconds_until_expiration();

    let jar = jar.add(session_cookie(access_token.clone(), state.config.production));

    Ok((jar, Json(RefreshResponse { access_token, expires_in })))
}

/// Roles a visitor can register as
pub async fn list_roles(State(state): State<AppState>) -> ApiResult<Json<Vec<RoleOption>>> {
    let roles = Role::list(&state.db)
        .await?
        .into_iter()
        .filter_map(|role| {
            let kind = role.kind().filter(RoleKind::is_public)?;
            Some(RoleOption {
                id: role.id,
                kind,
                label: kind.label().to_string(),
                description: role.description,
            })
        })
        .collect();

    Ok(Json(roles))
}
