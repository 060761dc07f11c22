//! Profile endpoints
//!
//! - `GET /v1/users/me`: own account
//! - `PATCH /v1/users/me`: edit name, phone, avatar and bio
//! - `GET /v1/users/:id`: public profile in the user's role variant

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::session::AuthUser,
};
use axum::{
    extract::{Path, State},
    Json,
};
use reciclaje_shared::{
    models::user::{PublicUser, UpdateProfile, User},
    profile::{build_profile, Audience, ProfileView},
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "El nombre debe tener entre 1 y 100 caracteres"))]
    pub name: Option<String>,

    #[validate(length(max = 32, message = "Teléfono demasiado largo"))]
    pub phone: Option<String>,

    #[validate(url(message = "URL de avatar inválida"))]
    pub avatar_url: Option<String>,

    #[validate(length(max = 1000, message = "La biografía no puede superar 1000 caracteres"))]
    pub bio: Option<String>,
}

impl From<UpdateProfileRequest> for UpdateProfile {
    fn from(req: UpdateProfileRequest) -> Self {
        let trimmed = |v: Option<String>| v.map(|s| s.trim().to_string());

        UpdateProfile {
            name: trimmed(req.name),
            phone: trimmed(req.phone),
            avatar_url: trimmed(req.avatar_url),
            bio: trimmed(req.bio),
        }
    }
}

fn user_not_found() -> ApiError {
    ApiError::NotFound("Usuario no encontrado".to_string())
}

pub async fn get_me(State(state): State<AppState>, AuthUser(auth): AuthUser) -> ApiResult<Json<PublicUser>> {
    let user = User::find_with_role(&state.db, auth.user_id).await?.ok_or_else(user_not_found)?;
    Ok(Json(user))
}

pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<PublicUser>> {
    req.validate()?;

    let update = UpdateProfile::from(req);
    if update.is_empty() {
        return Err(ApiError::BadRequest("No hay cambios que guardar".to_string()));
    }

    let user = User::update_profile(&state.db, auth.user_id, update)
        .await?
        .ok_or_else(user_not_found)?;

    info!(user_id = %auth.user_id, "Profile updated");
    Ok(Json(user))
}

/// Public profile; no session needed
pub async fn get_user(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<ProfileView>> {
    let mut user = User::find_with_role(&state.db, id).await?.ok_or_else(user_not_found)?;

    // Contact details stay private.
    user.email = String::new();
    user.phone = None;

    let view = build_profile(&state.db, user, Audience::Public).await?;
    Ok(Json(view))
}
