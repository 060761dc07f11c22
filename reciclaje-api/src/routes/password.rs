//! Password update endpoint
//!
//! ```text
//! POST /api/update-password
//! Content-Type: application/json
//!
//! { "userId": "8c0e...", "password": "nuevaClave123" }
//! ```
//!
//! Checks run in this order:
//!
//! 1. body is JSON with non-blank `userId` and `password`, else `400`
//! 2. `userId` is a UUID, else `400`
//! 3. a session exists (`401`) and belongs to `userId` (`403`)
//! 4. the password is strong enough, else `422`
//!
//! On success the hash is replaced, a `password_updated` history row is
//! written and a confirmation e-mail is sent when mail is configured. The
//! last two are best effort.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    middleware::session::AuthUser,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use reciclaje_shared::{
    auth::password,
    mail::{password_changed_email, send_best_effort},
    models::{
        history::{History, HistoryAction},
        user::User,
    },
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePasswordRequest {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,

    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdatePasswordResponse {
    pub success: bool,
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub async fn update_password(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    body: Result<Json<UpdatePasswordRequest>, JsonRejection>,
) -> ApiResult<Json<UpdatePasswordResponse>> {
    let Json(req) = body.map_err(|e| {
        debug!(error = %e, "Rejected password update body");
        ApiError::BadRequest("Cuerpo JSON inválido".to_string())
    })?;

    let (Some(user_id), Some(new_password)) = (required(req.user_id), required(req.password)) else {
        return Err(ApiError::BadRequest("userId y password son obligatorios".to_string()));
    };

    let user_id = Uuid::parse_str(user_id.trim()).map_err(|_| ApiError::BadRequest("userId inválido".to_string()))?;

    let AuthUser(auth) = auth.ok_or_else(|| ApiError::Unauthorized("Debes iniciar sesión".to_string()))?;
    if auth.user_id != user_id {
        return Err(ApiError::Forbidden(
            "Solo puedes cambiar tu propia contraseña".to_string(),
        ));
    }

    password::validate_password_strength(&new_password)
        .map_err(|e| ApiError::ValidationError(vec![ValidationErrorDetail::new("password", e)]))?;

    let password_hash = password::hash_password(&new_password)?;

    if !User::update_password(&state.db, user_id, &password_hash).await? {
        return Err(ApiError::NotFound("Usuario no encontrado".to_string()));
    }

    info!(user_id = %user_id, "Password updated");

    History::record_best_effort(&state.db, user_id, HistoryAction::PasswordUpdated, Some(user_id), json!({})).await;

    if let Some(user) = User::find_by_id(&state.db, user_id).await? {
        send_best_effort(state.mailer.as_ref(), password_changed_email(&user.email, &user.name)).await;
    }

    Ok(Json(UpdatePasswordResponse { success: true }))
}
