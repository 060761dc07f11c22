//! Notification feed
//!
//! - `GET /v1/notifications?limit&offset`
//! - `POST /v1/notifications/:id/read`
//! - `POST /v1/notifications/read-all`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::session::AuthUser,
    routes::Pagination,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use reciclaje_shared::models::notification::Notification;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationFeed {
    pub notifications: Vec<Notification>,
    pub unread: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkAllResponse {
    pub updated: u64,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<NotificationFeed>> {
    let (limit, offset) = page.clamp();

    let notifications = Notification::list_for_user(&state.db, auth.user_id, limit, offset).await?;
    let unread = Notification::unread_count(&state.db, auth.user_id).await?;

    Ok(Json(NotificationFeed { notifications, unread }))
}

/// `404` for unknown ids and for other users' notifications
pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !Notification::mark_read(&state.db, id, auth.user_id).await? {
        return Err(ApiError::NotFound("Notificación no encontrada".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_read(State(state): State<AppState>, AuthUser(auth): AuthUser) -> ApiResult<Json<MarkAllResponse>> {
    let updated = Notification::mark_all_read(&state.db, auth.user_id).await?;
    Ok(Json(MarkAllResponse { updated }))
}
