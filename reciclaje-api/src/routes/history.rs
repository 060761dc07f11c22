//! `GET /v1/history?limit&offset`: the caller's activity log, newest first

use crate::{app::AppState, error::ApiResult, middleware::session::AuthUser, routes::Pagination};
use axum::{
    extract::{Query, State},
    Json,
};
use reciclaje_shared::models::history::History;

pub async fn list_history(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<History>>> {
    let (limit, offset) = page.clamp();
    Ok(Json(History::list_by_user(&state.db, auth.user_id, limit, offset).await?))
}
