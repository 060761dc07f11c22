//! Listing ratings
//!
//! - `GET /v1/listings/:id/ratings`
//! - `POST /v1/listings/:id/ratings` `{score, comment?}`
//!
//! A user rates a listing at most once and never their own.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    middleware::session::AuthUser,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use reciclaje_shared::models::{
    history::{History, HistoryAction},
    listing::Listing,
    notification::{CreateNotification, Notification, NotificationKind},
    rating::{is_valid_score, CreateRating, Rating, RatingView, MAX_SCORE, MIN_SCORE},
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRatingRequest {
    pub score: i16,

    #[validate(length(max = 1000, message = "El comentario no puede superar 1000 caracteres"))]
    pub comment: Option<String>,
}

fn check_score(score: i16) -> ApiResult<()> {
    if !is_valid_score(score) {
        return Err(ApiError::ValidationError(vec![ValidationErrorDetail::new(
            "score",
            format!("La puntuación debe estar entre {} y {}", MIN_SCORE, MAX_SCORE),
        )]));
    }
    Ok(())
}

fn listing_not_found() -> ApiError {
    ApiError::NotFound("Publicación no encontrada".to_string())
}

pub async fn list_ratings(State(state): State<AppState>, Path(listing_id): Path<Uuid>) -> ApiResult<Json<Vec<RatingView>>> {
    if Listing::find_by_id(&state.db, listing_id).await?.is_none() {
        return Err(listing_not_found());
    }

    Ok(Json(Rating::list_by_listing(&state.db, listing_id).await?))
}

/// Rate a listing
///
/// # Errors
///
/// - `403`: the listing belongs to the caller
/// - `404`: unknown listing
/// - `409`: the caller already rated it
/// - `422`: score outside 1..=5 or comment too long
pub async fn create_rating(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(listing_id): Path<Uuid>,
    Json(req): Json<CreateRatingRequest>,
) -> ApiResult<(StatusCode, Json<Rating>)> {
    check_score(req.score)?;
    req.validate()?;

    let listing = Listing::find_by_id(&state.db, listing_id)
        .await?
        .ok_or_else(listing_not_found)?;

    if listing.owner_id == auth.user_id {
        return Err(ApiError::Forbidden("No puedes valorar tu propia publicación".to_string()));
    }

    let rating = Rating::create(
        &state.db,
        CreateRating {
            listing_id,
            rater_id: auth.user_id,
            score: req.score,
            comment: req.comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
        },
    )
    .await?;

    info!(user_id = %auth.user_id, listing_id = %listing_id, score = rating.score, "Listing rated");

    Notification::create_best_effort(
        &state.db,
        CreateNotification {
            recipient_id: listing.owner_id,
            kind: NotificationKind::NewRating,
            payload: json!({
                "listing_id": listing_id,
                "title": listing.title,
                "rater_id": auth.user_id,
                "score": rating.score,
            }),
        },
    )
    .await;

    History::record_best_effort(
        &state.db,
        auth.user_id,
        HistoryAction::RatingCreated,
        Some(listing_id),
        json!({ "rating_id": rating.id, "score": rating.score }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(rating)))
}
