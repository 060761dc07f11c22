//! Listing ratings (`valoraciones`)
//!
//! One rating per rater and listing, enforced by
//! `valoraciones_listing_rater_key`. Owners cannot rate their own listings;
//! that check lives in the caller since the table does not know the owner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

pub const MIN_SCORE: i16 = 1;
pub const MAX_SCORE: i16 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Rating {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub rater_id: Uuid,
    pub score: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Rating with the rater's display name
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RatingView {
    pub id: Uuid,
    pub rater_id: Uuid,
    pub rater_name: String,
    pub score: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRating {
    pub listing_id: Uuid,
    pub rater_id: Uuid,
    pub score: i16,
    pub comment: Option<String>,
}

/// Average and count; `average` is `None` when nothing was rated yet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RatingSummary {
    pub average: Option<f64>,
    pub count: i64,
}

pub fn is_valid_score(score: i16) -> bool {
    (MIN_SCORE..=MAX_SCORE).contains(&score)
}

impl Rating {
    /// Inserts a rating
    ///
    /// A second rating by the same user fails with the
    /// `valoraciones_listing_rater_key` unique violation.
    pub async fn create(pool: &PgPool, data: CreateRating) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Rating>(
            r#"
            INSERT INTO valoraciones (listing_id, rater_id, score, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id, listing_id, rater_id, score, comment, created_at
            "#,
        )
        .bind(data.listing_id)
        .bind(data.rater_id)
        .bind(data.score)
        .bind(data.comment)
        .fetch_one(pool)
        .await
    }

    pub async fn list_by_listing(pool: &PgPool, listing_id: Uuid) -> Result<Vec<RatingView>, sqlx::Error> {
        sqlx::query_as::<_, RatingView>(
            r#"
            SELECT v.id, v.rater_id, u.name AS rater_name, v.score, v.comment, v.created_at
            FROM valoraciones v
            JOIN usuarios u ON u.id = v.rater_id
            WHERE v.listing_id = $1
            ORDER BY v.created_at DESC
            "#,
        )
        .bind(listing_id)
        .fetch_all(pool)
        .await
    }

    pub async fn count_for_listing(pool: &PgPool, listing_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM valoraciones WHERE listing_id = $1")
            .bind(listing_id)
            .fetch_one(pool)
            .await
    }

    /// Summary over every listing owned by `owner_id`
    pub async fn summary_for_owner(pool: &PgPool, owner_id: Uuid) -> Result<RatingSummary, sqlx::Error> {
        sqlx::query_as::<_, RatingSummary>(
            r#"
            SELECT AVG(v.score)::float8 AS average, COUNT(*) AS count
            FROM valoraciones v
            JOIN publicaciones p ON p.id = v.listing_id
            WHERE p.owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(pool)
        .await
    }
}
