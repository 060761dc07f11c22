//! Material listings (`publicaciones`)
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE listing_status AS ENUM ('disponible', 'reservado', 'vendido', 'retirado');
//!
//! CREATE TABLE publicaciones (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     owner_id UUID NOT NULL REFERENCES usuarios(id) ON DELETE CASCADE,
//!     material_id INTEGER NOT NULL REFERENCES materiales(id),
//!     title VARCHAR(150) NOT NULL,
//!     description TEXT,
//!     quantity DOUBLE PRECISION NOT NULL CHECK (quantity > 0),
//!     unit VARCHAR(16) NOT NULL,
//!     price DOUBLE PRECISION CHECK (price IS NULL OR price >= 0),
//!     images TEXT[] NOT NULL DEFAULT '{}',
//!     status listing_status NOT NULL DEFAULT 'disponible',
//!     location_id UUID REFERENCES ubicaciones(id) ON DELETE SET NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! # Status transitions
//!
//! ```text
//! disponible ⇄ reservado → vendido
//! disponible | reservado → retirado → disponible
//! ```
//!
//! `vendido` is final.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Listing availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "listing_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Disponible,
    Reservado,
    Vendido,
    Retirado,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Disponible => "disponible",
            ListingStatus::Reservado => "reservado",
            ListingStatus::Vendido => "vendido",
            ListingStatus::Retirado => "retirado",
        }
    }

    /// Whether an owner may move a listing from `self` to `next`
    ///
    /// Setting the current status again is always allowed.
    pub fn can_transition_to(&self, next: ListingStatus) -> bool {
        use ListingStatus::*;

        if *self == next {
            return true;
        }

        matches!(
            (self, next),
            (Disponible, Reservado)
                | (Disponible, Vendido)
                | (Disponible, Retirado)
                | (Reservado, Disponible)
                | (Reservado, Vendido)
                | (Reservado, Retirado)
                | (Retirado, Disponible)
        )
    }
}

const LISTING_COLUMNS: &str = "id, owner_id, material_id, title, description, quantity, unit, price, \
                               images, status, location_id, created_at, updated_at";

/// Row of `publicaciones`
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Listing {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub material_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub quantity: f64,
    pub unit: String,
    pub price: Option<f64>,

    /// Public URLs of uploaded images
    pub images: Vec<String>,

    pub status: ListingStatus,
    pub location_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing joined with owner, material, city and rating summary
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ListingView {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_name: String,
    pub material_id: i32,
    pub material_name: String,
    pub category: String,
    pub title: String,
    pub description: Option<String>,
    pub quantity: f64,
    pub unit: String,
    pub price: Option<f64>,
    pub images: Vec<String>,
    pub status: ListingStatus,
    pub city: Option<String>,
    pub rating_average: Option<f64>,
    pub rating_count: i64,
    pub created_at: DateTime<Utc>,
}

const LISTING_VIEW_SELECT: &str = r#"
    SELECT p.id, p.owner_id, u.name AS owner_name, p.material_id, m.name AS material_name,
           m.category, p.title, p.description, p.quantity, p.unit, p.price, p.images,
           p.status, l.city,
           (SELECT AVG(v.score)::float8 FROM valoraciones v WHERE v.listing_id = p.id) AS rating_average,
           (SELECT COUNT(*) FROM valoraciones v WHERE v.listing_id = p.id) AS rating_count,
           p.created_at
    FROM publicaciones p
    JOIN usuarios u ON u.id = p.owner_id
    JOIN materiales m ON m.id = p.material_id
    LEFT JOIN ubicaciones l ON l.id = p.location_id
"#;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateListing {
    pub owner_id: Uuid,
    pub material_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub quantity: f64,
    pub unit: String,
    pub price: Option<f64>,
    pub images: Vec<String>,
    pub location_id: Option<Uuid>,
}

/// Owner edits; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateListing {
    pub title: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub price: Option<f64>,
    pub images: Option<Vec<String>>,
    pub status: Option<ListingStatus>,
}

/// Browse filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingFilter {
    pub status: Option<ListingStatus>,
    pub material_id: Option<i32>,
    pub owner_id: Option<Uuid>,

    /// Hide listings of this user (a recycler browsing others' offers)
    pub exclude_owner_id: Option<Uuid>,

    pub category: Option<String>,

    /// Case-insensitive match on title and description
    pub query: Option<String>,

    pub limit: i64,
    pub offset: i64,
}

/// `ILIKE` pattern matching `text` anywhere, with wildcards in `text` taken literally
pub fn contains_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Count of listings per status for one owner
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: ListingStatus,
    pub count: i64,
}

impl Listing {
    pub async fn create(pool: &PgPool, data: CreateListing) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO publicaciones
                 (owner_id, material_id, title, description, quantity, unit, price, images, location_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {}",
            LISTING_COLUMNS
        );

        sqlx::query_as::<_, Listing>(&query)
            .bind(data.owner_id)
            .bind(data.material_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.quantity)
            .bind(data.unit)
            .bind(data.price)
            .bind(data.images)
            .bind(data.location_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM publicaciones WHERE id = $1", LISTING_COLUMNS);

        sqlx::query_as::<_, Listing>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_view(pool: &PgPool, id: Uuid) -> Result<Option<ListingView>, sqlx::Error> {
        let query = format!("{} WHERE p.id = $1", LISTING_VIEW_SELECT);

        sqlx::query_as::<_, ListingView>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Browses listings, newest first
    pub async fn search(pool: &PgPool, filter: &ListingFilter) -> Result<Vec<ListingView>, sqlx::Error> {
        let query = format!(
            r#"{}
            WHERE ($1::listing_status IS NULL OR p.status = $1)
              AND ($2::int IS NULL OR p.material_id = $2)
              AND ($3::uuid IS NULL OR p.owner_id = $3)
              AND ($4::uuid IS NULL OR p.owner_id <> $4)
              AND ($5::text IS NULL OR m.category = $5)
              AND ($6::text IS NULL OR p.title ILIKE $6 ESCAPE '\' OR p.description ILIKE $6 ESCAPE '\')
            ORDER BY p.created_at DESC
            LIMIT $7 OFFSET $8"#,
            LISTING_VIEW_SELECT
        );

        sqlx::query_as::<_, ListingView>(&query)
            .bind(filter.status)
            .bind(filter.material_id)
            .bind(filter.owner_id)
            .bind(filter.exclude_owner_id)
            .bind(filter.category.as_deref())
            .bind(filter.query.as_deref().map(contains_pattern))
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(pool)
            .await
    }

    /// Applies owner edits
    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateListing) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE publicaciones
             SET title = COALESCE($2, title),
                 description = COALESCE($3, description),
                 quantity = COALESCE($4, quantity),
                 unit = COALESCE($5, unit),
                 price = COALESCE($6, price),
                 images = COALESCE($7, images),
                 status = COALESCE($8, status),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            LISTING_COLUMNS
        );

        sqlx::query_as::<_, Listing>(&query)
            .bind(id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.quantity)
            .bind(data.unit)
            .bind(data.price)
            .bind(data.images)
            .bind(data.status)
            .fetch_optional(pool)
            .await
    }

    pub async fn count_by_status_for_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<StatusCount>, sqlx::Error> {
        sqlx::query_as::<_, StatusCount>(
            r#"
            SELECT status, COUNT(*) AS count
            FROM publicaciones
            WHERE owner_id = $1
            GROUP BY status
            ORDER BY status
            "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await
    }
}
