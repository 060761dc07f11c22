//! Saved pickup/delivery locations (`ubicaciones`)
//!
//! The only table rows are hard-deleted from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Location {
    pub id: Uuid,
    pub user_id: Uuid,
    pub label: String,
    pub address: String,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLocation {
    pub user_id: Uuid,
    pub label: String,
    pub address: String,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Location {
    pub async fn create(pool: &PgPool, data: CreateLocation) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Location>(
            r#"
            INSERT INTO ubicaciones (user_id, label, address, city, latitude, longitude)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, label, address, city, latitude, longitude, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.label)
        .bind(data.address)
        .bind(data.city)
        .bind(data.latitude)
        .bind(data.longitude)
        .fetch_one(pool)
        .await
    }

    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Location>(
            r#"
            SELECT id, user_id, label, address, city, latitude, longitude, created_at
            FROM ubicaciones
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Whether `location_id` belongs to `user_id`
    pub async fn is_owned_by(pool: &PgPool, location_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM ubicaciones WHERE id = $1 AND user_id = $2)")
            .bind(location_id)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Deletes a location owned by `user_id`; false when nothing matched
    pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM ubicaciones WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
