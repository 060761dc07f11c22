//! Per-user activity log (`historial`)
//!
//! Rows are written after the action they describe, outside its transaction.
//! Callers use [`History::record_best_effort`] so a failed log write never
//! fails the action itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "history_action", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    ListingCreated,
    ListingUpdated,
    RatingCreated,
    LocationCreated,
    LocationDeleted,
    PasswordUpdated,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct History {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: HistoryAction,
    pub entity_id: Option<Uuid>,
    pub detail: JsonValue,
    pub created_at: DateTime<Utc>,
}

impl History {
    pub async fn record(
        pool: &PgPool,
        user_id: Uuid,
        action: HistoryAction,
        entity_id: Option<Uuid>,
        detail: JsonValue,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, History>(
            r#"
            INSERT INTO historial (user_id, action, entity_id, detail)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, action, entity_id, detail, created_at
            "#,
        )
        .bind(user_id)
        .bind(action)
        .bind(entity_id)
        .bind(detail)
        .fetch_one(pool)
        .await
    }

    /// Like [`History::record`], logging failures instead of returning them
    pub async fn record_best_effort(
        pool: &PgPool,
        user_id: Uuid,
        action: HistoryAction,
        entity_id: Option<Uuid>,
        detail: JsonValue,
    ) {
        if let Err(e) = Self::record(pool, user_id, action, entity_id, detail).await {
            warn!(user_id = %user_id, action = ?action, error = %e, "Failed to write history entry");
        }
    }

    /// Newest first
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, History>(
            r#"
            SELECT id, user_id, action, entity_id, detail, created_at
            FROM historial
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }
}
