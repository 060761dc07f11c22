//! In-app notifications (`notificaciones`)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Someone wrote in one of the recipient's conversations
    NewMessage,

    /// One of the recipient's listings was rated
    NewRating,

    /// A listing the recipient asked about changed status
    ListingStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub kind: NotificationKind,

    /// Kind-specific data (conversation id, listing id, score, ...)
    pub payload: JsonValue,

    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    pub payload: JsonValue,
}

impl Notification {
    pub async fn create(pool: &PgPool, data: CreateNotification) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notificaciones (recipient_id, kind, payload)
            VALUES ($1, $2, $3)
            RETURNING id, recipient_id, kind, payload, read, created_at
            "#,
        )
        .bind(data.recipient_id)
        .bind(data.kind)
        .bind(data.payload)
        .fetch_one(pool)
        .await
    }

    /// Like [`Notification::create`], logging failures instead of returning them
    pub async fn create_best_effort(pool: &PgPool, data: CreateNotification) {
        let recipient_id = data.recipient_id;
        let kind = data.kind;

        if let Err(e) = Self::create(pool, data).await {
            warn!(recipient_id = %recipient_id, kind = ?kind, error = %e, "Failed to write notification");
        }
    }

    /// Newest first
    pub async fn list_for_user(
        pool: &PgPool,
        recipient_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, recipient_id, kind, payload, read, created_at
            FROM notificaciones
            WHERE recipient_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(recipient_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Marks one notification of `recipient_id` as read; false when none matched
    pub async fn mark_read(pool: &PgPool, id: Uuid, recipient_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE notificaciones SET read = TRUE WHERE id = $1 AND recipient_id = $2")
            .bind(id)
            .bind(recipient_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_all_read(pool: &PgPool, recipient_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE notificaciones SET read = TRUE WHERE recipient_id = $1 AND read = FALSE")
            .bind(recipient_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn unread_count(pool: &PgPool, recipient_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM notificaciones WHERE recipient_id = $1 AND read = FALSE")
            .bind(recipient_id)
            .fetch_one(pool)
            .await
    }
}
