//! Messages inside a conversation (`mensajes`)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::conversation::Conversation;

/// Upper bound on a message body, in characters
pub const MAX_MESSAGE_LENGTH: usize = 4000;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Appends a message row; the conversation cache is not touched
    pub async fn insert(
        executor: impl PgExecutor<'_>,
        conversation_id: Uuid,
        sender_id: Uuid,
        body: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO mensajes (conversation_id, sender_id, body)
            VALUES ($1, $2, $3)
            RETURNING id, conversation_id, sender_id, body, read, created_at
            "#,
        )
        .bind(conversation_id)
        .bind(sender_id)
        .bind(body)
        .fetch_one(executor)
        .await
    }

    /// Appends a message and refreshes the conversation cache in one transaction
    pub async fn send(
        pool: &PgPool,
        conversation_id: Uuid,
        sender_id: Uuid,
        body: &str,
    ) -> Result<(Self, Conversation), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let message = Self::insert(&mut *tx, conversation_id, sender_id, body).await?;
        let conversation = Conversation::record_message(&mut *tx, conversation_id, sender_id, body).await?;

        tx.commit().await?;
        Ok((message, conversation))
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Message>(
            "SELECT id, conversation_id, sender_id, body, read, created_at FROM mensajes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Messages of a conversation, oldest first
    pub async fn list_by_conversation(pool: &PgPool, conversation_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, sender_id, body, read, created_at
            FROM mensajes
            WHERE conversation_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(conversation_id)
        .fetch_all(pool)
        .await
    }

    pub async fn count_by_conversation(pool: &PgPool, conversation_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM mensajes WHERE conversation_id = $1")
            .bind(conversation_id)
            .fetch_one(pool)
            .await
    }

    /// Marks one received message as read and decrements the reader's unread counter
    ///
    /// Returns false when the message was already read, was sent by
    /// `reader_id`, or does not exist.
    pub async fn mark_read(pool: &PgPool, id: Uuid, reader_id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let conversation_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE mensajes SET read = TRUE
            WHERE id = $1 AND sender_id <> $2 AND read = FALSE
            RETURNING conversation_id
            "#,
        )
        .bind(id)
        .bind(reader_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(conversation_id) = conversation_id else {
            tx.rollback().await?;
            return Ok(false);
        };

        Conversation::decrement_unread(&mut *tx, conversation_id, reader_id).await?;
        tx.commit().await?;

        Ok(true)
    }
}
