//! Conversations between two users (`conversaciones`)
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE conversaciones (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     participant_a UUID NOT NULL REFERENCES usuarios(id) ON DELETE CASCADE,
//!     participant_b UUID NOT NULL REFERENCES usuarios(id) ON DELETE CASCADE,
//!     listing_id UUID REFERENCES publicaciones(id) ON DELETE SET NULL,
//!     last_message TEXT,
//!     last_message_at TIMESTAMPTZ,
//!     last_sender_id UUID REFERENCES usuarios(id) ON DELETE SET NULL,
//!     unread_count INTEGER NOT NULL DEFAULT 0 CHECK (unread_count >= 0),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     CONSTRAINT conversaciones_ordered_pair CHECK (participant_a < participant_b),
//!     CONSTRAINT conversaciones_pair_key UNIQUE (participant_a, participant_b)
//! );
//! ```
//!
//! # Pair ordering
//!
//! A conversation belongs to an unordered pair of users. The pair is stored
//! with the smaller id in `participant_a`, so `(x, y)` and `(y, x)` collide on
//! `conversaciones_pair_key` and concurrent contacts end on the same row.
//!
//! # Unread counter
//!
//! `unread_count` counts the messages the participant who is *not*
//! `last_sender_id` has not read yet. A new message from the last sender
//! increments it; a reply from the other side restarts it at 1.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::message::Message;

const CONVERSATION_COLUMNS: &str = "id, participant_a, participant_b, listing_id, last_message, \
                                    last_message_at, last_sender_id, unread_count, created_at";

/// Returns the pair in storage order
pub fn ordered_pair(first: Uuid, second: Uuid) -> (Uuid, Uuid) {
    if first <= second {
        (first, second)
    } else {
        (second, first)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Conversation {
    pub id: Uuid,
    pub participant_a: Uuid,
    pub participant_b: Uuid,

    /// Listing the conversation started from, if any
    pub listing_id: Option<Uuid>,

    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub last_sender_id: Option<Uuid>,
    pub unread_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Inbox row: a conversation seen from one participant
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub other_user_id: Uuid,
    pub other_user_name: String,
    pub listing_id: Option<Uuid>,
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub last_sender_id: Option<Uuid>,

    /// Unread messages for the viewing user (0 when they sent last)
    pub unread_count: i32,

    pub created_at: DateTime<Utc>,
}

/// Input for starting a conversation
#[derive(Debug, Clone)]
pub struct StartConversation {
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub listing_id: Option<Uuid>,
    pub initial_message: String,
}

impl Conversation {
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.participant_a == user_id || self.participant_b == user_id
    }

    /// The participant that is not `user_id`; `None` for outsiders
    pub fn other_participant(&self, user_id: Uuid) -> Option<Uuid> {
        if self.participant_a == user_id {
            Some(self.participant_b)
        } else if self.participant_b == user_id {
            Some(self.participant_a)
        } else {
            None
        }
    }

    /// Unread messages as seen by `user_id`
    pub fn unread_for(&self, user_id: Uuid) -> i32 {
        if self.last_sender_id == Some(user_id) {
            0
        } else {
            self.unread_count
        }
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM conversaciones WHERE id = $1", CONVERSATION_COLUMNS);

        sqlx::query_as::<_, Conversation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Conversation of the unordered pair, if one exists
    pub async fn find_between(
        executor: impl PgExecutor<'_>,
        first: Uuid,
        second: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let (a, b) = ordered_pair(first, second);
        let query = format!(
            "SELECT {} FROM conversaciones WHERE participant_a = $1 AND participant_b = $2",
            CONVERSATION_COLUMNS
        );

        sqlx::query_as::<_, Conversation>(&query)
            .bind(a)
            .bind(b)
            .fetch_optional(executor)
            .await
    }

    /// Returns the pair's conversation, creating it with its first message
    ///
    /// The conversation row and the first message are written in one
    /// transaction. The boolean is `true` when a new conversation was
    /// created. When a concurrent request wins the insert, its row is
    /// returned and no message is written.
    pub async fn find_or_create(pool: &PgPool, data: StartConversation) -> Result<(Self, bool), sqlx::Error> {
        if let Some(existing) = Self::find_between(pool, data.sender_id, data.recipient_id).await? {
            return Ok((existing, false));
        }

        let (a, b) = ordered_pair(data.sender_id, data.recipient_id);
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO conversaciones
                 (participant_a, participant_b, listing_id, last_message, last_message_at, last_sender_id, unread_count)
             VALUES ($1, $2, $3, $4, NOW(), $5, 1)
             ON CONFLICT ON CONSTRAINT conversaciones_pair_key DO NOTHING
             RETURNING {}",
            CONVERSATION_COLUMNS
        );

        let inserted = sqlx::query_as::<_, Conversation>(&query)
            .bind(a)
            .bind(b)
            .bind(data.listing_id)
            .bind(&data.initial_message)
            .bind(data.sender_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(conversation) = inserted else {
            tx.rollback().await?;

            let existing = Self::find_between(pool, data.sender_id, data.recipient_id)
                .await?
                .ok_or(sqlx::Error::RowNotFound)?;
            return Ok((existing, false));
        };

        Message::insert(&mut *tx, conversation.id, data.sender_id, &data.initial_message).await?;
        tx.commit().await?;

        Ok((conversation, true))
    }

    /// Inbox of `user_id`, newest activity first
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<ConversationSummary>, sqlx::Error> {
        sqlx::query_as::<_, ConversationSummary>(
            r#"
            SELECT c.id,
                   u.id AS other_user_id,
                   u.name AS other_user_name,
                   c.listing_id,
                   c.last_message,
                   c.last_message_at,
                   c.last_sender_id,
                   CASE WHEN c.last_sender_id = $1 THEN 0 ELSE c.unread_count END AS unread_count,
                   c.created_at
            FROM conversaciones c
            JOIN usuarios u
              ON u.id = CASE WHEN c.participant_a = $1 THEN c.participant_b ELSE c.participant_a END
            WHERE c.participant_a = $1 OR c.participant_b = $1
            ORDER BY COALESCE(c.last_message_at, c.created_at) DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Conversations started from a listing
    pub async fn list_for_listing(pool: &PgPool, listing_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM conversaciones WHERE listing_id = $1 ORDER BY created_at",
            CONVERSATION_COLUMNS
        );

        sqlx::query_as::<_, Conversation>(&query)
            .bind(listing_id)
            .fetch_all(pool)
            .await
    }

    /// Updates the last-message cache and the unread counter after a send
    pub async fn record_message(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        sender_id: Uuid,
        body: &str,
    ) -> Result<Self, sqlx::Error> {
        // Right-hand sides see the old row, so the CASE compares against the
        // previous sender.
        let query = format!(
            "UPDATE conversaciones
             SET last_message = $3,
                 last_message_at = NOW(),
                 unread_count = CASE WHEN last_sender_id = $2 THEN unread_count + 1 ELSE 1 END,
                 last_sender_id = $2
             WHERE id = $1
             RETURNING {}",
            CONVERSATION_COLUMNS
        );

        sqlx::query_as::<_, Conversation>(&query)
            .bind(id)
            .bind(sender_id)
            .bind(body)
            .fetch_one(executor)
            .await
    }

    /// Marks everything `reader_id` received as read
    ///
    /// Returns the number of messages flipped. The counter only resets when
    /// the reader is not the last sender.
    pub async fn mark_read(pool: &PgPool, id: Uuid, reader_id: Uuid) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let marked = sqlx::query(
            "UPDATE mensajes SET read = TRUE WHERE conversation_id = $1 AND sender_id <> $2 AND read = FALSE",
        )
        .bind(id)
        .bind(reader_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query(
            "UPDATE conversaciones SET unread_count = 0 WHERE id = $1 AND last_sender_id IS DISTINCT FROM $2",
        )
        .bind(id)
        .bind(reader_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(marked)
    }

    /// Decrements the unread counter for `reader_id`, never below zero
    ///
    /// The counter belongs to whoever is not the last sender, so a read by
    /// the last sender leaves it alone.
    pub async fn decrement_unread(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        reader_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE conversaciones SET unread_count = GREATEST(unread_count - 1, 0)
            WHERE id = $1 AND last_sender_id IS DISTINCT FROM $2
            "#,
        )
        .bind(id)
        .bind(reader_id)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Total unread messages across the inbox of `user_id`
    pub async fn unread_total(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(unread_count), 0)::bigint
            FROM conversaciones
            WHERE (participant_a = $1 OR participant_b = $1)
              AND last_sender_id IS DISTINCT FROM $1
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(a: Uuid, b: Uuid, last_sender: Option<Uuid>, unread: i32) -> Conversation {
        let (participant_a, participant_b) = ordered_pair(a, b);
        Conversation {
            id: Uuid::new_v4(),
            participant_a,
            participant_b,
            listing_id: None,
            last_message: Some("Hola".to_string()),
            last_message_at: Some(Utc::now()),
            last_sender_id: last_sender,
            unread_count: unread,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_ordered_pair_is_symmetric() {
        let x = Uuid::new_v4();
        let y = Uuid::new_v4();

        assert_eq!(ordered_pair(x, y), ordered_pair(y, x));

        let (a, b) = ordered_pair(x, y);
        assert!(a <= b);
    }

    #[test]
    fn test_participants() {
        let x = Uuid::new_v4();
        let y = Uuid::new_v4();
        let outsider = Uuid::new_v4();
        let conv = conversation(x, y, Some(x), 1);

        assert!(conv.is_participant(x));
        assert!(conv.is_participant(y));
        assert!(!conv.is_participant(outsider));

        assert_eq!(conv.other_participant(x), Some(y));
        assert_eq!(conv.other_participant(y), Some(x));
        assert_eq!(conv.other_participant(outsider), None);
    }

    #[test]
    fn test_unread_is_for_recipient_only() {
        let sender = Uuid::new_v4();
        let recipient = Uuid::new_v4();
        let conv = conversation(sender, recipient, Some(sender), 3);

        assert_eq!(conv.unread_for(sender), 0);
        assert_eq!(conv.unread_for(recipient), 3);
    }
}
