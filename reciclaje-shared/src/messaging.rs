//! Contact and message exchange between users
//!
//! This is the one place where several tables move together:
//!
//! ```text
//! contact(sender, recipient)
//!   ├─ sender == recipient ─────────────▶ SelfContact
//!   ├─ recipient missing ───────────────▶ RecipientNotFound
//!   ├─ pair already has a conversation ─▶ (existing, created = false)
//!   └─ BEGIN
//!        INSERT conversaciones ... ON CONFLICT DO NOTHING
//!        INSERT mensajes (first message)
//!      COMMIT ──────────────────────────▶ (new, created = true)
//!      then notify recipient (best effort)
//!
//! send_message(conversation, sender, body)
//!   ├─ blank body ──────────────────────▶ EmptyMessage
//!   ├─ unknown conversation ────────────▶ ConversationNotFound
//!   ├─ sender not a participant ────────▶ NotParticipant
//!   └─ BEGIN INSERT mensajes; UPDATE conversaciones cache COMMIT
//!      then notify the other participant (best effort)
//! ```

use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{
    conversation::{Conversation, ConversationSummary, StartConversation},
    listing::Listing,
    message::{Message, MAX_MESSAGE_LENGTH},
    notification::{CreateNotification, Notification, NotificationKind},
    user::User,
};

/// First message when a contact starts from a listing and none was typed
pub const DEFAULT_LISTING_MESSAGE: &str = "Hola, me interesa tu publicación.";

/// First message when a contact starts from a profile and none was typed
pub const DEFAULT_CONTACT_MESSAGE: &str = "Hola, me gustaría ponerme en contacto contigo.";

/// Characters of the body copied into notification payloads
const PREVIEW_LENGTH: usize = 80;

#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    #[error("No puedes contactarte a ti mismo")]
    SelfContact,

    #[error("Usuario no encontrado")]
    RecipientNotFound,

    #[error("Publicación no encontrada")]
    ListingNotFound,

    #[error("Conversación no encontrada")]
    ConversationNotFound,

    #[error("Mensaje no encontrado")]
    MessageNotFound,

    #[error("No participas en esta conversación")]
    NotParticipant,

    #[error("El mensaje no puede estar vacío")]
    EmptyMessage,

    #[error("El mensaje supera los {max} caracteres")]
    MessageTooLong { max: usize },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Input of [`contact`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRequest {
    pub sender_id: Uuid,
    pub recipient_id: Uuid,

    /// Typed first message; blank means the default text
    pub message: Option<String>,

    pub listing_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct ContactOutcome {
    pub conversation: Conversation,

    /// A new conversation (and first message) was written
    pub created: bool,
}

/// Trims a body and enforces the length rules
pub fn normalize_body(body: &str) -> Result<String, MessagingError> {
    let body = body.trim();

    if body.is_empty() {
        return Err(MessagingError::EmptyMessage);
    }

    if body.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(MessagingError::MessageTooLong {
            max: MAX_MESSAGE_LENGTH,
        });
    }

    Ok(body.to_string())
}

/// First message for a contact: the typed text or the default one
pub fn initial_message(message: Option<&str>, from_listing: bool) -> Result<String, MessagingError> {
    match message.map(str::trim).filter(|m| !m.is_empty()) {
        Some(text) => normalize_body(text),
        None if from_listing => Ok(DEFAULT_LISTING_MESSAGE.to_string()),
        None => Ok(DEFAULT_CONTACT_MESSAGE.to_string()),
    }
}

fn preview(body: &str) -> String {
    if body.chars().count() <= PREVIEW_LENGTH {
        return body.to_string();
    }

    let mut cut: String = body.chars().take(PREVIEW_LENGTH).collect();
    cut.push('…');
    cut
}

/// Finds or creates the conversation between sender and recipient
///
/// An existing conversation is returned untouched; the typed message is not
/// appended to it.
pub async fn contact(pool: &PgPool, request: ContactRequest) -> Result<ContactOutcome, MessagingError> {
    if request.sender_id == request.recipient_id {
        return Err(MessagingError::SelfContact);
    }

    if !User::exists(pool, request.recipient_id).await? {
        return Err(MessagingError::RecipientNotFound);
    }

    if let Some(listing_id) = request.listing_id {
        if Listing::find_by_id(pool, listing_id).await?.is_none() {
            return Err(MessagingError::ListingNotFound);
        }
    }

    let first_message = initial_message(request.message.as_deref(), request.listing_id.is_some())?;

    let (conversation, created) = Conversation::find_or_create(
        pool,
        StartConversation {
            sender_id: request.sender_id,
            recipient_id: request.recipient_id,
            listing_id: request.listing_id,
            initial_message: first_message.clone(),
        },
    )
    .await?;

    if created {
        info!(
            conversation_id = %conversation.id,
            sender_id = %request.sender_id,
            recipient_id = %request.recipient_id,
            "Conversation created"
        );

        Notification::create_best_effort(
            pool,
            CreateNotification {
                recipient_id: request.recipient_id,
                kind: NotificationKind::NewMessage,
                payload: json!({
                    "conversation_id": conversation.id,
                    "sender_id": request.sender_id,
                    "preview": preview(&first_message),
                }),
            },
        )
        .await;
    } else {
        debug!(conversation_id = %conversation.id, "Reusing existing conversation");
    }

    Ok(ContactOutcome { conversation, created })
}

/// Loads a conversation the user takes part in
pub async fn load_conversation(
    pool: &PgPool,
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<Conversation, MessagingError> {
    let conversation = Conversation::find_by_id(pool, conversation_id)
        .await?
        .ok_or(MessagingError::ConversationNotFound)?;

    if !conversation.is_participant(user_id) {
        return Err(MessagingError::NotParticipant);
    }

    Ok(conversation)
}

/// Appends a message from a participant
pub async fn send_message(
    pool: &PgPool,
    conversation_id: Uuid,
    sender_id: Uuid,
    body: &str,
) -> Result<Message, MessagingError> {
    let body = normalize_body(body)?;
    let conversation = load_conversation(pool, conversation_id, sender_id).await?;

    let (message, _) = Message::send(pool, conversation.id, sender_id, &body).await?;

    debug!(
        conversation_id = %conversation.id,
        message_id = %message.id,
        sender_id = %sender_id,
        "Message sent"
    );

    if let Some(recipient_id) = conversation.other_participant(sender_id) {
        Notification::create_best_effort(
            pool,
            CreateNotification {
                recipient_id,
                kind: NotificationKind::NewMessage,
                payload: json!({
                    "conversation_id": conversation.id,
                    "message_id": message.id,
                    "sender_id": sender_id,
                    "preview": preview(&body),
                }),
            },
        )
        .await;
    }

    Ok(message)
}

pub async fn list_conversations(pool: &PgPool, user_id: Uuid) -> Result<Vec<ConversationSummary>, MessagingError> {
    Ok(Conversation::list_for_user(pool, user_id).await?)
}

/// Messages of a conversation, participants only
pub async fn list_messages(
    pool: &PgPool,
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<Vec<Message>, MessagingError> {
    load_conversation(pool, conversation_id, user_id).await?;
    Ok(Message::list_by_conversation(pool, conversation_id).await?)
}

/// Marks the reader's received messages read; returns how many changed
pub async fn mark_read(pool: &PgPool, conversation_id: Uuid, reader_id: Uuid) -> Result<u64, MessagingError> {
    load_conversation(pool, conversation_id, reader_id).await?;
    Ok(Conversation::mark_read(pool, conversation_id, reader_id).await?)
}

/// Marks one received message read; false when there was nothing to change
pub async fn mark_message_read(pool: &PgPool, message_id: Uuid, reader_id: Uuid) -> Result<bool, MessagingError> {
    let message = Message::find_by_id(pool, message_id)
        .await?
        .ok_or(MessagingError::MessageNotFound)?;

    load_conversation(pool, message.conversation_id, reader_id).await?;
    Ok(Message::mark_read(pool, message_id, reader_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_body_trims() {
        assert_eq!(normalize_body("  hola  ").unwrap(), "hola");
    }

    #[test]
    fn test_normalize_body_rejects_blank() {
        assert!(matches!(normalize_body("   \n"), Err(MessagingError::EmptyMessage)));
    }

    #[test]
    fn test_normalize_body_rejects_long() {
        let body = "a".repeat(MAX_MESSAGE_LENGTH + 1);
        assert!(matches!(normalize_body(&body), Err(MessagingError::MessageTooLong { .. })));
    }

    #[test]
    fn test_initial_message_defaults() {
        assert_eq!(initial_message(None, true).unwrap(), DEFAULT_LISTING_MESSAGE);
        assert_eq!(initial_message(Some("  "), false).unwrap(), DEFAULT_CONTACT_MESSAGE);
        assert_eq!(initial_message(Some("¿Sigue disponible?"), true).unwrap(), "¿Sigue disponible?");
    }

    #[test]
    fn test_preview_truncates() {
        assert_eq!(preview("corto"), "corto");

        let long = "ñ".repeat(PREVIEW_LENGTH + 10);
        let cut = preview(&long);
        assert_eq!(cut.chars().count(), PREVIEW_LENGTH + 1);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(MessagingError::SelfContact.to_string(), "No puedes contactarte a ti mismo");
        assert_eq!(MessagingError::RecipientNotFound.to_string(), "Usuario no encontrado");
    }
}
