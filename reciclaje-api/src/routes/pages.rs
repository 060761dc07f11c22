//! Page endpoints
//!
//! Every page path sits behind the route guard, so a missing session never
//! reaches these handlers as a browser request; `AuthUser` still rejects
//! direct calls. GET pages return the JSON view model the page renders.
//! The two form posts answer with a `303` redirect, carrying failures in an
//! `error` query parameter:
//!
//! ```text
//! POST /contactar       ok   → /mensajes/<conversation id>
//!                       fail → /mensajes?error=<message>
//! POST /mensajes/:id    ok   → /mensajes/:id
//!                       fail → /mensajes/:id?error=<message>
//! ```

use crate::{
    app::AppState,
    error::{redirect_with_error, ApiError, ApiResult},
    middleware::session::AuthUser,
    routes::{notifications::NotificationFeed, Pagination},
};
use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Form, Json,
};
use reciclaje_shared::{
    messaging::{self, ContactRequest, MessagingError},
    models::{
        conversation::{Conversation, ConversationSummary},
        location::Location,
        material::Material,
        message::Message,
        notification::Notification,
        user::User,
    },
    profile::{build_profile, Audience, ProfileView},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

const INBOX_PATH: &str = "/mensajes";

#[derive(Debug, Default, Deserialize)]
pub struct ErrorQuery {
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InboxPage {
    pub conversations: Vec<ConversationSummary>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationPage {
    pub conversation: Conversation,
    pub other_user_id: Uuid,
    pub other_user_name: String,
    pub messages: Vec<Message>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublishPage {
    pub materials: Vec<Material>,
    pub locations: Vec<Location>,
}

/// Body of `POST /contactar`
///
/// Ids arrive as raw form text so a malformed one still ends in a redirect.
#[derive(Debug, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub recipient_id: String,

    pub message: Option<String>,
    pub listing_id: Option<String>,
}

/// Body of `POST /mensajes/:id`
#[derive(Debug, Default, Deserialize)]
pub struct MessageForm {
    #[serde(default)]
    pub body: String,
}

fn conversation_path(id: Uuid) -> String {
    format!("{}/{}", INBOX_PATH, id)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn own_profile(state: &AppState, user_id: Uuid) -> ApiResult<Json<ProfileView>> {
    let user = User::find_with_role(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Usuario no encontrado".to_string()))?;

    Ok(Json(build_profile(&state.db, user, Audience::Owner).await?))
}

/// `GET /dashboard`: role-specific home
pub async fn dashboard(State(state): State<AppState>, AuthUser(auth): AuthUser) -> ApiResult<Json<ProfileView>> {
    own_profile(&state, auth.user_id).await
}

/// `GET /perfil`: own profile in the role's variant
pub async fn profile(State(state): State<AppState>, AuthUser(auth): AuthUser) -> ApiResult<Json<ProfileView>> {
    own_profile(&state, auth.user_id).await
}

/// `GET /notificaciones`
pub async fn notifications(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<NotificationFeed>> {
    let (limit, offset) = page.clamp();

    Ok(Json(NotificationFeed {
        notifications: Notification::list_for_user(&state.db, auth.user_id, limit, offset).await?,
        unread: Notification::unread_count(&state.db, auth.user_id).await?,
    }))
}

/// `GET /publicar`: options for the new listing form
pub async fn publish(State(state): State<AppState>, AuthUser(auth): AuthUser) -> ApiResult<Json<PublishPage>> {
    Ok(Json(PublishPage {
        materials: Material::list(&state.db).await?,
        locations: Location::list_by_user(&state.db, auth.user_id).await?,
    }))
}

/// `GET /mensajes`
pub async fn inbox(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Query(query): Query<ErrorQuery>,
) -> ApiResult<Json<InboxPage>> {
    Ok(Json(InboxPage {
        conversations: messaging::list_conversations(&state.db, auth.user_id).await?,
        error: non_blank(query.error),
    }))
}

/// `GET /mensajes/:id`: opening a conversation marks it read
pub async fn conversation(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<ErrorQuery>,
) -> ApiResult<Json<ConversationPage>> {
    let conversation = messaging::load_conversation(&state.db, id, auth.user_id).await?;
    let messages = Message::list_by_conversation(&state.db, id).await?;

    let marked = Conversation::mark_read(&state.db, id, auth.user_id).await?;
    if marked > 0 {
        debug!(conversation_id = %id, marked, "Conversation marked read");
    }

    let other_user_id = conversation
        .other_participant(auth.user_id)
        .ok_or_else(|| ApiError::from(MessagingError::NotParticipant))?;

    let other_user_name = User::find_by_id(&state.db, other_user_id)
        .await?
        .map(|u| u.name)
        .unwrap_or_default();

    Ok(Json(ConversationPage {
        conversation,
        other_user_id,
        other_user_name,
        messages,
        error: non_blank(query.error),
    }))
}

/// `POST /mensajes/:id`
pub async fn send_message_form(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<Uuid>,
    Form(form): Form<MessageForm>,
) -> Redirect {
    let path = conversation_path(id);

    match messaging::send_message(&state.db, id, auth.user_id, &form.body).await {
        Ok(_) => Redirect::to(&path),
        Err(e) => ApiError::from(e).into_redirect(&path),
    }
}

/// `POST /contactar`
pub async fn contact(State(state): State<AppState>, AuthUser(auth): AuthUser, Form(form): Form<ContactForm>) -> Redirect {
    let Ok(recipient_id) = Uuid::parse_str(form.recipient_id.trim()) else {
        debug!(recipient_id = %form.recipient_id, "Contact form without a valid recipient");
        return redirect_with_error(INBOX_PATH, &MessagingError::RecipientNotFound.to_string());
    };

    let listing_id = match non_blank(form.listing_id).map(|v| Uuid::parse_str(v.trim())) {
        None => None,
        Some(Ok(id)) => Some(id),
        Some(Err(_)) => {
            return redirect_with_error(INBOX_PATH, &MessagingError::ListingNotFound.to_string());
        }
    };

    let request = ContactRequest {
        sender_id: auth.user_id,
        recipient_id,
        message: form.message,
        listing_id,
    };

    match messaging::contact(&state.db, request).await {
        Ok(outcome) => Redirect::to(&conversation_path(outcome.conversation.id)),
        Err(e) => {
            if matches!(e, MessagingError::Database(_)) {
                warn!(user_id = %auth.user_id, error = %e, "Contact failed");
            }
            ApiError::from(e).into_redirect(INBOX_PATH)
        }
    }
}
