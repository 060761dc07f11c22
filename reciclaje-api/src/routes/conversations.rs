//! Messaging JSON API
//!
//! - `GET /v1/conversations`: inbox of the caller
//! - `POST /v1/conversations`: contact a user, reusing an existing conversation
//! - `GET /v1/conversations/:id/messages`
//! - `POST /v1/conversations/:id/messages`
//! - `POST /v1/conversations/:id/read`: mark received messages read
//! - `POST /v1/messages/:id/read`: mark one message read
//!
//! Only participants can see or write a conversation (`403` otherwise).

use crate::{app::AppState, error::ApiResult, middleware::session::AuthUser};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use reciclaje_shared::{
    messaging::{self, ContactRequest},
    models::{conversation::ConversationSummary, message::Message},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct StartConversationRequest {
    pub recipient_id: Uuid,
    pub message: Option<String>,
    pub listing_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartConversationResponse {
    pub conversation_id: Uuid,

    /// False when an existing conversation was reused
    pub created: bool,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub body: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkedResponse {
    pub marked: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdatedResponse {
    pub updated: bool,
}

pub async fn list_conversations(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> ApiResult<Json<Vec<ConversationSummary>>> {
    Ok(Json(messaging::list_conversations(&state.db, auth.user_id).await?))
}

/// `201` with a new conversation, `200` when one already existed
pub async fn start_conversation(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Json(req): Json<StartConversationRequest>,
) -> ApiResult<(StatusCode, Json<StartConversationResponse>)> {
    let outcome = messaging::contact(
        &state.db,
        ContactRequest {
            sender_id: auth.user_id,
            recipient_id: req.recipient_id,
            message: req.message,
            listing_id: req.listing_id,
        },
    )
    .await?;

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(StartConversationResponse {
            conversation_id: outcome.conversation.id,
            created: outcome.created,
        }),
    ))
}

pub async fn list_messages(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Message>>> {
    Ok(Json(messaging::list_messages(&state.db, id, auth.user_id).await?))
}

pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    let message = messaging::send_message(&state.db, id, auth.user_id, &req.body).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn mark_conversation_read(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MarkedResponse>> {
    let marked = messaging::mark_read(&state.db, id, auth.user_id).await?;
    Ok(Json(MarkedResponse { marked }))
}

pub async fn mark_message_read(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UpdatedResponse>> {
    let updated = messaging::mark_message_read(&state.db, id, auth.user_id).await?;
    Ok(Json(UpdatedResponse { updated }))
}
