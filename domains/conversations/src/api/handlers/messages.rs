//! Message API handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use nestly_auth::AuthUser;
use nestly_common::{PageWindow, Result, ValidatedJson};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::ConversationsState;
use crate::domain::entities::{AccountId, Message, MessageView};
use crate::pagination::MessagePage;

/// Request for sending a message
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    /// Message text; trimmed and length-checked again by the domain
    #[validate(length(min = 1, max = 8000))]
    pub body: String,
}

/// Message response DTO
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message_id: i64,
    pub conversation_id: Uuid,
    pub sender_id: AccountId,
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(m: Message) -> Self {
        Self {
            message_id: m.id,
            conversation_id: m.conversation_id,
            sender_id: m.sender_id,
            body: m.body,
            is_read: m.is_read,
            created_at: m.created_at,
        }
    }
}

/// Send a message to a conversation
pub async fn send_message(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let message = state.service.send_message(&ctx, id, &req.body).await?;
    Ok((StatusCode::CREATED, Json(message.into())))
}

/// Fetch history older than what the client already holds
pub async fn fetch_older(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
    Path(id): Path<Uuid>,
    Query(window): Query<PageWindow>,
) -> Result<Json<MessagePage<MessageView>>> {
    let pages = state.service.pages();
    let take = window.take(pages.default_page_size(), pages.max_page_size());

    let page = state
        .service
        .fetch_older(&ctx, id, window.skip(), Some(take))
        .await?;
    Ok(Json(page))
}
