//! Conversation API handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use nestly_auth::AuthUser;
use nestly_common::{Result, ValidatedJson};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::ConversationsState;
use crate::resolver::ContactTarget;
use crate::service::{ConversationSummary, CreateOutcome, OpenedConversation};

/// Request for creating or reusing a conversation
#[derive(Debug, Deserialize, Validate)]
pub struct CreateConversationRequest {
    /// Listing owner or agent to contact
    pub target: ContactTarget,

    /// Optional first message, stored only when a new thread is created
    #[validate(length(min = 1, max = 8000))]
    pub initial_text: Option<String>,
}

/// Query params for opening a conversation
#[derive(Debug, Default, Deserialize)]
pub struct OpenConversationQuery {
    pub page_size: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub marked: u64,
}

/// List conversations for the authenticated caller
pub async fn list_conversations(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
) -> Result<Json<Vec<ConversationSummary>>> {
    let summaries = state.service.list_conversations(&ctx).await?;
    Ok(Json(summaries))
}

/// Find or start a conversation with a listing owner or agent
pub async fn create_or_reuse(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
    ValidatedJson(req): ValidatedJson<CreateConversationRequest>,
) -> Result<(StatusCode, Json<CreateOutcome>)> {
    let outcome = state
        .service
        .create_or_reuse(&ctx, req.target, req.initial_text.as_deref())
        .await?;

    let status = if outcome.was_created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome)))
}

/// Open a conversation; marks it read for the caller
pub async fn open_conversation(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
    Path(id): Path<Uuid>,
    Query(query): Query<OpenConversationQuery>,
) -> Result<Json<OpenedConversation>> {
    let opened = state
        .service
        .open_conversation(&ctx, id, query.page_size)
        .await?;
    Ok(Json(opened))
}

/// Mark every incoming message in a conversation read
pub async fn mark_read(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MarkReadResponse>> {
    let marked = state.service.mark_read(&ctx, id).await?;
    Ok(Json(MarkReadResponse { marked }))
}

/// Delete a conversation and all its messages
pub async fn delete_conversation(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.service.delete_conversation(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
