//! Transactional free functions for the Conversations domain

use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::domain::entities::{AccountId, ChatContext, Conversation, Message};
use nestly_common::Result;

/// Find the conversation for an unordered pair and context within a transaction
pub async fn find_by_pair_tx(
    tx: &mut Transaction<'_, Postgres>,
    a: AccountId,
    b: AccountId,
    context: ChatContext,
) -> Result<Option<Conversation>> {
    let conv = sqlx::query_as::<_, Conversation>(
        r#"
        SELECT id, participant_a, participant_b, context_id, created_at
        FROM conversations
        WHERE LEAST(participant_a, participant_b) = LEAST($1::BIGINT, $2::BIGINT)
          AND GREATEST(participant_a, participant_b) = GREATEST($1::BIGINT, $2::BIGINT)
          AND context_id = $3
        "#,
    )
    .bind(a)
    .bind(b)
    .bind(context.context_id())
    .fetch_optional(&mut **tx)
    .await?;

    Ok(conv)
}

/// Insert a conversation unless one already exists for the same normalized
/// pair and context. Returns `None` when the unique index rejected the row.
pub async fn insert_conversation_tx(
    tx: &mut Transaction<'_, Postgres>,
    conv: &Conversation,
) -> Result<Option<Conversation>> {
    let created = sqlx::query_as::<_, Conversation>(
        r#"
        INSERT INTO conversations (id, participant_a, participant_b, context_id, created_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (
            LEAST(participant_a, participant_b),
            GREATEST(participant_a, participant_b),
            context_id
        ) DO NOTHING
        RETURNING id, participant_a, participant_b, context_id, created_at
        "#,
    )
    .bind(conv.id)
    .bind(conv.participant_a)
    .bind(conv.participant_b)
    .bind(conv.context.context_id())
    .bind(conv.created_at)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(created)
}

/// Insert an already-validated message body within a transaction
pub async fn create_message_tx(
    tx: &mut Transaction<'_, Postgres>,
    conversation_id: Uuid,
    sender_id: AccountId,
    body: &str,
) -> Result<Message> {
    let created = sqlx::query_as::<_, Message>(
        r#"
        INSERT INTO messages (conversation_id, sender_id, body, is_read, created_at)
        VALUES ($1, $2, $3, FALSE, NOW())
        RETURNING id, conversation_id, sender_id, body, is_read, created_at
        "#,
    )
    .bind(conversation_id)
    .bind(sender_id)
    .bind(body)
    .fetch_one(&mut **tx)
    .await?;

    Ok(created)
}
