//! Conversation repository

use crate::domain::entities::{AccountId, ChatContext, Conversation};
use crate::repository::ConversationSummaryRow;
use nestly_common::Result;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct ConversationRepository {
    pool: PgPool,
}

impl ConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find conversation by ID
    pub async fn find(&self, id: Uuid) -> Result<Option<Conversation>> {
        let conv = sqlx::query_as::<_, Conversation>(
            r#"
            SELECT id, participant_a, participant_b, context_id, created_at
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(conv)
    }

    /// Find the conversation for an unordered pair of accounts in a context
    pub async fn find_by_pair(
        &self,
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
        .fetch_optional(&self.pool)
        .await?;

        Ok(conv)
    }

    /// Inbox for a viewer: every conversation they take part in, with the
    /// latest message and the viewer's unread count, most recent first
    pub async fn list_summaries(&self, viewer: AccountId) -> Result<Vec<ConversationSummaryRow>> {
        let rows = sqlx::query_as::<_, ConversationSummaryRow>(
            r#"
            SELECT c.id, c.participant_a, c.participant_b, c.context_id, c.created_at,
                   last_msg.body AS last_message_body,
                   last_msg.created_at AS last_message_at,
                   unread.cnt AS unread_count
            FROM conversations c
            LEFT JOIN LATERAL (
                SELECT m.body, m.created_at
                FROM messages m
                WHERE m.conversation_id = c.id
                ORDER BY m.created_at DESC, m.id DESC
                LIMIT 1
            ) last_msg ON TRUE
            CROSS JOIN LATERAL (
                SELECT COUNT(*) AS cnt
                FROM messages m
                WHERE m.conversation_id = c.id
                  AND m.sender_id <> $1
                  AND m.is_read = FALSE
            ) unread
            WHERE c.participant_a = $1 OR c.participant_b = $1
            ORDER BY COALESCE(last_msg.created_at, c.created_at) DESC, c.id DESC
            "#,
        )
        .bind(viewer)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Delete conversation (messages cascade)
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
