//! Message repository

use crate::domain::entities::{AccountId, Message};
use nestly_common::{Error, RepositoryError, Result};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a message only if `sender_id` participates in the conversation.
    /// Returns `None` when no row was inserted.
    pub async fn create_from_participant(
        &self,
        conversation_id: Uuid,
        sender_id: AccountId,
        body: &str,
    ) -> Result<Option<Message>> {
        let result = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (conversation_id, sender_id, body, is_read, created_at)
            SELECT c.id, $2, $3, FALSE, NOW()
            FROM conversations c
            WHERE c.id = $1
              AND (c.participant_a = $2 OR c.participant_b = $2)
            RETURNING id, conversation_id, sender_id, body, is_read, created_at
            "#,
        )
        .bind(conversation_id)
        .bind(sender_id)
        .bind(body)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(message) => Ok(message),
            // Conversation deleted between the SELECT and the FK check
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                Err(Error::NotFound("Conversation not found".to_string()))
            }
            Err(e) => Err(RepositoryError::from(e).into()),
        }
    }

    /// Newest-first page ordered by `(created_at, id)` descending
    pub async fn list_newest_first(
        &self,
        conversation_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, sender_id, body, is_read, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(conversation_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    /// Flip `is_read` on every unread message the reader did not send
    pub async fn mark_read(&self, conversation_id: Uuid, reader_id: AccountId) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET is_read = TRUE
            WHERE conversation_id = $1
              AND sender_id <> $2
              AND is_read = FALSE
            "#,
        )
        .bind(conversation_id)
        .bind(reader_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn count(&self, conversation_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM messages WHERE conversation_id = $1",
        )
        .bind(conversation_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn count_unread(&self, conversation_id: Uuid, viewer: AccountId) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM messages
            WHERE conversation_id = $1 AND sender_id <> $2 AND is_read = FALSE
            "#,
        )
        .bind(conversation_id)
        .bind(viewer)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
