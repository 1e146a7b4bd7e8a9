//! Conversation store for the Conversations domain
//!
//! `ConversationStore` is the seam between the facade and persistence.
//! `ConversationsRepositories` is the Postgres implementation;
//! `InMemoryConversationStore` has the same semantics without a database.

pub mod conversations;
pub mod memory;
pub mod messages;
pub mod transactions;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{
    validate_body, AccountId, ChatContext, Conversation, Message, NewMessage,
};
use nestly_common::{Error, Result};

pub use conversations::ConversationRepository;
pub use memory::InMemoryConversationStore;
pub use messages::MessageRepository;
pub use transactions::{create_message_tx, find_by_pair_tx, insert_conversation_tx};

/// Outcome of `lookup_or_create`
#[derive(Debug, Clone, PartialEq)]
pub struct LookupOrCreate {
    pub conversation: Conversation,
    pub created: bool,
}

/// A conversation as seen by one participant in the inbox
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ConversationSummaryRow {
    pub id: Uuid,
    pub participant_a: AccountId,
    pub participant_b: AccountId,
    #[sqlx(rename = "context_id", try_from = "i64")]
    pub context: ChatContext,
    pub created_at: DateTime<Utc>,
    pub last_message_body: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread_count: i64,
}

/// Persistence operations for conversations and messages
#[async_trait::async_trait]
pub trait ConversationStore: Send + Sync {
    async fn find_conversation(&self, id: Uuid) -> Result<Option<Conversation>>;

    /// Existing conversation for the unordered pair `{a, b}` in `context`
    async fn find_by_pair(
        &self,
        a: AccountId,
        b: AccountId,
        context: ChatContext,
    ) -> Result<Option<Conversation>>;

    /// Return the conversation for `{initiator, counterpart}` in `context`,
    /// creating it (and its optional first message from `initiator`)
    /// atomically when none exists.
    async fn lookup_or_create(
        &self,
        initiator: AccountId,
        counterpart: AccountId,
        context: ChatContext,
        initial_body: Option<&str>,
    ) -> Result<LookupOrCreate>;

    /// Append a message; the sender must be a participant
    async fn append_message(
        &self,
        conversation_id: Uuid,
        sender_id: AccountId,
        body: &str,
    ) -> Result<Message>;

    /// Mark every message not sent by `reader_id` as read; returns rows flipped
    async fn mark_read(&self, conversation_id: Uuid, reader_id: AccountId) -> Result<u64>;

    /// Hard delete, cascading to messages; false when nothing was deleted
    async fn delete_conversation(&self, conversation_id: Uuid) -> Result<bool>;

    async fn count_messages(&self, conversation_id: Uuid) -> Result<i64>;

    /// Messages in the conversation sent by someone other than `viewer` and still unread
    async fn count_unread(&self, conversation_id: Uuid, viewer: AccountId) -> Result<i64>;

    /// Newest-first slice ordered by `(created_at, id)` descending
    async fn list_messages_newest_first(
        &self,
        conversation_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Message>>;

    /// Inbox rows for `viewer`, most recent activity first
    async fn list_summaries(&self, viewer: AccountId) -> Result<Vec<ConversationSummaryRow>>;
}

/// Combined repository access for the Conversations domain (Postgres)
#[derive(Clone)]
pub struct ConversationsRepositories {
    pool: PgPool,
    pub conversations: ConversationRepository,
    pub messages: MessageRepository,
}

impl ConversationsRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            conversations: ConversationRepository::new(pool.clone()),
            messages: MessageRepository::new(pool.clone()),
            pool,
        }
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl ConversationStore for ConversationsRepositories {
    async fn find_conversation(&self, id: Uuid) -> Result<Option<Conversation>> {
        self.conversations.find(id).await
    }

    async fn find_by_pair(
        &self,
        a: AccountId,
        b: AccountId,
        context: ChatContext,
    ) -> Result<Option<Conversation>> {
        self.conversations.find_by_pair(a, b, context).await
    }

    async fn lookup_or_create(
        &self,
        initiator: AccountId,
        counterpart: AccountId,
        context: ChatContext,
        initial_body: Option<&str>,
    ) -> Result<LookupOrCreate> {
        let conversation = Conversation::new(initiator, counterpart, context)?;
        let initial_body = initial_body.map(validate_body).transpose()?;

        let mut tx = self.pool.begin().await?;

        if let Some(existing) = find_by_pair_tx(&mut tx, initiator, counterpart, context).await? {
            tx.commit().await?;
            return Ok(LookupOrCreate {
                conversation: existing,
                created: false,
            });
        }

        match insert_conversation_tx(&mut tx, &conversation).await? {
            Some(created) => {
                if let Some(body) = initial_body {
                    create_message_tx(&mut tx, created.id, initiator, &body).await?;
                }
                tx.commit().await?;

                tracing::info!(
                    conversation_id = %created.id,
                    initiator,
                    counterpart,
                    context = %context,
                    "Conversation created"
                );
                Ok(LookupOrCreate {
                    conversation: created,
                    created: true,
                })
            }
            None => {
                // Lost the race to a concurrent first contact; the winner is committed
                let winner = find_by_pair_tx(&mut tx, initiator, counterpart, context)
                    .await?
                    .ok_or_else(|| {
                        Error::Conflict(
                            "Conversation was created and removed concurrently".to_string(),
                        )
                    })?;
                tx.commit().await?;

                tracing::debug!(
                    conversation_id = %winner.id,
                    "Concurrent conversation creation resolved to existing thread"
                );
                Ok(LookupOrCreate {
                    conversation: winner,
                    created: false,
                })
            }
        }
    }

    async fn append_message(
        &self,
        conversation_id: Uuid,
        sender_id: AccountId,
        body: &str,
    ) -> Result<Message> {
        let new_message = NewMessage::new(conversation_id, sender_id, body)?;

        if let Some(message) = self
            .messages
            .create_from_participant(
                new_message.conversation_id,
                new_message.sender_id,
                &new_message.body,
            )
            .await?
        {
            return Ok(message);
        }

        // Nothing inserted: either the conversation is gone or the sender is not in it
        match self.conversations.find(conversation_id).await? {
            None => Err(Error::NotFound("Conversation not found".to_string())),
            Some(_) => Err(Error::Authorization(
                "Only participants can send messages in this conversation".to_string(),
            )),
        }
    }

    async fn mark_read(&self, conversation_id: Uuid, reader_id: AccountId) -> Result<u64> {
        self.messages.mark_read(conversation_id, reader_id).await
    }

    async fn delete_conversation(&self, conversation_id: Uuid) -> Result<bool> {
        self.conversations.delete(conversation_id).await
    }

    async fn count_messages(&self, conversation_id: Uuid) -> Result<i64> {
        self.messages.count(conversation_id).await
    }

    async fn count_unread(&self, conversation_id: Uuid, viewer: AccountId) -> Result<i64> {
        self.messages.count_unread(conversation_id, viewer).await
    }

    async fn list_messages_newest_first(
        &self,
        conversation_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Message>> {
        self.messages
            .list_newest_first(conversation_id, offset, limit)
            .await
    }

    async fn list_summaries(&self, viewer: AccountId) -> Result<Vec<ConversationSummaryRow>> {
        self.conversations.list_summaries(viewer).await
    }
}
