//! In-memory conversation store
//!
//! Mirrors the Postgres semantics: one conversation per unordered pair and
//! context, messages ordered by `(created_at, id)`, deletes cascade. A single
//! mutex makes lookup-or-create atomic.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::{ConversationStore, ConversationSummaryRow, LookupOrCreate};
use crate::domain::entities::{
    normalized_pair, validate_body, AccountId, ChatContext, Conversation, Message, NewMessage,
};
use nestly_common::{Error, Result};

type PairKey = (AccountId, AccountId, i64);

fn pair_key(a: AccountId, b: AccountId, context: ChatContext) -> PairKey {
    let (lo, hi) = normalized_pair(a, b);
    (lo, hi, context.context_id())
}

#[derive(Debug, Default)]
struct StoreData {
    conversations: HashMap<Uuid, Conversation>,
    by_pair: HashMap<PairKey, Uuid>,
    messages: Vec<Message>,
    next_message_id: i64,
    last_created_at: Option<DateTime<Utc>>,
}

impl StoreData {
    fn push_message(&mut self, conversation_id: Uuid, sender_id: AccountId, body: String) -> Message {
        self.next_message_id += 1;

        // Timestamps strictly increase across the store so ordering never
        // depends on clock resolution
        let now = Utc::now();
        let created_at = self
            .last_created_at
            .map_or(now, |last| now.max(last + Duration::microseconds(1)));
        self.last_created_at = Some(created_at);

        let message = Message {
            id: self.next_message_id,
            conversation_id,
            sender_id,
            body,
            is_read: false,
            created_at,
        };
        self.messages.push(message.clone());
        message
    }

    fn messages_of(&self, conversation_id: Uuid) -> impl Iterator<Item = &Message> {
        self.messages
            .iter()
            .filter(move |m| m.conversation_id == conversation_id)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    data: Mutex<StoreData>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[mutants::skip] // Poisoning needs a panic while the lock is held
    fn lock(&self) -> Result<MutexGuard<'_, StoreData>> {
        self.data
            .lock()
            .map_err(|_| Error::Internal("Conversation store lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn find_conversation(&self, id: Uuid) -> Result<Option<Conversation>> {
        Ok(self.lock()?.conversations.get(&id).cloned())
    }

    async fn find_by_pair(
        &self,
        a: AccountId,
        b: AccountId,
        context: ChatContext,
    ) -> Result<Option<Conversation>> {
        let data = self.lock()?;
        Ok(data
            .by_pair
            .get(&pair_key(a, b, context))
            .and_then(|id| data.conversations.get(id))
            .cloned())
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

        let mut data = self.lock()?;
        let key = pair_key(initiator, counterpart, context);

        if let Some(existing) = data.by_pair.get(&key).and_then(|id| data.conversations.get(id)) {
            return Ok(LookupOrCreate {
                conversation: existing.clone(),
                created: false,
            });
        }

        data.by_pair.insert(key, conversation.id);
        data.conversations
            .insert(conversation.id, conversation.clone());
        if let Some(body) = initial_body {
            data.push_message(conversation.id, initiator, body);
        }

        Ok(LookupOrCreate {
            conversation,
            created: true,
        })
    }

    async fn append_message(
        &self,
        conversation_id: Uuid,
        sender_id: AccountId,
        body: &str,
    ) -> Result<Message> {
        let new_message = NewMessage::new(conversation_id, sender_id, body)?;
        let mut data = self.lock()?;

        let conversation = data
            .conversations
            .get(&conversation_id)
            .ok_or_else(|| Error::NotFound("Conversation not found".to_string()))?;
        if !conversation.is_participant(sender_id) {
            return Err(Error::Authorization(
                "Only participants can send messages in this conversation".to_string(),
            ));
        }

        Ok(data.push_message(conversation_id, sender_id, new_message.body))
    }

    async fn mark_read(&self, conversation_id: Uuid, reader_id: AccountId) -> Result<u64> {
        let mut data = self.lock()?;
        let mut flipped = 0;
        for message in data
            .messages
            .iter_mut()
            .filter(|m| m.conversation_id == conversation_id)
        {
            if message.sender_id != reader_id && !message.is_read {
                message.is_read = true;
                flipped += 1;
            }
        }
        Ok(flipped)
    }

    async fn delete_conversation(&self, conversation_id: Uuid) -> Result<bool> {
        let mut data = self.lock()?;
        let Some(conversation) = data.conversations.remove(&conversation_id) else {
            return Ok(false);
        };
        let key = pair_key(
            conversation.participant_a,
            conversation.participant_b,
            conversation.context,
        );
        data.by_pair.remove(&key);
        data.messages.retain(|m| m.conversation_id != conversation_id);
        Ok(true)
    }

    async fn count_messages(&self, conversation_id: Uuid) -> Result<i64> {
        let data = self.lock()?;
        Ok(data.messages_of(conversation_id).count() as i64)
    }

    async fn count_unread(&self, conversation_id: Uuid, viewer: AccountId) -> Result<i64> {
        let data = self.lock()?;
        Ok(data
            .messages_of(conversation_id)
            .filter(|m| m.sender_id != viewer && !m.is_read)
            .count() as i64)
    }

    async fn list_messages_newest_first(
        &self,
        conversation_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Message>> {
        let data = self.lock()?;
        let mut messages: Vec<Message> = data.messages_of(conversation_id).cloned().collect();
        messages.sort_by(|x, y| (y.created_at, y.id).cmp(&(x.created_at, x.id)));

        Ok(messages
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn list_summaries(&self, viewer: AccountId) -> Result<Vec<ConversationSummaryRow>> {
        let data = self.lock()?;
        let mut rows: Vec<ConversationSummaryRow> = data
            .conversations
            .values()
            .filter(|c| c.is_participant(viewer))
            .map(|c| {
                let last = data
                    .messages_of(c.id)
                    .max_by_key(|m| (m.created_at, m.id));
                let unread_count = data
                    .messages_of(c.id)
                    .filter(|m| m.sender_id != viewer && !m.is_read)
                    .count() as i64;
                ConversationSummaryRow {
                    id: c.id,
                    participant_a: c.participant_a,
                    participant_b: c.participant_b,
                    context: c.context,
                    created_at: c.created_at,
                    last_message_body: last.map(|m| m.body.clone()),
                    last_message_at: last.map(|m| m.created_at),
                    unread_count,
                }
            })
            .collect();

        rows.sort_by(|x, y| {
            let x_key = (x.last_message_at.unwrap_or(x.created_at), x.id);
            let y_key = (y.last_message_at.unwrap_or(y.created_at), y.id);
            y_key.cmp(&x_key)
        });
        Ok(rows)
    }
}
