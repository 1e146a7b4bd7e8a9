//! Backward message pagination
//!
//! Pages are offset-based from the newest message. New messages arriving at
//! the live end shift nothing the client has already loaded, but a message
//! landing exactly at the fetch boundary during a fetch can be skipped or
//! repeated.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::Message;
use crate::repository::ConversationStore;
use nestly_common::Result;

/// One page of history, oldest first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessagePage<T = Message> {
    pub messages: Vec<T>,
    pub total: i64,
    pub can_load_more: bool,
}

impl<T> MessagePage<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> MessagePage<U> {
        MessagePage {
            messages: self.messages.into_iter().map(f).collect(),
            total: self.total,
            can_load_more: self.can_load_more,
        }
    }
}

#[derive(Clone)]
pub struct PaginationReader {
    store: Arc<dyn ConversationStore>,
    default_page_size: i64,
    max_page_size: i64,
}

impl PaginationReader {
    pub fn new(store: Arc<dyn ConversationStore>, default_page_size: i64, max_page_size: i64) -> Self {
        let max_page_size = max_page_size.max(1);
        Self {
            store,
            default_page_size: default_page_size.clamp(1, max_page_size),
            max_page_size,
        }
    }

    pub fn default_page_size(&self) -> i64 {
        self.default_page_size
    }

    pub fn max_page_size(&self) -> i64 {
        self.max_page_size
    }

    /// Clamp a requested page size into `[1, max_page_size]`
    pub fn page_size(&self, requested: Option<i64>) -> i64 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size)
    }

    /// Newest `page_size` messages, in ascending order
    pub async fn first_page(&self, conversation_id: Uuid, page_size: Option<i64>) -> Result<MessagePage> {
        let page_size = self.page_size(page_size);
        let total = self.store.count_messages(conversation_id).await?;
        let messages = self.load(conversation_id, 0, page_size).await?;

        Ok(MessagePage {
            messages,
            total,
            can_load_more: total > page_size,
        })
    }

    /// The next `page_size` messages older than the `already_loaded` newest
    /// ones, in ascending order so the client can prepend them
    pub async fn older_page(
        &self,
        conversation_id: Uuid,
        already_loaded: i64,
        page_size: Option<i64>,
    ) -> Result<MessagePage> {
        let already_loaded = already_loaded.max(0);
        let page_size = self.page_size(page_size);
        let total = self.store.count_messages(conversation_id).await?;
        let messages = self.load(conversation_id, already_loaded, page_size).await?;
        let returned = messages.len() as i64;

        Ok(MessagePage {
            messages,
            total,
            can_load_more: total > already_loaded + returned,
        })
    }

    async fn load(&self, conversation_id: Uuid, offset: i64, limit: i64) -> Result<Vec<Message>> {
        let mut messages = self
            .store
            .list_messages_newest_first(conversation_id, offset, limit)
            .await?;
        messages.reverse();
        Ok(messages)
    }
}
