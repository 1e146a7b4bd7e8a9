//! Conversation facade
//!
//! Every client-facing messaging operation goes through `ConversationService`.
//! The caller's verified identity is always an explicit `AuthContext`
//! argument.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use nestly_auth::AuthContext;
use nestly_common::{Error, Result};

use crate::config::ChatConfig;
use crate::directory::ParticipantDirectory;
use crate::domain::entities::{
    validate_body, AccountId, ChatContext, Conversation, ListingId, Message, MessageView,
};
use crate::domain::policy::PolicyGuard;
use crate::domain::state::{ConversationEvent, ConversationState, ConversationStateMachine};
use crate::pagination::{MessagePage, PaginationReader};
use crate::repository::{ConversationStore, ConversationSummaryRow};
use crate::resolver::{ContactTarget, ParticipantResolver};

/// Inbox row for one viewer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub counterpart_id: AccountId,
    pub counterpart_name: Option<String>,
    pub context: ChatContext,
    pub context_title: Option<String>,
    pub last_message_text: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread_count: i64,
    pub state: ConversationState,
}

/// A conversation as returned when a participant opens it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenedConversation {
    pub id: Uuid,
    pub counterpart_id: AccountId,
    pub counterpart_name: Option<String>,
    pub context: ChatContext,
    pub context_title: Option<String>,
    pub messages: Vec<MessageView>,
    pub total: i64,
    pub can_load_more: bool,
    pub state: ConversationState,
}

/// Result of create-or-reuse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CreateOutcome {
    pub conversation_id: Uuid,
    pub was_created: bool,
}

#[derive(Clone)]
pub struct ConversationService {
    store: Arc<dyn ConversationStore>,
    resolver: ParticipantResolver,
    guard: PolicyGuard,
    pages: PaginationReader,
}

impl ConversationService {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        directory: Arc<dyn ParticipantDirectory>,
        config: ChatConfig,
    ) -> Self {
        Self {
            resolver: ParticipantResolver::new(directory, config.unlinked_agent_policy),
            guard: PolicyGuard::new(config.support),
            pages: PaginationReader::new(
                store.clone(),
                config.default_page_size,
                config.max_page_size,
            ),
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    pub fn pages(&self) -> &PaginationReader {
        &self.pages
    }

    /// Load a conversation the viewer takes part in. Non-participants get
    /// `NotFound` so conversation ids do not leak.
    async fn participant_conversation(&self, viewer: &AuthContext, id: Uuid) -> Result<Conversation> {
        self.store
            .find_conversation(id)
            .await?
            .filter(|c| c.is_participant(viewer.account_id))
            .ok_or_else(|| Error::NotFound("Conversation not found".to_string()))
    }

    async fn counterpart_name(&self, counterpart: AccountId) -> Result<Option<String>> {
        self.resolver.directory().account_name(counterpart).await
    }

    async fn context_title(&self, context: ChatContext) -> Result<Option<String>> {
        match context.listing_id() {
            Some(listing_id) => self.resolver.directory().listing_title(listing_id).await,
            None => Ok(None),
        }
    }

    fn summarize(
        viewer: AccountId,
        row: ConversationSummaryRow,
        names: &HashMap<AccountId, String>,
        titles: &HashMap<ListingId, String>,
    ) -> ConversationSummary {
        let counterpart_id = if row.participant_a == viewer {
            row.participant_b
        } else {
            row.participant_a
        };

        ConversationSummary {
            id: row.id,
            counterpart_id,
            counterpart_name: names.get(&counterpart_id).cloned(),
            context: row.context,
            context_title: row
                .context
                .listing_id()
                .and_then(|listing_id| titles.get(&listing_id).cloned()),
            last_message_text: row.last_message_body,
            last_message_at: row.last_message_at,
            unread_count: row.unread_count,
            state: ConversationState::from_unread_count(row.unread_count),
        }
    }

    /// Every conversation the viewer takes part in, most recent activity first.
    /// Counterpart names and listing titles are fetched in one batch each.
    pub async fn list_conversations(&self, viewer: &AuthContext) -> Result<Vec<ConversationSummary>> {
        let rows = self.store.list_summaries(viewer.account_id).await?;

        let mut counterparts = HashSet::new();
        let mut listings = HashSet::new();
        for row in &rows {
            counterparts.insert(if row.participant_a == viewer.account_id {
                row.participant_b
            } else {
                row.participant_a
            });
            if let Some(listing_id) = row.context.listing_id() {
                listings.insert(listing_id);
            }
        }

        let directory = self.resolver.directory();
        let names = directory
            .account_names(&counterparts.into_iter().collect::<Vec<_>>())
            .await?;
        let titles = directory
            .listing_titles(&listings.into_iter().collect::<Vec<_>>())
            .await?;

        let summaries: Vec<ConversationSummary> = rows
            .into_iter()
            .map(|row| Self::summarize(viewer.account_id, row, &names, &titles))
            .collect();

        tracing::debug!(
            viewer_id = viewer.account_id,
            count = summaries.len(),
            "Listed conversations"
        );
        Ok(summaries)
    }

    /// Open a conversation: mark it read for the viewer, then return the
    /// newest page of messages
    pub async fn open_conversation(
        &self,
        viewer: &AuthContext,
        id: Uuid,
        page_size: Option<i64>,
    ) -> Result<OpenedConversation> {
        let conv = self.participant_conversation(viewer, id).await?;
        let counterpart_id = conv
            .counterpart_of(viewer.account_id)
            .ok_or_else(|| Error::NotFound("Conversation not found".to_string()))?;

        // Rows flipped by mark_read tell us whether the viewer was behind
        let marked = self.store.mark_read(id, viewer.account_id).await?;
        let previous = ConversationState::from_unread_count(marked as i64);
        let state = ConversationStateMachine::transition(previous, ConversationEvent::Open)
            .map_err(|e| Error::Internal(e.to_string()))?;

        let page = self.pages.first_page(id, page_size).await?;

        tracing::info!(
            conversation_id = %id,
            viewer_id = viewer.account_id,
            marked,
            previous_state = %previous,
            "Conversation opened"
        );

        Ok(OpenedConversation {
            id,
            counterpart_id,
            counterpart_name: self.counterpart_name(counterpart_id).await?,
            context: conv.context,
            context_title: self.context_title(conv.context).await?,
            messages: page
                .messages
                .iter()
                .map(|m| m.view_for(viewer.account_id))
                .collect(),
            total: page.total,
            can_load_more: page.can_load_more,
            state,
        })
    }

    /// Older history for a viewer that has already loaded `skip` messages
    pub async fn fetch_older(
        &self,
        viewer: &AuthContext,
        id: Uuid,
        skip: i64,
        take: Option<i64>,
    ) -> Result<MessagePage<MessageView>> {
        self.participant_conversation(viewer, id).await?;
        let page = self.pages.older_page(id, skip, take).await?;
        Ok(page.map(|m| m.view_for(viewer.account_id)))
    }

    /// Append a message from the viewer
    pub async fn send_message(&self, viewer: &AuthContext, id: Uuid, text: &str) -> Result<Message> {
        let message = self.store.append_message(id, viewer.account_id, text).await?;

        tracing::info!(
            conversation_id = %id,
            viewer_id = viewer.account_id,
            message_id = message.id,
            "Message sent"
        );
        Ok(message)
    }

    /// Mark every incoming message read for the viewer; returns rows flipped
    pub async fn mark_read(&self, viewer: &AuthContext, id: Uuid) -> Result<u64> {
        self.participant_conversation(viewer, id).await?;
        let marked = self.store.mark_read(id, viewer.account_id).await?;

        tracing::debug!(
            conversation_id = %id,
            viewer_id = viewer.account_id,
            marked,
            "Conversation marked read"
        );
        Ok(marked)
    }

    /// Find the viewer's thread with `target`, or start one. The optional
    /// initial text is stored only when a new thread is created.
    pub async fn create_or_reuse(
        &self,
        viewer: &AuthContext,
        target: ContactTarget,
        initial_text: Option<&str>,
    ) -> Result<CreateOutcome> {
        let initial_text = initial_text.map(validate_body).transpose()?;

        let resolved = self.resolver.resolve_target(target).await?;
        self.guard.check_contact(viewer, resolved.counterpart)?;

        if let Some(existing) = self
            .store
            .find_by_pair(viewer.account_id, resolved.counterpart, resolved.context)
            .await?
        {
            tracing::debug!(
                conversation_id = %existing.id,
                viewer_id = viewer.account_id,
                counterpart_id = resolved.counterpart,
                "Reusing existing conversation"
            );
            return Ok(CreateOutcome {
                conversation_id: existing.id,
                was_created: false,
            });
        }

        self.guard.check_cold_open(viewer)?;

        let outcome = self
            .store
            .lookup_or_create(
                viewer.account_id,
                resolved.counterpart,
                resolved.context,
                initial_text.as_deref(),
            )
            .await?;

        tracing::info!(
            conversation_id = %outcome.conversation.id,
            viewer_id = viewer.account_id,
            counterpart_id = resolved.counterpart,
            context = %resolved.context,
            was_created = outcome.created,
            "Create-or-reuse completed"
        );

        Ok(CreateOutcome {
            conversation_id: outcome.conversation.id,
            was_created: outcome.created,
        })
    }

    /// Hard delete on behalf of either participant
    pub async fn delete_conversation(&self, viewer: &AuthContext, id: Uuid) -> Result<()> {
        let conv = self
            .store
            .find_conversation(id)
            .await?
            .ok_or_else(|| Error::NotFound("Conversation not found".to_string()))?;

        if !conv.is_participant(viewer.account_id) {
            return Err(Error::Authorization(
                "Only participants can delete this conversation".to_string(),
            ));
        }

        if !self.store.delete_conversation(id).await? {
            return Err(Error::NotFound("Conversation not found".to_string()));
        }

        tracing::info!(
            conversation_id = %id,
            viewer_id = viewer.account_id,
            "Conversation deleted"
        );
        Ok(())
    }
}
