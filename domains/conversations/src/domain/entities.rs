//! Domain entities for the Conversations domain
//!
//! A conversation is a two-party thread, optionally scoped to a listing.
//! Messages are append-only; only their read flag ever changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use nestly_common::{Error, Result};

/// Verified numeric account id from the identity boundary
pub type AccountId = i64;

/// Listing id owned by the external catalog
pub type ListingId = i64;

/// Agent profile id owned by the external catalog
pub type AgentProfileId = i64;

/// Maximum message body length in characters, after trimming
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Persisted `context_id` for agent consultations with no listing
pub const AGENT_CONSULTATION_CONTEXT_ID: i64 = 0;

/// What a conversation is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatContext {
    Listing { listing_id: ListingId },
    AgentConsultation,
}

impl ChatContext {
    /// Context for a specific listing; listing ids are strictly positive
    pub fn listing(listing_id: ListingId) -> Result<Self> {
        if listing_id <= 0 {
            return Err(Error::Validation(format!(
                "Listing id must be positive, got {}",
                listing_id
            )));
        }
        Ok(ChatContext::Listing { listing_id })
    }

    /// Decode the persisted column value
    pub fn from_context_id(context_id: i64) -> Result<Self> {
        if context_id == AGENT_CONSULTATION_CONTEXT_ID {
            Ok(ChatContext::AgentConsultation)
        } else {
            Self::listing(context_id)
        }
    }

    /// Encode for the `context_id` column
    pub fn context_id(&self) -> i64 {
        match self {
            ChatContext::Listing { listing_id } => *listing_id,
            ChatContext::AgentConsultation => AGENT_CONSULTATION_CONTEXT_ID,
        }
    }

    pub fn listing_id(&self) -> Option<ListingId> {
        match self {
            ChatContext::Listing { listing_id } => Some(*listing_id),
            ChatContext::AgentConsultation => None,
        }
    }
}

impl TryFrom<i64> for ChatContext {
    type Error = Error;

    fn try_from(context_id: i64) -> Result<Self> {
        ChatContext::from_context_id(context_id)
    }
}

impl std::fmt::Display for ChatContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatContext::Listing { listing_id } => write!(f, "listing:{}", listing_id),
            ChatContext::AgentConsultation => write!(f, "agent_consultation"),
        }
    }
}

/// Conversation entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Conversation {
    pub id: Uuid,
    /// The account that opened the thread
    pub participant_a: AccountId,
    pub participant_b: AccountId,
    #[sqlx(rename = "context_id", try_from = "i64")]
    pub context: ChatContext,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new conversation between two distinct accounts
    pub fn new(initiator: AccountId, counterpart: AccountId, context: ChatContext) -> Result<Self> {
        if initiator <= 0 || counterpart <= 0 {
            return Err(Error::Validation(
                "Participant ids must be positive".to_string(),
            ));
        }
        if initiator == counterpart {
            return Err(Error::PolicyViolation("cannot message self".to_string()));
        }

        Ok(Conversation {
            id: Uuid::new_v4(),
            participant_a: initiator,
            participant_b: counterpart,
            context,
            created_at: Utc::now(),
        })
    }

    pub fn is_participant(&self, account: AccountId) -> bool {
        self.participant_a == account || self.participant_b == account
    }

    /// The other participant relative to `viewer`, if `viewer` takes part
    pub fn counterpart_of(&self, viewer: AccountId) -> Option<AccountId> {
        if self.participant_a == viewer {
            Some(self.participant_b)
        } else if self.participant_b == viewer {
            Some(self.participant_a)
        } else {
            None
        }
    }

    /// Order-independent pair key, `(min, max)`
    pub fn normalized_pair(&self) -> (AccountId, AccountId) {
        normalized_pair(self.participant_a, self.participant_b)
    }
}

/// Order-independent key for an unordered pair of accounts
pub fn normalized_pair(a: AccountId, b: AccountId) -> (AccountId, AccountId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Validate a message body and return the trimmed text that gets stored
pub fn validate_body(body: &str) -> Result<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(
            "Message body cannot be empty or whitespace-only".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(Error::Validation(format!(
            "Message body must be at most {} characters",
            MAX_MESSAGE_LENGTH
        )));
    }
    Ok(trimmed.to_string())
}

/// Message entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: i64,
    pub conversation_id: Uuid,
    pub sender_id: AccountId,
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Project the message for a particular viewer
    pub fn view_for(&self, viewer: AccountId) -> MessageView {
        MessageView {
            id: self.id,
            sender_id: self.sender_id,
            body: self.body.clone(),
            is_read: self.is_read,
            is_own: self.sender_id == viewer,
            created_at: self.created_at,
        }
    }
}

/// A message that has passed validation but has no id yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub conversation_id: Uuid,
    pub sender_id: AccountId,
    pub body: String,
}

impl NewMessage {
    pub fn new(conversation_id: Uuid, sender_id: AccountId, body: &str) -> Result<Self> {
        Ok(NewMessage {
            conversation_id,
            sender_id,
            body: validate_body(body)?,
        })
    }
}

/// Per-viewer message projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageView {
    pub id: i64,
    pub sender_id: AccountId,
    pub body: String,
    pub is_read: bool,
    pub is_own: bool,
    pub created_at: DateTime<Utc>,
}
