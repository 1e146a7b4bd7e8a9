//! Per-viewer conversation state machine
//!
//! Each participant sees a conversation as NonExistent, Unread or Read;
//! Deleted is terminal. The two participants' states are independent.

pub use nestly_common::StateError;
use serde::{Deserialize, Serialize};

/// Conversation state from one participant's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    NonExistent,
    Unread,
    Read,
    Deleted,
}

impl ConversationState {
    /// Derive the state of an existing conversation from the viewer's unread count
    pub fn from_unread_count(unread: i64) -> Self {
        if unread > 0 {
            Self::Unread
        } else {
            Self::Read
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Deleted)
    }
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonExistent => write!(f, "non_existent"),
            Self::Unread => write!(f, "unread"),
            Self::Read => write!(f, "read"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

/// Events observed by one participant
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConversationEvent {
    /// The viewer sent a message
    SendOwn,
    /// The other participant sent a message
    ReceiveOther,
    /// The viewer opened or polled the conversation
    Open,
    /// Either participant deleted the conversation
    Delete,
}

impl std::fmt::Display for ConversationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SendOwn => write!(f, "send_own"),
            Self::ReceiveOther => write!(f, "receive_other"),
            Self::Open => write!(f, "open"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Conversation state machine
pub struct ConversationStateMachine;

impl ConversationStateMachine {
    /// Attempt a state transition
    pub fn transition(
        current: ConversationState,
        event: ConversationEvent,
    ) -> Result<ConversationState, StateError> {
        use ConversationEvent as E;
        use ConversationState as S;

        if current.is_terminal() {
            return Err(StateError::TerminalState(current.to_string()));
        }

        let next = match (current, event) {
            (S::NonExistent, E::SendOwn) => S::Read,
            (S::NonExistent, E::ReceiveOther) => S::Unread,
            (S::Unread | S::Read, E::Open) => S::Read,
            (S::Unread | S::Read, E::ReceiveOther) => S::Unread,
            (S::Unread | S::Read, E::SendOwn) => current,
            (S::Unread | S::Read, E::Delete) => S::Deleted,
            _ => {
                return Err(StateError::InvalidTransition {
                    from: current.to_string(),
                    event: event.to_string(),
                });
            }
        };

        Ok(next)
    }
}
