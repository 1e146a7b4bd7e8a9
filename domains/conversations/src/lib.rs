//! Conversations domain: two-party listing and agent chat threads, messages,
//! read tracking

pub mod api;
pub mod config;
pub mod directory;
pub mod domain;
pub mod pagination;
pub mod repository;
pub mod resolver;
pub mod service;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{ChatContext, Conversation, Message, MessageView, NewMessage};
pub use domain::policy::{PolicyGuard, SupportIdentity};
pub use domain::state::{
    ConversationEvent, ConversationState, ConversationStateMachine, StateError,
};

// Re-export repository and collaborator types
pub use directory::{InMemoryDirectory, ParticipantDirectory, PgParticipantDirectory};
pub use repository::{
    ConversationRepository, ConversationStore, ConversationsRepositories,
    InMemoryConversationStore, MessageRepository,
};

pub use config::ChatConfig;
pub use pagination::{MessagePage, PaginationReader};
pub use resolver::{ContactTarget, ParticipantResolver, UnlinkedAgentPolicy};
pub use service::{ConversationService, ConversationSummary, CreateOutcome, OpenedConversation};

// Re-export API types
pub use api::routes;
pub use api::ConversationsState;
