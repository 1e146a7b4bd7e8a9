//! Domain layer for Conversations: entities, access rules, state machine

pub mod entities;
pub mod policy;
pub mod state;
