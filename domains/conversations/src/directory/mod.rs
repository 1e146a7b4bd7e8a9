//! Read-only view of the external listing/agent catalog
//!
//! The catalog owns listings, agent profiles and account display names.
//! This domain only reads them, by id.

pub mod memory;
pub mod postgres;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::entities::{AccountId, AgentProfileId, ListingId};
use nestly_common::Result;

pub use memory::InMemoryDirectory;
pub use postgres::PgParticipantDirectory;

/// An agent profile and the account it is linked to, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AgentProfileLink {
    pub profile_id: AgentProfileId,
    pub account_id: Option<AccountId>,
}

/// Catalog lookups needed by the messaging core
#[async_trait::async_trait]
pub trait ParticipantDirectory: Send + Sync {
    /// Account that owns a listing
    async fn listing_owner(&self, listing_id: ListingId) -> Result<Option<AccountId>>;

    /// Agent profile with its linked account
    async fn agent_profile(&self, agent_profile_id: AgentProfileId)
        -> Result<Option<AgentProfileLink>>;

    /// Display name for an account
    async fn account_name(&self, account_id: AccountId) -> Result<Option<String>>;

    /// Title of a listing
    async fn listing_title(&self, listing_id: ListingId) -> Result<Option<String>>;

    /// Display names for many accounts in one round trip; unknown ids are absent
    async fn account_names(&self, account_ids: &[AccountId]) -> Result<HashMap<AccountId, String>>;

    /// Titles for many listings in one round trip; unknown ids are absent
    async fn listing_titles(&self, listing_ids: &[ListingId]) -> Result<HashMap<ListingId, String>>;
}
