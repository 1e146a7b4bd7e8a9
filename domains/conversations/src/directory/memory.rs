//! In-memory catalog
//!
//! Used by tests and by the local server when running without Postgres.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockWriteGuard};

use super::{AgentProfileLink, ParticipantDirectory};
use crate::domain::entities::{AccountId, AgentProfileId, ListingId};
use nestly_common::Result;

#[derive(Debug, Default)]
struct CatalogData {
    accounts: HashMap<AccountId, String>,
    listings: HashMap<ListingId, (AccountId, String)>,
    agents: HashMap<AgentProfileId, Option<AccountId>>,
}

#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    data: RwLock<CatalogData>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, account_id: AccountId, name: &str) -> Self {
        self.insert_account(account_id, name);
        self
    }

    pub fn with_listing(self, listing_id: ListingId, owner: AccountId, title: &str) -> Self {
        self.insert_listing(listing_id, owner, title);
        self
    }

    pub fn with_agent(self, profile_id: AgentProfileId, account_id: Option<AccountId>) -> Self {
        self.insert_agent(profile_id, account_id);
        self
    }

    pub fn insert_account(&self, account_id: AccountId, name: &str) {
        self.write().accounts.insert(account_id, name.to_string());
    }

    pub fn insert_listing(&self, listing_id: ListingId, owner: AccountId, title: &str) {
        self.write()
            .listings
            .insert(listing_id, (owner, title.to_string()));
    }

    pub fn insert_agent(&self, profile_id: AgentProfileId, account_id: Option<AccountId>) {
        self.write().agents.insert(profile_id, account_id);
    }

    // Writes are single map inserts; a poisoned lock holds no partial state
    fn write(&self) -> RwLockWriteGuard<'_, CatalogData> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<T>(&self, f: impl FnOnce(&CatalogData) -> T) -> Result<T> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(f(&data))
    }
}

#[async_trait::async_trait]
impl ParticipantDirectory for InMemoryDirectory {
    async fn listing_owner(&self, listing_id: ListingId) -> Result<Option<AccountId>> {
        self.read(|d| d.listings.get(&listing_id).map(|(owner, _)| *owner))
    }

    async fn agent_profile(
        &self,
        agent_profile_id: AgentProfileId,
    ) -> Result<Option<AgentProfileLink>> {
        self.read(|d| {
            d.agents
                .get(&agent_profile_id)
                .map(|account_id| AgentProfileLink {
                    profile_id: agent_profile_id,
                    account_id: *account_id,
                })
        })
    }

    async fn account_name(&self, account_id: AccountId) -> Result<Option<String>> {
        self.read(|d| d.accounts.get(&account_id).cloned())
    }

    async fn listing_title(&self, listing_id: ListingId) -> Result<Option<String>> {
        self.read(|d| d.listings.get(&listing_id).map(|(_, title)| title.clone()))
    }

    async fn account_names(&self, account_ids: &[AccountId]) -> Result<HashMap<AccountId, String>> {
        self.read(|d| {
            account_ids
                .iter()
                .filter_map(|id| d.accounts.get(id).map(|name| (*id, name.clone())))
                .collect()
        })
    }

    async fn listing_titles(&self, listing_ids: &[ListingId]) -> Result<HashMap<ListingId, String>> {
        self.read(|d| {
            listing_ids
                .iter()
                .filter_map(|id| d.listings.get(id).map(|(_, title)| (*id, title.clone())))
                .collect()
        })
    }
}
