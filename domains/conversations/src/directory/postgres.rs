//! Postgres-backed catalog reads
//!
//! Runtime `sqlx::query_as` against tables owned by the marketplace
//! catalog (CQRS read model; this domain never writes them).

use std::collections::HashMap;

use sqlx::PgPool;

use super::{AgentProfileLink, ParticipantDirectory};
use crate::domain::entities::{AccountId, AgentProfileId, ListingId};
use nestly_common::Result;

#[derive(Clone)]
pub struct PgParticipantDirectory {
    pool: PgPool,
}

impl PgParticipantDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ParticipantDirectory for PgParticipantDirectory {
    async fn listing_owner(&self, listing_id: ListingId) -> Result<Option<AccountId>> {
        let owner = sqlx::query_scalar::<_, AccountId>(
            "SELECT owner_account_id FROM listings WHERE id = $1",
        )
        .bind(listing_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(owner)
    }

    async fn agent_profile(
        &self,
        agent_profile_id: AgentProfileId,
    ) -> Result<Option<AgentProfileLink>> {
        let link = sqlx::query_as::<_, AgentProfileLink>(
            r#"
            SELECT id AS profile_id, account_id
            FROM agent_profiles
            WHERE id = $1
            "#,
        )
        .bind(agent_profile_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(link)
    }

    async fn account_name(&self, account_id: AccountId) -> Result<Option<String>> {
        let name = sqlx::query_scalar::<_, Option<String>>(
            "SELECT display_name FROM accounts WHERE id = $1",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(name.flatten())
    }

    async fn listing_title(&self, listing_id: ListingId) -> Result<Option<String>> {
        let title = sqlx::query_scalar::<_, Option<String>>(
            "SELECT title FROM listings WHERE id = $1",
        )
        .bind(listing_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(title.flatten())
    }

    async fn account_names(&self, account_ids: &[AccountId]) -> Result<HashMap<AccountId, String>> {
        if account_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (AccountId, String)>(
            "SELECT id, display_name FROM accounts WHERE id = ANY($1)",
        )
        .bind(account_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn listing_titles(&self, listing_ids: &[ListingId]) -> Result<HashMap<ListingId, String>> {
        if listing_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (ListingId, String)>(
            "SELECT id, title FROM listings WHERE id = ANY($1)",
        )
        .bind(listing_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }
}
