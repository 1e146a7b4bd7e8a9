//! Participant resolution
//!
//! Maps what the user clicked on (a listing, an agent profile) to the
//! canonical account id of the other party. An agent profile id is not an
//! account id; the catalog links the two.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::directory::ParticipantDirectory;
use crate::domain::entities::{AccountId, AgentProfileId, ChatContext, ListingId};
use nestly_common::{Error, Result};

/// What to do when an agent profile has no linked account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlinkedAgentPolicy {
    /// Treat the profile id as the account id (legacy behavior, logged)
    #[default]
    FallbackToProfileId,
    /// Refuse to resolve
    Reject,
}

impl std::str::FromStr for UnlinkedAgentPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fallback" => Ok(Self::FallbackToProfileId),
            "reject" => Ok(Self::Reject),
            other => Err(Error::Validation(format!(
                "Unknown unlinked agent policy: {}",
                other
            ))),
        }
    }
}

/// Who the caller wants to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContactTarget {
    /// The owner of a listing, about that listing
    Listing { listing_id: ListingId },
    /// An agent, optionally about a listing
    Agent {
        agent_profile_id: AgentProfileId,
        #[serde(default)]
        listing_id: Option<ListingId>,
    },
}

/// A contact target resolved to an account and a conversation context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub counterpart: AccountId,
    pub context: ChatContext,
}

#[derive(Clone)]
pub struct ParticipantResolver {
    directory: Arc<dyn ParticipantDirectory>,
    unlinked_policy: UnlinkedAgentPolicy,
}

impl ParticipantResolver {
    pub fn new(directory: Arc<dyn ParticipantDirectory>, unlinked_policy: UnlinkedAgentPolicy) -> Self {
        Self {
            directory,
            unlinked_policy,
        }
    }

    pub fn directory(&self) -> &Arc<dyn ParticipantDirectory> {
        &self.directory
    }

    /// Account that owns `listing_id`
    pub async fn resolve_owner(&self, listing_id: ListingId) -> Result<AccountId> {
        self.directory
            .listing_owner(listing_id)
            .await?
            .ok_or_else(|| Error::NotFound("Listing not found".to_string()))
    }

    /// Account linked to an agent profile
    pub async fn resolve_agent_account(&self, agent_profile_id: AgentProfileId) -> Result<AccountId> {
        let link = self
            .directory
            .agent_profile(agent_profile_id)
            .await?
            .ok_or_else(|| Error::NotFound("Agent not found".to_string()))?;

        match (link.account_id, self.unlinked_policy) {
            (Some(account_id), _) => Ok(account_id),
            (None, UnlinkedAgentPolicy::FallbackToProfileId) => {
                tracing::warn!(
                    agent_profile_id,
                    "Agent profile has no linked account; using profile id as account id"
                );
                Ok(link.profile_id)
            }
            (None, UnlinkedAgentPolicy::Reject) => Err(Error::NotFound(
                "Agent profile has no linked account".to_string(),
            )),
        }
    }

    pub async fn resolve_target(&self, target: ContactTarget) -> Result<ResolvedTarget> {
        match target {
            ContactTarget::Listing { listing_id } => {
                let context = ChatContext::listing(listing_id)?;
                let counterpart = self.resolve_owner(listing_id).await?;
                Ok(ResolvedTarget {
                    counterpart,
                    context,
                })
            }
            ContactTarget::Agent {
                agent_profile_id,
                listing_id,
            } => {
                let context = match listing_id {
                    Some(id) => ChatContext::listing(id)?,
                    None => ChatContext::AgentConsultation,
                };
                let counterpart = self.resolve_agent_account(agent_profile_id).await?;
                Ok(ResolvedTarget {
                    counterpart,
                    context,
                })
            }
        }
    }
}
