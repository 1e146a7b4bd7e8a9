//! Messaging configuration derived from the service `Config`

use nestly_common::{Config, Error, Result};

use crate::domain::policy::SupportIdentity;
use crate::resolver::UnlinkedAgentPolicy;

/// Runtime settings for the conversations domain
#[derive(Debug, Clone, Copy)]
pub struct ChatConfig {
    pub support: SupportIdentity,
    pub default_page_size: i64,
    pub max_page_size: i64,
    pub unlinked_agent_policy: UnlinkedAgentPolicy,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            support: SupportIdentity::default(),
            default_page_size: 20,
            max_page_size: 100,
            unlinked_agent_policy: UnlinkedAgentPolicy::default(),
        }
    }
}

impl ChatConfig {
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.chat_max_page_size < 1 {
            return Err(Error::Validation(
                "CHAT_MAX_PAGE_SIZE must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            support: SupportIdentity::new(config.support_account_id),
            default_page_size: config.chat_page_size.clamp(1, config.chat_max_page_size),
            max_page_size: config.chat_max_page_size,
            unlinked_agent_policy: config.unlinked_agent_policy.parse()?,
        })
    }
}
