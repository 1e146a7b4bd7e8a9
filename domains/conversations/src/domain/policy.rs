//! Messaging access rules
//!
//! Stateless checks evaluated before any conversation storage is touched.
//! The reserved support identity comes from configuration.

use nestly_auth::AuthContext;
use nestly_common::{Error, Result};

use crate::domain::entities::AccountId;

/// The reserved support account, if one is configured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SupportIdentity {
    pub account_id: Option<AccountId>,
}

impl SupportIdentity {
    pub fn new(account_id: Option<AccountId>) -> Self {
        Self { account_id }
    }

    pub fn is_support_account(&self, account: AccountId) -> bool {
        self.account_id == Some(account)
    }

    /// Whether the caller is the configured support account. Token role
    /// claims never confer the identity.
    pub fn held_by(&self, viewer: &AuthContext) -> bool {
        self.is_support_account(viewer.account_id)
    }
}

/// Rule evaluator for contact attempts
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyGuard {
    support: SupportIdentity,
}

impl PolicyGuard {
    pub fn new(support: SupportIdentity) -> Self {
        Self { support }
    }

    pub fn support(&self) -> &SupportIdentity {
        &self.support
    }

    /// Whether `viewer` may address `counterpart` at all. Rules run in order;
    /// the first failing rule decides.
    pub fn check_contact(&self, viewer: &AuthContext, counterpart: AccountId) -> Result<()> {
        if viewer.account_id == counterpart {
            return Err(Error::PolicyViolation("cannot message self".to_string()));
        }

        let counterpart_is_support = self.support.is_support_account(counterpart);

        if self.support.held_by(viewer) && counterpart_is_support {
            return Err(Error::PolicyViolation(
                "support accounts cannot message the support account".to_string(),
            ));
        }

        if counterpart_is_support {
            return Err(Error::PolicyViolation(
                "the support account cannot be contacted directly; use the feedback channel"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Whether `viewer` may open a brand-new thread. Support only ever
    /// replies inside threads that already exist.
    pub fn check_cold_open(&self, viewer: &AuthContext) -> Result<()> {
        if self.support.held_by(viewer) {
            return Err(Error::PolicyViolation(
                "support may only reply to existing conversations".to_string(),
            ));
        }
        Ok(())
    }
}
