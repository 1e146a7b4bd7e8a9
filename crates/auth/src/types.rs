//! Role claim carried by verified identities

use serde::{Deserialize, Serialize};

/// Application role from the access token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthRole {
    #[default]
    Member,
    Agent,
    Support,
}

impl AuthRole {
    /// Parse the role claim; absent or unknown roles are ordinary members
    pub fn from_claim(claim: Option<&str>) -> Self {
        match claim.map(|c| c.trim().to_ascii_lowercase()).as_deref() {
            Some("agent") => AuthRole::Agent,
            Some("support") => AuthRole::Support,
            _ => AuthRole::Member,
        }
    }
}

impl std::fmt::Display for AuthRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthRole::Member => write!(f, "member"),
            AuthRole::Agent => write!(f, "agent"),
            AuthRole::Support => write!(f, "support"),
        }
    }
}
