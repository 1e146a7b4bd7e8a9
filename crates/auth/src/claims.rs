//! JWT claims types

use serde::{Deserialize, Serialize};

/// Access token claims issued by the marketplace identity service
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (numeric account id, serialized as a string)
    pub sub: String,
    /// Application role: `member`, `agent` or `support`
    #[serde(default)]
    pub role: Option<String>,
    /// Issued at
    pub iat: u64,
    /// Expires at
    pub exp: u64,
    /// Audience
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    /// Issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}
