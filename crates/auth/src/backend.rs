//! Authentication backend
//!
//! Turns a bearer credential into a verified `AuthContext`. No database
//! access: the identity service is the source of truth for accounts.

use crate::config::AuthConfig;
use crate::context::AuthContext;
use crate::error::AuthError;
use crate::jwt::validate_jwt_token;
use crate::types::AuthRole;

/// Authentication backend shared by domain states.
///
/// Domain states expose this via `FromRef`:
/// ```ignore
/// impl FromRef<MyDomainState> for AuthBackend {
///     fn from_ref(state: &MyDomainState) -> Self {
///         state.auth.clone()
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthBackend {
    config: AuthConfig,
}

impl AuthBackend {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Validate a JWT and extract the caller's account id and role
    pub fn authenticate_jwt(&self, token: &str) -> Result<AuthContext, AuthError> {
        let claims = validate_jwt_token(token, &self.config)?;

        let account_id = claims
            .sub
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| {
                tracing::debug!(sub = %claims.sub, "JWT subject is not a valid account id");
                AuthError::InvalidAccountId
            })?;

        let role = AuthRole::from_claim(claims.role.as_deref());

        Ok(AuthContext::new(account_id, role))
    }
}
