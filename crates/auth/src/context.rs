//! Verified caller identity

use crate::types::AuthRole;

/// The verified `(account_id, role)` pair handed to domain operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub account_id: i64,
    pub role: AuthRole,
}

impl AuthContext {
    pub fn new(account_id: i64, role: AuthRole) -> Self {
        Self { account_id, role }
    }
}

