//! Axum extractors for authentication
//!
//! Generic over any state `S` where `AuthBackend: FromRef<S>`.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::backend::AuthBackend;
use crate::context::AuthContext;
use crate::error::AuthError;
use crate::jwt::extract_bearer_token;

/// Verified caller for chat endpoints.
///
/// Rejects with 401 before the handler runs, so handlers never see an
/// anonymous viewer.
#[derive(Debug)]
pub struct AuthUser(pub AuthContext);

impl<S> FromRequestParts<S> for AuthUser
where
    AuthBackend: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let backend = AuthBackend::from_ref(state);

        let header = parts.headers.get(AUTHORIZATION).ok_or_else(|| {
            tracing::debug!(path = %parts.uri.path(), "Request without authorization header");
            AuthError::MissingAuthorization
        })?;

        let token = extract_bearer_token(header)?;
        let viewer = backend.authenticate_jwt(&token)?;

        tracing::debug!(
            account_id = viewer.account_id,
            role = %viewer.role,
            "Authenticated caller"
        );

        Ok(AuthUser(viewer))
    }
}
