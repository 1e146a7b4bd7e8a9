//! Nestly application composition root
//!
//! Builds the conversations domain state from configuration and composes
//! its router with shared infrastructure routes.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use nestly_auth::{AuthBackend, AuthConfig};
use nestly_common::{Config, StoreBackend};
use nestly_conversations::{
    ChatConfig, ConversationService, ConversationStore, ConversationsRepositories,
    ConversationsState, InMemoryConversationStore, InMemoryDirectory, ParticipantDirectory,
    PgParticipantDirectory,
};
use sqlx::PgPool;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
};

/// Maximum accepted request body size
pub const BODY_LIMIT_BYTES: usize = 64 * 1024;

/// Build the conversations domain state for the configured store backend
pub fn build_state(config: &Config, pool: Option<PgPool>) -> Result<ConversationsState, anyhow::Error> {
    let chat_config = ChatConfig::from_config(config)?;

    let (store, directory): (Arc<dyn ConversationStore>, Arc<dyn ParticipantDirectory>) =
        match (config.store_backend, pool) {
            (StoreBackend::Postgres, Some(pool)) => (
                Arc::new(ConversationsRepositories::new(pool.clone())),
                Arc::new(PgParticipantDirectory::new(pool)),
            ),
            (StoreBackend::Postgres, None) => {
                return Err(anyhow::anyhow!(
                    "A database pool is required for the postgres store"
                ));
            }
            (StoreBackend::Memory, _) => {
                tracing::warn!("Using in-memory conversation store; data is lost on restart");
                (
                    Arc::new(InMemoryConversationStore::new()),
                    Arc::new(InMemoryDirectory::new()),
                )
            }
        };

    if chat_config.support.account_id.is_none() {
        tracing::warn!("SUPPORT_ACCOUNT_ID is not set; support contact rules are inactive");
    }

    let service = ConversationService::new(store, directory, chat_config);
    let auth = AuthBackend::new(AuthConfig::from(config));

    Ok(ConversationsState::new(service, auth))
}

/// Create the main application router with all routes
pub async fn create_app(config: Config, pool: Option<PgPool>) -> Result<Router, anyhow::Error> {
    let state = build_state(&config, pool)?;
    Ok(router(state))
}

/// Compose domain routers with shared infrastructure routes
pub fn router(state: ConversationsState) -> Router {
    Router::new()
        .route("/health", axum::routing::get(health_check))
        .route(
            "/",
            axum::routing::get(|| async { concat!("Nestly API v", env!("CARGO_PKG_VERSION")) }),
        )
        .merge(nestly_conversations::routes().with_state(state))
}

/// CORS layer from a comma-separated origin list; `*` allows any origin
pub fn build_cors_layer(origins: &str) -> CorsLayer {
    let allow_origin = if origins.trim() == "*" {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Reject request bodies above `BODY_LIMIT_BYTES`
pub fn body_limit_layer() -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(BODY_LIMIT_BYTES)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
