//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Which conversation store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow::anyhow!("Unknown CHAT_STORE backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database connection URL; required for the Postgres store
    pub database_url: Option<String>,
    pub store_backend: StoreBackend,

    /// JWT verification for the identity boundary
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,

    /// Messaging
    pub support_account_id: Option<i64>,
    pub chat_page_size: i64,
    pub chat_max_page_size: i64,
    pub unlinked_agent_policy: String,

    /// Runtime configuration
    /// `EnvFilter` directives for the log subscriber
    pub rust_log: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_backend = match lookup("CHAT_STORE") {
            Some(raw) => raw.parse()?,
            None => StoreBackend::default(),
        };

        let database_url = lookup("DATABASE_URL");
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(anyhow::anyhow!("DATABASE_URL is required"));
        }

        let support_account_id = lookup("SUPPORT_ACCOUNT_ID")
            .map(|raw| {
                raw.trim()
                    .parse::<i64>()
                    .map_err(|_| anyhow::anyhow!("SUPPORT_ACCOUNT_ID must be an integer"))
            })
            .transpose()?;

        let config = Self {
            database_url,
            store_backend,

            jwt_secret: lookup("JWT_SECRET")
                .ok_or_else(|| anyhow::anyhow!("JWT_SECRET is required"))?,
            jwt_issuer: lookup("JWT_ISSUER"),
            jwt_audience: lookup("JWT_AUDIENCE"),

            support_account_id,
            chat_page_size: lookup("CHAT_PAGE_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(20),
            chat_max_page_size: lookup("CHAT_MAX_PAGE_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
            unlinked_agent_policy: lookup("CHAT_UNLINKED_AGENT_POLICY")
                .unwrap_or_else(|| "fallback".to_string()),

            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info,nestly=debug".to_string()),
            port: lookup("PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .unwrap_or(3000),
        };

        Ok(config)
    }
}
