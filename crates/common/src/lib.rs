//! Shared utilities, configuration, and error handling for Nestly
//!
//! - Configuration loaded from the environment (12-factor)
//! - The common `Error` type and its HTTP mapping
//! - Request extractors shared by domain routers

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod state;

pub use config::{Config, StoreBackend};
pub use db::RepositoryError;
pub use error::{Error, Result};
pub use extractors::{PageWindow, ValidatedJson};
pub use state::StateError;
