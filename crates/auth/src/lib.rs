//! Identity boundary for the Nestly API
//!
//! Decodes the bearer credential on every request into a verified
//! `(account_id, role)` pair. Domain crates receive it through the
//! `AuthUser` extractor, generic over any state implementing
//! `FromRef<S>` for `AuthBackend`.

mod backend;
mod claims;
mod config;
mod context;
mod error;
mod extractors;
mod jwt;
mod types;

pub use backend::AuthBackend;
pub use claims::AccessClaims;
pub use config::AuthConfig;
pub use context::AuthContext;
pub use error::AuthError;
pub use extractors::AuthUser;
pub use types::AuthRole;
