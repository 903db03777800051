//! # Sales Config
//!
//! Configuration types for the sales API, loaded from environment variables:
//!
//! - [`web`]: listener addresses and request/shutdown timeouts
//! - [`auth`]: signing key location, issuer and token lifetime
//! - [`database`]: optional Postgres connection settings
//!
//! # Example
//!
//! ```ignore
//! use sales_config::{AuthConfig, DatabaseConfig, WebConfig};
//!
//! let web = WebConfig::from_env();
//! let auth = AuthConfig::from_env();
//! let db = DatabaseConfig::from_env();
//! ```

pub mod auth;
pub mod database;
pub mod web;

// Re-export commonly used types at crate root
pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use web::WebConfig;

/// A setting that was read but cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Reads `key` and parses it, falling back to `default` when the variable is
/// unset or does not parse.
pub(crate) fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
