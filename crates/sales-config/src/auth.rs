use std::env;
use std::path::PathBuf;

use chrono::TimeDelta;

use crate::{ConfigError, env_or};

/// bcrypt rejects costs outside this range.
const BCRYPT_COSTS: std::ops::RangeInclusive<u32> = 4..=31;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthConfig {
    /// Folder holding one `<kid>.pem` private key per key id.
    pub keys_folder: PathBuf,
    /// Key id used to sign new tokens. When unset the lexically greatest
    /// kid found in `keys_folder` is used.
    pub active_kid: Option<String>,
    pub issuer: String,
    pub token_ttl_secs: i64,
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            keys_folder: PathBuf::from("zarf/keys"),
            active_kid: None,
            issuer: "sales api".to_string(),
            token_ttl_secs: 3600, // 1 hour
            bcrypt_cost: 12,
        }
    }
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            keys_folder: env::var("AUTH_KEYS_FOLDER")
                .map(PathBuf::from)
                .unwrap_or(defaults.keys_folder),
            active_kid: env::var("AUTH_ACTIVE_KID").ok().filter(|s| !s.is_empty()),
            issuer: env::var("AUTH_ISSUER").unwrap_or(defaults.issuer),
            token_ttl_secs: env_or("AUTH_TOKEN_TTL_SECS", defaults.token_ttl_secs),
            bcrypt_cost: env_or("AUTH_BCRYPT_COST", defaults.bcrypt_cost),
        }
    }
}

impl AuthConfig {
    /// Lifetime of issued tokens. Must be positive and representable.
    pub fn token_ttl(&self) -> Result<TimeDelta, ConfigError> {
        if self.token_ttl_secs <= 0 {
            return Err(ConfigError::invalid(
                "AUTH_TOKEN_TTL_SECS",
                format!("must be positive, got {}", self.token_ttl_secs),
            ));
        }
        TimeDelta::try_seconds(self.token_ttl_secs).ok_or_else(|| {
            ConfigError::invalid(
                "AUTH_TOKEN_TTL_SECS",
                format!("{} seconds is out of range", self.token_ttl_secs),
            )
        })
    }

    /// Rejects settings that would only fail later, on the first request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.token_ttl()?;
        if !BCRYPT_COSTS.contains(&self.bcrypt_cost) {
            return Err(ConfigError::invalid(
                "AUTH_BCRYPT_COST",
                format!("must be between 4 and 31, got {}", self.bcrypt_cost),
            ));
        }
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::invalid("AUTH_ISSUER", "must not be empty"));
        }
        Ok(())
    }
}
