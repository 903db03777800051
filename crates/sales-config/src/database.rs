//! Database connection settings.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`: Postgres connection string. Optional; without it the
//!   service keeps users in memory.
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)

use std::env;

use crate::env_or;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
        }
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Self {
        Self {
            url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10),
        }
    }
}
