use std::env;
use std::time::Duration;

use crate::env_or;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebConfig {
    /// Address the public API listens on.
    pub api_host: String,
    /// Address the debug surface (probes, metrics) listens on.
    pub debug_host: String,
    /// Deadline applied to every dispatched request.
    pub request_timeout: Duration,
    /// How long in-flight requests may drain after a stop signal.
    pub shutdown_timeout: Duration,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0:3000".to_string(),
            debug_host: "0.0.0.0:4000".to_string(),
            request_timeout: Duration::from_secs(5),
            shutdown_timeout: Duration::from_secs(20),
        }
    }
}

impl WebConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_host: env::var("API_HOST").unwrap_or(defaults.api_host),
            debug_host: env::var("DEBUG_HOST").unwrap_or(defaults.debug_host),
            request_timeout: Duration::from_secs(env_or(
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )),
            shutdown_timeout: Duration::from_secs(env_or(
                "SHUTDOWN_TIMEOUT_SECS",
                defaults.shutdown_timeout.as_secs(),
            )),
        }
    }
}
