//! Runtime configuration: API credentials and polling policy.

use crate::FlightError;
use std::time::Duration;

pub const ENV_API_HOST: &str = "SKY_FLIGHTS_API_HOST";
pub const ENV_API_KEY: &str = "SKY_FLIGHTS_API_KEY";
pub const ENV_BASE_URL: &str = "SKY_FLIGHTS_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "SKY_FLIGHTS_TIMEOUT_SECS";
/// Optional JSON region table replacing the bundled one
pub const ENV_REGIONS_FILE: &str = "SKY_FLIGHTS_REGIONS_FILE";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Number of search-incomplete polls before giving up.
pub const DEFAULT_POLL_ATTEMPTS: u32 = 5;
/// Fixed sleep before every poll.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Connection settings for the flight search API.
///
/// There are no baked-in credentials: host and key must come from the
/// environment or be passed explicitly.
#[derive(Clone)]
pub struct ApiConfig {
    pub host: String,
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("host", &self.host)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ApiConfig {
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Self {
        let host = host.into();
        Self {
            base_url: default_base_url(&host),
            host,
            api_key: api_key.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Read the configuration from process environment variables
    pub fn from_env() -> Result<Self, FlightError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup (environment, secret store, test map)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FlightError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| FlightError::ConfigError(format!("{} is not set", key)))
        };

        let mut config = Self::new(required(ENV_API_HOST)?, required(ENV_API_KEY)?);

        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            config = config.with_base_url(base_url.trim());
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                FlightError::ConfigError(format!("{} must be a whole number of seconds, got {}", ENV_TIMEOUT_SECS, raw))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn default_base_url(host: &str) -> String {
    format!("https://{}/web/flights", host)
}

/// Bounded retry state for the asynchronous search endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl PollPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL)
    }
}
