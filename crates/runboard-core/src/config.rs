//! Configuration module
//!
//! Client settings are read from the environment (optionally seeded from a `.env`
//! file). Command-line flags may override individual values afterwards.

use std::env;
use std::time::Duration;

/// Backend origin used when `RUNBOARD_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Interval between execution refreshes while an execution is PENDING or RUNNING.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Settings for talking to the workflow backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base origin of the backend, without a trailing slash.
    pub api_url: String,
    pub poll_interval_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl ClientConfig {
    /// Load configuration from the process environment.
    ///
    /// Reads `RUNBOARD_API_URL` and `RUNBOARD_POLL_INTERVAL_MS`.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Only parse errors are reported here. Call [`ClientConfig::validate`] once any
    /// overrides have been applied.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("RUNBOARD_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let poll_interval_ms = match lookup("RUNBOARD_POLL_INTERVAL_MS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                anyhow::anyhow!("RUNBOARD_POLL_INTERVAL_MS must be a valid number, got '{}'", raw)
            })?,
            None => DEFAULT_POLL_INTERVAL_MS,
        };

        Ok(Self {
            api_url: normalize_api_url(&api_url),
            poll_interval_ms,
        })
    }

    /// Replace the API origin (e.g. from a `--api-url` flag).
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = normalize_api_url(api_url);
        self
    }

    pub fn with_poll_interval_ms(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "RUNBOARD_API_URL must start with http:// or https://, got '{}'",
                self.api_url
            ));
        }

        if self.poll_interval_ms == 0 {
            return Err(anyhow::anyhow!(
                "RUNBOARD_POLL_INTERVAL_MS must be greater than zero"
            ));
        }

        Ok(())
    }
}

fn normalize_api_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
