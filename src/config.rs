//! Endpoint and timing configuration.

use std::env;
use std::time::Duration;

/// Environment variable that overrides the scanned-data endpoint at startup.
pub const API_URL_ENV: &str = "SCANTERM_API_URL";

const DEFAULT_API_URL: &str = "http://localhost:6745/api/scanned-data";

/// Client configuration.
///
/// The endpoint URL is configuration, not part of the sync algorithm; the
/// timing knobs exist so tests can shrink the retry cycle.
#[derive(Debug, Clone)]
pub struct Config {
    /// Scanned-data endpoint the batches are POSTed to.
    pub api_url: String,
    /// Per-attempt timeout for batch delivery.
    pub request_timeout: Duration,
    /// Timeout for the header-only existence probe.
    pub probe_timeout: Duration,
    /// Timeout for the login request.
    pub auth_timeout: Duration,
    /// Maximum delivery attempts per batch.
    pub max_retries: u32,
    /// Constant pause between retryable attempts.
    pub retry_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(5),
            auth_timeout: Duration::from_secs(10),
            max_retries: 3,
            retry_delay: Duration::from_secs(2),
        }
    }
}

impl Config {
    /// Default configuration with the endpoint taken from `SCANTERM_API_URL`
    /// when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.api_url = url;
            }
        }
        config
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Login endpoint, derived from the scanned-data URL by replacing
    /// everything after the `/api` segment with `/auth/login`.
    pub fn auth_url(&self) -> String {
        match self.api_url.find("/api/") {
            Some(pos) => format!("{}/auth/login", &self.api_url[..pos + 4]),
            None => format!("{}/auth/login", self.api_url.trim_end_matches('/')),
        }
    }
}
