//! Network transport seam.
//!
//! The sync engine talks to the server through [`Transport`] so the retry
//! and classification logic can be exercised against a fake in tests.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::protocol::TransportError;

/// Coarse host signal that a network interface exists at all.
///
/// Checked before any probe so a link-down device never issues a doomed
/// network call.
pub trait LinkStatus: Send + Sync {
    fn is_up(&self) -> bool;
}

/// Link signal for hosts without an interface monitor: always up, leaving
/// reachability entirely to the existence probe.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeUp;

impl LinkStatus for AssumeUp {
    fn is_up(&self) -> bool {
        true
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Header-only existence probe. Completing at all counts; the status
    /// code is irrelevant.
    async fn head(&self, url: &str, timeout: Duration) -> Result<(), TransportError>;

    /// JSON POST bound to a per-request timeout. Returns the HTTP status.
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<u16, TransportError>;
}

/// Production transport backed by reqwest.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .unwrap();

        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn head(&self, url: &str, timeout: Duration) -> Result<(), TransportError> {
        self.client
            .head(url)
            .timeout(timeout)
            .send()
            .await
            .map(|_| ())
            .map_err(map_reqwest_error)
    }

    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<u16, TransportError> {
        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        Ok(response.status().as_u16())
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Connection(e.to_string())
    }
}
