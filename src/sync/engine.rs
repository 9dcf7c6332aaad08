//! Connectivity probing and bounded-retry batch delivery.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::clock::Clock;
use crate::config::Config;
use crate::protocol::{LogCategory, LogLevel, ScannedRecord, SendResult, SendStatus};
use crate::store::journal::Journal;
use crate::sync::transport::{LinkStatus, Transport};

/// What a single delivery attempt resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Attempt {
    /// 2xx, the server accepted the batch.
    Accepted,
    /// 4xx, permanent client-side rejection. Never retried.
    Rejected(u16),
    /// 5xx or transport failure. Retried while budget remains.
    Retry(String),
}

/// Classify an HTTP status into the retry tie-break.
///
/// Anything that is neither success nor a 4xx rejection (5xx, stray 3xx)
/// is retryable.
fn classify(status: u16) -> Attempt {
    match status {
        200..=299 => Attempt::Accepted,
        400..=499 => Attempt::Rejected(status),
        _ => Attempt::Retry(format!("server error: {status}")),
    }
}

/// Drains queued records to the configured endpoint.
///
/// One flush cycle runs probe-then-send: callers check [`is_reachable`]
/// first, then hand the full queue snapshot to [`send_all`], and clear the
/// local store themselves only after observing success. A crash between the
/// server accepting and the local clear re-sends the batch on the next
/// cycle; delivery is at-least-once until confirmed cleared.
///
/// [`is_reachable`]: SyncEngine::is_reachable
/// [`send_all`]: SyncEngine::send_all
pub struct SyncEngine {
    transport: Arc<dyn Transport>,
    link: Arc<dyn LinkStatus>,
    journal: Arc<Journal>,
    clock: Arc<dyn Clock>,
    config: Config,
}

impl SyncEngine {
    pub fn new(
        transport: Arc<dyn Transport>,
        link: Arc<dyn LinkStatus>,
        journal: Arc<Journal>,
        clock: Arc<dyn Clock>,
        config: Config,
    ) -> Self {
        Self {
            transport,
            link,
            journal,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether the server is plausibly reachable right now.
    ///
    /// A link-down host answers immediately without touching the network;
    /// otherwise a header-only probe must complete within its timeout.
    /// Every failure path resolves to `false`.
    pub async fn is_reachable(&self) -> bool {
        if !self.link.is_up() {
            self.journal.write(
                LogLevel::Warn,
                LogCategory::Network,
                "device reports no network link",
            );
            return false;
        }

        match self
            .transport
            .head(&self.config.api_url, self.config.probe_timeout)
            .await
        {
            Ok(()) => {
                self.journal
                    .write(LogLevel::Info, LogCategory::Network, "connectivity check ok");
                true
            }
            Err(e) => {
                self.journal.write(
                    LogLevel::Warn,
                    LogCategory::Network,
                    &format!("server unreachable: {e}"),
                );
                false
            }
        }
    }

    /// Pre-send connectivity report for the UI.
    pub async fn send_status(&self) -> SendStatus {
        let is_online = self.link.is_up();
        let can_connect = if is_online {
            self.is_reachable().await
        } else {
            false
        };

        SendStatus {
            is_online,
            api_url: self.config.api_url.clone(),
            can_connect,
        }
    }

    /// Deliver the full batch with bounded retries.
    ///
    /// Never mutates the local store; clearing the queue after a successful
    /// send is the caller's responsibility.
    pub async fn send_all(&self, records: &[ScannedRecord]) -> SendResult {
        if records.is_empty() {
            return SendResult {
                success: false,
                message: "nothing to send".to_string(),
                sent_count: None,
            };
        }

        self.journal.write(
            LogLevel::Info,
            LogCategory::Network,
            &format!("sending {} records", records.len()),
        );

        let payload = self.batch_payload(records);
        let mut last_error = String::new();

        for attempt in 1..=self.config.max_retries {
            let outcome = match self
                .transport
                .post_json(&self.config.api_url, &payload, self.config.request_timeout)
                .await
            {
                Ok(status) => classify(status),
                Err(e) => Attempt::Retry(e.to_string()),
            };

            match outcome {
                Attempt::Accepted => {
                    self.journal.write(
                        LogLevel::Info,
                        LogCategory::Network,
                        &format!("sent {} records", records.len()),
                    );
                    return SendResult {
                        success: true,
                        message: format!("{} records sent", records.len()),
                        sent_count: Some(records.len()),
                    };
                }
                Attempt::Rejected(status) => {
                    let message = format!("server error: {status}");
                    self.journal.write(
                        LogLevel::Error,
                        LogCategory::Network,
                        &format!("{message} (attempt {attempt}/{})", self.config.max_retries),
                    );
                    return SendResult {
                        success: false,
                        message,
                        sent_count: None,
                    };
                }
                Attempt::Retry(reason) => {
                    self.journal.write(
                        LogLevel::Error,
                        LogCategory::Network,
                        &format!(
                            "send failed: {reason} (attempt {attempt}/{})",
                            self.config.max_retries
                        ),
                    );
                    last_error = reason;
                    if attempt < self.config.max_retries {
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                }
            }
        }

        let message = format!(
            "send failed: {last_error} (after {} attempts)",
            self.config.max_retries
        );
        self.journal
            .write(LogLevel::Error, LogCategory::Network, &message);

        SendResult {
            success: false,
            message,
            sent_count: None,
        }
    }

    fn batch_payload(&self, records: &[ScannedRecord]) -> Value {
        let now = self.clock.now();

        json!({
            "items": records,
            "sentAt": now.to_rfc3339(),
            "deviceInfo": {
                "userAgent": format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
                "timestamp": now.timestamp_millis(),
            },
        })
    }
}
