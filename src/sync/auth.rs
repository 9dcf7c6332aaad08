//! Operator login.
//!
//! Online, the terminal asks the server and caches the accepted credentials
//! locally; offline, it falls back to that cache so a shift can start
//! without coverage. Token and session handling live on the server side and
//! are not this client's concern.

use std::sync::Arc;

use serde_json::json;

use crate::protocol::{AuthResult, LogCategory, LogLevel};
use crate::store::journal::Journal;
use crate::store::scans::ScanStore;
use crate::sync::engine::SyncEngine;
use crate::sync::transport::Transport;

pub struct AuthClient {
    transport: Arc<dyn Transport>,
    engine: Arc<SyncEngine>,
    store: Arc<ScanStore>,
    journal: Arc<Journal>,
}

impl AuthClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        engine: Arc<SyncEngine>,
        store: Arc<ScanStore>,
        journal: Arc<Journal>,
    ) -> Self {
        Self {
            transport,
            engine,
            store,
            journal,
        }
    }

    /// Authenticate an operator, online when the server is reachable and
    /// against the local credential cache otherwise.
    pub async fn login(&self, user_id: &str, password: &str) -> AuthResult {
        if user_id.is_empty() || password.is_empty() {
            return failure("user id and password are required");
        }

        if self.engine.is_reachable().await {
            self.journal.write(
                LogLevel::Info,
                LogCategory::System,
                "starting online authentication",
            );
            self.login_online(user_id, password).await
        } else {
            self.journal.write(
                LogLevel::Info,
                LogCategory::System,
                "starting offline authentication",
            );
            self.login_offline(user_id, password)
        }
    }

    async fn login_online(&self, user_id: &str, password: &str) -> AuthResult {
        let config = self.engine.config();
        let body = json!({ "userId": user_id, "password": password });

        match self
            .transport
            .post_json(&config.auth_url(), &body, config.auth_timeout)
            .await
        {
            Ok(status) if (200..300).contains(&status) => {
                // Cache so the same operator can log in while offline.
                self.store.cache_credentials(user_id, password);
                self.journal.write(
                    LogLevel::Info,
                    LogCategory::System,
                    &format!("online authentication succeeded: {user_id}"),
                );
                AuthResult {
                    success: true,
                    message: "logged in".to_string(),
                    user_id: Some(user_id.to_string()),
                }
            }
            Ok(401) => {
                self.journal.write(
                    LogLevel::Warn,
                    LogCategory::System,
                    &format!("online authentication rejected: {user_id}"),
                );
                failure("invalid user id or password")
            }
            Ok(status) => {
                self.journal.write(
                    LogLevel::Error,
                    LogCategory::System,
                    &format!("online authentication failed: status={status}"),
                );
                failure("a server error occurred")
            }
            Err(e) => {
                self.journal.write(
                    LogLevel::Error,
                    LogCategory::System,
                    &format!("online authentication failed: {e}"),
                );
                failure("could not reach the server")
            }
        }
    }

    fn login_offline(&self, user_id: &str, password: &str) -> AuthResult {
        match self.store.verify_cached_credentials(user_id, password) {
            Ok(true) => {
                self.journal.write(
                    LogLevel::Info,
                    LogCategory::System,
                    &format!("offline authentication succeeded: {user_id}"),
                );
                AuthResult {
                    success: true,
                    message: "logged in (offline)".to_string(),
                    user_id: Some(user_id.to_string()),
                }
            }
            Ok(false) => {
                self.journal.write(
                    LogLevel::Warn,
                    LogCategory::System,
                    &format!("offline authentication failed: {user_id}"),
                );
                failure("invalid user id or password")
            }
            Err(_) => {
                self.journal.write(
                    LogLevel::Error,
                    LogCategory::System,
                    "offline authentication failed: store not initialized",
                );
                failure("database is not initialized")
            }
        }
    }
}

fn failure(message: &str) -> AuthResult {
    AuthResult {
        success: false,
        message: message.to_string(),
        user_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::config::Config;
    use crate::protocol::TransportError;
    use crate::store::kv::MemoryKv;
    use crate::sync::transport::LinkStatus;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct FakeTransport {
        head_result: Result<(), TransportError>,
        post_results: Mutex<VecDeque<Result<u16, TransportError>>>,
        post_calls: AtomicUsize,
        last_post_url: Mutex<Option<String>>,
    }

    impl FakeTransport {
        fn new(head_result: Result<(), TransportError>, posts: Vec<Result<u16, TransportError>>) -> Self {
            Self {
                head_result,
                post_results: Mutex::new(posts.into()),
                post_calls: AtomicUsize::new(0),
                last_post_url: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn head(&self, _url: &str, _timeout: Duration) -> Result<(), TransportError> {
            self.head_result.clone()
        }

        async fn post_json(
            &self,
            url: &str,
            _body: &Value,
            _timeout: Duration,
        ) -> Result<u16, TransportError> {
            self.post_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_post_url.lock().unwrap() = Some(url.to_string());
            self.post_results
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected network call")
        }
    }

    struct UpLink;

    impl LinkStatus for UpLink {
        fn is_up(&self) -> bool {
            true
        }
    }

    fn client_with(
        transport: FakeTransport,
        init_store: bool,
    ) -> (Arc<FakeTransport>, Arc<ScanStore>, AuthClient) {
        let kv = Arc::new(MemoryKv::new());
        let clock = Arc::new(SystemClock);
        let journal = Arc::new(Journal::new(kv.clone(), clock.clone()));
        let store = Arc::new(ScanStore::new(kv, journal.clone(), clock.clone()));
        if init_store {
            store.init().unwrap();
        }

        let transport = Arc::new(transport);
        let engine = Arc::new(SyncEngine::new(
            transport.clone(),
            Arc::new(UpLink),
            journal.clone(),
            clock,
            Config::default(),
        ));

        let client = AuthClient::new(transport.clone(), engine, store.clone(), journal);
        (transport, store, client)
    }

    #[tokio::test]
    async fn test_blank_credentials_fail_without_network() {
        let (transport, _store, client) = client_with(FakeTransport::new(Ok(()), vec![]), true);

        let result = client.login("", "secret").await;
        assert!(!result.success);

        let result = client.login("operator-7", "").await;
        assert!(!result.success);
        assert_eq!(transport.post_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_online_success_caches_credentials() {
        let (_transport, store, client) =
            client_with(FakeTransport::new(Ok(()), vec![Ok(200)]), true);

        let result = client.login("operator-7", "secret").await;

        assert!(result.success);
        assert_eq!(result.user_id.as_deref(), Some("operator-7"));
        assert!(store.verify_cached_credentials("operator-7", "secret").unwrap());
    }

    #[tokio::test]
    async fn test_online_rejection_does_not_cache() {
        let (_transport, store, client) =
            client_with(FakeTransport::new(Ok(()), vec![Ok(401)]), true);

        let result = client.login("operator-7", "wrong").await;

        assert!(!result.success);
        assert_eq!(result.message, "invalid user id or password");
        assert!(!store.verify_cached_credentials("operator-7", "wrong").unwrap());
    }

    #[tokio::test]
    async fn test_online_posts_to_auth_endpoint() {
        let (transport, _store, client) =
            client_with(FakeTransport::new(Ok(()), vec![Ok(200)]), true);

        client.login("operator-7", "secret").await;

        let url = transport.last_post_url.lock().unwrap().clone().unwrap();
        assert_eq!(url, Config::default().auth_url());
        assert!(url.ends_with("/api/auth/login"));
    }

    #[tokio::test]
    async fn test_offline_login_uses_cached_credentials() {
        let (transport, store, client) =
            client_with(FakeTransport::new(Err(TransportError::Timeout), vec![]), true);
        store.cache_credentials("operator-7", "secret");

        let result = client.login("operator-7", "secret").await;
        assert!(result.success);
        assert_eq!(result.message, "logged in (offline)");

        let result = client.login("operator-7", "wrong").await;
        assert!(!result.success);
        assert_eq!(transport.post_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_offline_login_without_store_fails() {
        let (_transport, _store, client) =
            client_with(FakeTransport::new(Err(TransportError::Timeout), vec![]), false);

        let result = client.login("operator-7", "secret").await;

        assert!(!result.success);
        assert_eq!(result.message, "database is not initialized");
    }

    #[tokio::test]
    async fn test_server_error_surfaces_as_failure() {
        let (_transport, _store, client) =
            client_with(FakeTransport::new(Ok(()), vec![Ok(500)]), true);

        let result = client.login("operator-7", "secret").await;

        assert!(!result.success);
        assert_eq!(result.message, "a server error occurred");
    }
}
