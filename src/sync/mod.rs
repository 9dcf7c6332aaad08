//! Network side of the terminal: connectivity probing, batch delivery with
//! bounded retries, and operator login.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use scanterm_client::{
//!     AssumeUp, Config, HttpTransport, Journal, MemoryKv, ScanStore, SyncEngine, SystemClock,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let kv = Arc::new(MemoryKv::new());
//!     let clock = Arc::new(SystemClock);
//!     let journal = Arc::new(Journal::new(kv.clone(), clock.clone()));
//!     let store = ScanStore::new(kv, journal.clone(), clock.clone());
//!     store.init().unwrap();
//!
//!     store.append("4901085613580").unwrap();
//!
//!     let engine = SyncEngine::new(
//!         Arc::new(HttpTransport::new()),
//!         Arc::new(AssumeUp),
//!         journal,
//!         clock,
//!         Config::from_env(),
//!     );
//!
//!     if engine.is_reachable().await {
//!         let result = engine.send_all(&store.list_all()).await;
//!         if result.success {
//!             store.clear_all();
//!         }
//!     }
//! }
//! ```

pub mod auth;
pub mod engine;
pub mod transport;

pub use auth::AuthClient;
pub use engine::SyncEngine;
pub use transport::{AssumeUp, HttpTransport, LinkStatus, Transport};
