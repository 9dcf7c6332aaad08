//! Offline-first store and sync engine for a handheld barcode terminal.
//!
//! Scans are appended to a durable on-device store while the terminal is
//! disconnected; once the server is reachable again, the sync engine drains
//! the queue with bounded retries. An on-device audit journal records every
//! outcome and prunes itself to a 14-day window.
//!
//! The UI layer owns the flush cycle: snapshot the queue, probe
//! connectivity, send, and clear the store only after observing success.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use scanterm_client::{
//!     AssumeUp, Config, FileKv, HttpTransport, Journal, ScanStore, SyncEngine, SystemClock,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let kv = Arc::new(FileKv::open_default("scanterm")?);
//!     let clock = Arc::new(SystemClock);
//!     let journal = Arc::new(Journal::new(kv.clone(), clock.clone()));
//!
//!     let store = ScanStore::new(kv, journal.clone(), clock.clone());
//!     store.init()?;
//!     store.append("4901085613580")?;
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
//!
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod config;
pub mod protocol;
pub mod store;
pub mod sync;

pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use protocol::{
    AuthResult, LogCategory, LogEntry, LogLevel, ScannedRecord, SendResult, SendStatus, StoreError,
    TransportError,
};
pub use store::{FileKv, Journal, KeyValueStore, MemoryKv, ScanStore};
pub use sync::{AssumeUp, AuthClient, HttpTransport, LinkStatus, SyncEngine, Transport};
