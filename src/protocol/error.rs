//! Error types for the terminal client.
//!
//! Storage errors never reach the UI layer as hard failures; read paths
//! degrade to empty results and write paths are skipped and journaled.
//! Transport errors are folded into [`SendResult`](super::SendResult)
//! messages by the sync engine.

use thiserror::Error;

/// Errors from the on-device store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store was accessed before `init` completed.
    #[error("store is not initialized")]
    Uninitialized,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The persisted store image could not be decoded.
    #[error("corrupt store image: {0}")]
    CorruptImage(#[from] serde_json::Error),
}

/// Transport-level failures seen by the sync engine.
///
/// A timeout is reported distinctly for messages but retried exactly like
/// any other transport error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("timeout")]
    Timeout,

    #[error("connection error: {0}")]
    Connection(String),
}
