use serde::{Deserialize, Serialize};

/// A single barcode read accepted from the scanner.
///
/// Immutable once created; owned by the local store until it is deleted,
/// either individually or by the bulk clear after a successful send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedRecord {
    pub id: String,
    pub value: String,
    /// RFC 3339 timestamp of the scan.
    pub scanned_at: String,
}

/// Severity of a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Subsystem a journal entry is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogCategory {
    Scan,
    Operation,
    Network,
    System,
}

/// One line of the on-device audit journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Device-local `YYYY-MM-DD HH:MM:SS` timestamp.
    pub timestamp: String,
    pub level: LogLevel,
    pub category: LogCategory,
    pub message: String,
}

/// Outcome of one delivery cycle, handed back to the caller.
///
/// Ephemeral; never persisted. Clearing the queue after a successful send is
/// the caller's responsibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendResult {
    pub success: bool,
    pub message: String,
    pub sent_count: Option<usize>,
}

/// Outcome of a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResult {
    pub success: bool,
    pub message: String,
    pub user_id: Option<String>,
}

/// Pre-send connectivity report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendStatus {
    /// Raw host link signal, no network call involved.
    pub is_online: bool,
    pub api_url: String,
    /// Whether the existence probe against the server completed.
    pub can_connect: bool,
}
