//! Durable store for scanned records and the offline credential cache.
//!
//! Backed by an in-memory SQLite database whose whole state is written
//! through to the key/value substrate after every mutation. Data volumes
//! are bounded by manual scanning throughput, so the full-image save costs
//! less than incremental durability would.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::protocol::{LogCategory, LogLevel, ScannedRecord, StoreError};
use crate::store::journal::Journal;
use crate::store::kv::KeyValueStore;

const DB_IMAGE_KEY: &str = "scanterm_db";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS scanned_data (
        id TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        scanned_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        password TEXT NOT NULL
    );
";

/// Serialized snapshot of the whole database.
///
/// Row order in `scans` preserves insertion order so a restored store keeps
/// the same retrieval order as the original.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreImage {
    scans: Vec<ScannedRecord>,
    users: Vec<CachedCredential>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedCredential {
    id: String,
    password: String,
}

pub struct ScanStore {
    conn: Mutex<Option<Connection>>,
    kv: Arc<dyn KeyValueStore>,
    journal: Arc<Journal>,
    clock: Arc<dyn Clock>,
}

impl ScanStore {
    /// Create an uninitialized store. Call [`ScanStore::init`] before use.
    pub fn new(kv: Arc<dyn KeyValueStore>, journal: Arc<Journal>, clock: Arc<dyn Clock>) -> Self {
        Self {
            conn: Mutex::new(None),
            kv,
            journal,
            clock,
        }
    }

    /// Restore the persisted image, or start from an empty schema.
    ///
    /// Idempotent and race-safe: concurrent first callers serialize on the
    /// handle lock, so the second caller blocks until the first finishes and
    /// then observes its result instead of creating a second database.
    /// An unreadable image degrades to an empty store; it never aborts
    /// startup.
    pub fn init(&self) -> Result<(), StoreError> {
        let mut guard = self.handle();
        if guard.is_some() {
            return Ok(());
        }

        let conn = match self.kv.get(DB_IMAGE_KEY) {
            Some(bytes) => match restore(&bytes) {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::warn!("discarding unreadable store image: {}", e);
                    self.journal.write(
                        LogLevel::Warn,
                        LogCategory::System,
                        "stored database image could not be restored, starting empty",
                    );
                    fresh()?
                }
            },
            None => fresh()?,
        };

        *guard = Some(conn);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.handle().is_some()
    }

    /// Accept a scanned value into the queue.
    ///
    /// Fails with [`StoreError::Uninitialized`] before `init`; the failure
    /// is also journaled so the audit trail shows the dropped scan.
    pub fn append(&self, value: &str) -> Result<ScannedRecord, StoreError> {
        let guard = self.handle();
        let Some(conn) = guard.as_ref() else {
            self.journal.write(
                LogLevel::Error,
                LogCategory::System,
                "database is not initialized",
            );
            return Err(StoreError::Uninitialized);
        };

        let record = ScannedRecord {
            id: Uuid::new_v4().to_string(),
            value: value.to_string(),
            scanned_at: self.clock.now().to_rfc3339(),
        };

        conn.execute(
            "INSERT INTO scanned_data (id, value, scanned_at) VALUES (?1, ?2, ?3)",
            params![record.id, record.value, record.scanned_at],
        )?;

        self.flush(conn);
        self.journal.write(
            LogLevel::Info,
            LogCategory::Scan,
            &format!("barcode read: {}", record.value),
        );

        Ok(record)
    }

    /// All queued records, ascending by scan time with insertion order as
    /// the tie-break. Empty (never an error) if uninitialized.
    pub fn list_all(&self) -> Vec<ScannedRecord> {
        let guard = self.handle();
        let Some(conn) = guard.as_ref() else {
            return Vec::new();
        };

        match query_all(conn) {
            Ok(records) => records,
            Err(e) => {
                tracing::error!("failed to list scanned records: {}", e);
                Vec::new()
            }
        }
    }

    /// Number of queued records; 0 if uninitialized.
    pub fn count(&self) -> usize {
        let guard = self.handle();
        let Some(conn) = guard.as_ref() else {
            return 0;
        };

        conn.query_row("SELECT COUNT(*) FROM scanned_data", [], |row| {
            row.get::<_, i64>(0)
        })
        .map(|n| n as usize)
        .unwrap_or_else(|e| {
            tracing::error!("failed to count scanned records: {}", e);
            0
        })
    }

    /// Delete one record by id; no-op if absent.
    ///
    /// The journal entry names the removed record's value, falling back to
    /// the raw id when the row was already gone.
    pub fn remove_by_id(&self, id: &str) {
        let guard = self.handle();
        let Some(conn) = guard.as_ref() else {
            self.journal.write(
                LogLevel::Error,
                LogCategory::System,
                "database is not initialized",
            );
            return;
        };

        let value = conn
            .query_row(
                "SELECT value FROM scanned_data WHERE id = ?1",
                params![id],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .unwrap_or_else(|e| {
                tracing::error!("failed to look up record for removal: {}", e);
                None
            });
        let label = value.unwrap_or_else(|| id.to_string());

        if let Err(e) = conn.execute("DELETE FROM scanned_data WHERE id = ?1", params![id]) {
            tracing::error!("failed to delete scanned record: {}", e);
            return;
        }

        self.flush(conn);
        self.journal.write(
            LogLevel::Info,
            LogCategory::Operation,
            &format!("record removed: {label}"),
        );
    }

    /// Delete every queued record. One journal entry, not one per row.
    pub fn clear_all(&self) {
        let guard = self.handle();
        let Some(conn) = guard.as_ref() else {
            self.journal.write(
                LogLevel::Error,
                LogCategory::System,
                "database is not initialized",
            );
            return;
        };

        if let Err(e) = conn.execute("DELETE FROM scanned_data", []) {
            tracing::error!("failed to clear scanned records: {}", e);
            return;
        }

        self.flush(conn);
        self.journal.write(
            LogLevel::Info,
            LogCategory::Operation,
            "queued records cleared",
        );
    }

    /// Upsert the offline credential cache after a successful remote login.
    pub fn cache_credentials(&self, user_id: &str, password: &str) {
        let guard = self.handle();
        let Some(conn) = guard.as_ref() else {
            return;
        };

        if let Err(e) = conn.execute(
            "INSERT OR REPLACE INTO users (id, password) VALUES (?1, ?2)",
            params![user_id, password],
        ) {
            tracing::error!("failed to cache credentials: {}", e);
            return;
        }

        self.flush(conn);
    }

    /// Check a user id and password against the offline cache.
    pub fn verify_cached_credentials(
        &self,
        user_id: &str,
        password: &str,
    ) -> Result<bool, StoreError> {
        let guard = self.handle();
        let Some(conn) = guard.as_ref() else {
            return Err(StoreError::Uninitialized);
        };

        let hit = conn
            .query_row(
                "SELECT id FROM users WHERE id = ?1 AND password = ?2",
                params![user_id, password],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(hit.is_some())
    }

    fn handle(&self) -> MutexGuard<'_, Option<Connection>> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write-through durability: serialize both tables and persist the
    /// image. Failures are logged and swallowed; storage errors never reach
    /// the UI layer.
    fn flush(&self, conn: &Connection) {
        let image = match snapshot(conn) {
            Ok(image) => image,
            Err(e) => {
                tracing::error!("failed to snapshot store: {}", e);
                return;
            }
        };

        match serde_json::to_vec(&image) {
            Ok(bytes) => {
                if let Err(e) = self.kv.set(DB_IMAGE_KEY, &bytes) {
                    tracing::error!("failed to persist store image: {}", e);
                }
            }
            Err(e) => tracing::error!("failed to encode store image: {}", e),
        }
    }
}

fn fresh() -> Result<Connection, StoreError> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

fn restore(bytes: &[u8]) -> Result<Connection, StoreError> {
    let image: StoreImage = serde_json::from_slice(bytes)?;
    let conn = fresh()?;

    for record in &image.scans {
        conn.execute(
            "INSERT INTO scanned_data (id, value, scanned_at) VALUES (?1, ?2, ?3)",
            params![record.id, record.value, record.scanned_at],
        )?;
    }
    for user in &image.users {
        conn.execute(
            "INSERT INTO users (id, password) VALUES (?1, ?2)",
            params![user.id, user.password],
        )?;
    }

    Ok(conn)
}

fn snapshot(conn: &Connection) -> rusqlite::Result<StoreImage> {
    let mut stmt =
        conn.prepare("SELECT id, value, scanned_at FROM scanned_data ORDER BY rowid ASC")?;
    let scans = stmt
        .query_map([], |row| {
            Ok(ScannedRecord {
                id: row.get(0)?,
                value: row.get(1)?,
                scanned_at: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut stmt = conn.prepare("SELECT id, password FROM users ORDER BY id ASC")?;
    let users = stmt
        .query_map([], |row| {
            Ok(CachedCredential {
                id: row.get(0)?,
                password: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(StoreImage { scans, users })
}

fn query_all(conn: &Connection) -> rusqlite::Result<Vec<ScannedRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, value, scanned_at FROM scanned_data ORDER BY scanned_at ASC, rowid ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(ScannedRecord {
            id: row.get(0)?,
            value: row.get(1)?,
            scanned_at: row.get(2)?,
        })
    })?;

    rows.collect()
}
