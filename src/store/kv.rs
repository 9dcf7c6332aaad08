//! On-device key/value persistence substrate.
//!
//! Both the serialized database image and the per-date journal partitions
//! live here. Keys are flat strings; values are opaque byte blobs.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Vec<u8>>;
    fn set(&self, key: &str, value: &[u8]) -> io::Result<()>;
    fn remove(&self, key: &str) -> io::Result<()>;
    fn keys(&self) -> Vec<String>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory substrate for tests and ephemeral deployments.
#[derive(Default)]
pub struct MemoryKv {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &[u8]) -> io::Result<()> {
        self.entries().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        self.entries().remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries().keys().cloned().collect()
    }

    fn len(&self) -> usize {
        self.entries().len()
    }
}

/// File-per-key substrate rooted in a data directory.
///
/// Keys map directly to file names, so callers must stick to
/// filesystem-safe keys (the client only generates `[A-Za-z0-9_-]` keys).
pub struct FileKv {
    dir: PathBuf,
}

impl FileKv {
    /// Open or create a substrate rooted at the given directory.
    pub fn open<P: AsRef<Path>>(dir: P) -> io::Result<Self> {
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    /// Open a substrate in the default location (user data directory).
    pub fn open_default(app_name: &str) -> io::Result<Self> {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| {
                std::env::current_dir().unwrap_or_else(|_| Path::new(".").to_path_buf())
            })
            .join(app_name);

        Self::open(data_dir)
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl KeyValueStore for FileKv {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        fs::read(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: &[u8]) -> io::Result<()> {
        fs::write(self.path_for(key), value)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn keys(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect()
    }

    fn len(&self) -> usize {
        self.keys().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_kv_roundtrip() {
        let kv = MemoryKv::new();
        assert!(kv.is_empty());

        kv.set("a", b"one").unwrap();
        kv.set("b", b"two").unwrap();

        assert_eq!(kv.get("a").as_deref(), Some(b"one".as_ref()));
        assert_eq!(kv.len(), 2);

        let mut keys = kv.keys();
        keys.sort();
        assert_eq!(keys, vec!["a", "b"]);

        kv.remove("a").unwrap();
        assert!(kv.get("a").is_none());
        assert_eq!(kv.len(), 1);
    }

    #[test]
    fn test_memory_kv_remove_missing_is_noop() {
        let kv = MemoryKv::new();
        kv.remove("missing").unwrap();
        assert!(kv.is_empty());
    }

    #[test]
    fn test_file_kv_persists_across_reopen() {
        let dir = tempdir().unwrap();

        {
            let kv = FileKv::open(dir.path()).unwrap();
            kv.set("scanterm_db", b"{}").unwrap();
        }

        let kv = FileKv::open(dir.path()).unwrap();
        assert_eq!(kv.get("scanterm_db").as_deref(), Some(b"{}".as_ref()));
        assert_eq!(kv.keys(), vec!["scanterm_db"]);
    }

    #[test]
    fn test_file_kv_remove() {
        let dir = tempdir().unwrap();
        let kv = FileKv::open(dir.path()).unwrap();

        kv.set("k", b"v").unwrap();
        kv.remove("k").unwrap();
        kv.remove("k").unwrap();

        assert!(kv.get("k").is_none());
        assert!(kv.is_empty());
    }
}
