//! On-device persistence.
//!
//! The key/value substrate holds two kinds of state: the serialized scan
//! database image and the per-date journal partitions.

pub mod journal;
pub mod kv;
pub mod scans;

pub use journal::Journal;
pub use kv::{FileKv, KeyValueStore, MemoryKv};
pub use scans::ScanStore;
