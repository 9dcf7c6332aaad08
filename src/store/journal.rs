//! Date-partitioned audit journal with retention pruning.
//!
//! Every component records its outcomes here. Writes must never block
//! primary functionality, so persistence failures are swallowed after a
//! `tracing` warning instead of propagating.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};

use crate::clock::Clock;
use crate::protocol::{LogCategory, LogEntry, LogLevel};
use crate::store::kv::KeyValueStore;

const LOG_PREFIX: &str = "scanterm_log_";
const RETENTION_DAYS: i64 = 14;
const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct Journal {
    kv: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl Journal {
    pub fn new(kv: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { kv, clock }
    }

    /// Append an entry to the current date's partition.
    ///
    /// Runs the retention sweep afterwards; partition count is bounded by
    /// the retention window, so the sweep stays cheap on the write path.
    pub fn write(&self, level: LogLevel, category: LogCategory, message: &str) {
        let now = self.clock.now();
        let today = now.date_naive();

        let entry = LogEntry {
            timestamp: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            level,
            category,
            message: message.to_string(),
        };

        let key = partition_key(today);
        let mut entries = self.load(&key);
        entries.push(entry);

        match serde_json::to_vec(&entries) {
            Ok(bytes) => {
                if let Err(e) = self.kv.set(&key, &bytes) {
                    tracing::warn!("failed to persist journal partition {}: {}", key, e);
                }
            }
            Err(e) => tracing::warn!("failed to encode journal partition {}: {}", key, e),
        }

        self.prune(today);
    }

    /// Ordered entries for one date's partition, empty if none exists.
    pub fn entries_for(&self, date: NaiveDate) -> Vec<LogEntry> {
        self.load(&partition_key(date))
    }

    /// All partition dates currently present, most recent first.
    pub fn dates(&self) -> Vec<String> {
        let mut dates: Vec<String> = self
            .kv
            .keys()
            .into_iter()
            .filter_map(|key| key.strip_prefix(LOG_PREFIX).map(str::to_string))
            .collect();

        dates.sort();
        dates.reverse();
        dates
    }

    /// Delete every partition dated strictly before `today - 14 days`.
    /// Keys that don't parse as dates are left alone.
    fn prune(&self, today: NaiveDate) {
        let cutoff = today - Duration::days(RETENTION_DAYS);

        for key in self.kv.keys() {
            let Some(date_str) = key.strip_prefix(LOG_PREFIX) else {
                continue;
            };
            let Ok(date) = NaiveDate::parse_from_str(date_str, DATE_FORMAT) else {
                continue;
            };

            if date < cutoff {
                if let Err(e) = self.kv.remove(&key) {
                    tracing::warn!("failed to drop journal partition {}: {}", key, e);
                }
            }
        }
    }

    fn load(&self, key: &str) -> Vec<LogEntry> {
        self.kv
            .get(key)
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .unwrap_or_default()
    }
}

fn partition_key(date: NaiveDate) -> String {
    format!("{LOG_PREFIX}{}", date.format(DATE_FORMAT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::kv::MemoryKv;
    use chrono::{DateTime, Local};
    use std::sync::Mutex;

    struct FixedClock(Mutex<DateTime<Local>>);

    impl FixedClock {
        fn new(at: DateTime<Local>) -> Self {
            Self(Mutex::new(at))
        }

        fn set(&self, at: DateTime<Local>) {
            *self.0.lock().unwrap() = at;
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Local> {
            *self.0.lock().unwrap()
        }
    }

    fn journal_at(at: DateTime<Local>) -> (Arc<FixedClock>, Journal) {
        let clock = Arc::new(FixedClock::new(at));
        let journal = Journal::new(Arc::new(MemoryKv::new()), clock.clone());
        (clock, journal)
    }

    #[test]
    fn test_entries_appear_in_append_order() {
        let now = Local::now();
        let (_clock, journal) = journal_at(now);

        journal.write(LogLevel::Info, LogCategory::Scan, "first");
        journal.write(LogLevel::Warn, LogCategory::Network, "second");
        journal.write(LogLevel::Error, LogCategory::System, "third");

        let entries = journal.entries_for(now.date_naive());
        let messages: Vec<&str> = entries.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
        assert_eq!(entries[1].level, LogLevel::Warn);
        assert_eq!(entries[1].category, LogCategory::Network);
    }

    #[test]
    fn test_missing_partition_reads_empty() {
        let (_clock, journal) = journal_at(Local::now());
        assert!(journal
            .entries_for(Local::now().date_naive() - Duration::days(1))
            .is_empty());
    }

    #[test]
    fn test_dates_sorted_descending() {
        let now = Local::now();
        let (clock, journal) = journal_at(now - Duration::days(2));

        journal.write(LogLevel::Info, LogCategory::System, "older");
        clock.set(now);
        journal.write(LogLevel::Info, LogCategory::System, "newer");

        let dates = journal.dates();
        assert_eq!(dates.len(), 2);
        assert_eq!(dates[0], now.date_naive().format(DATE_FORMAT).to_string());
        assert_eq!(
            dates[1],
            (now - Duration::days(2))
                .date_naive()
                .format(DATE_FORMAT)
                .to_string()
        );
    }

    #[test]
    fn test_retention_drops_expired_partitions() {
        let now = Local::now();
        let (clock, journal) = journal_at(now - Duration::days(20));

        journal.write(LogLevel::Info, LogCategory::System, "ancient");
        clock.set(now - Duration::days(13));
        journal.write(LogLevel::Info, LogCategory::System, "recent");

        clock.set(now);
        journal.write(LogLevel::Info, LogCategory::System, "today");

        let dates = journal.dates();
        let ancient = (now - Duration::days(20))
            .date_naive()
            .format(DATE_FORMAT)
            .to_string();
        let recent = (now - Duration::days(13))
            .date_naive()
            .format(DATE_FORMAT)
            .to_string();

        assert!(!dates.contains(&ancient));
        assert!(dates.contains(&recent));
        assert!(journal
            .entries_for((now - Duration::days(20)).date_naive())
            .is_empty());
    }

    #[test]
    fn test_corrupt_partition_reads_empty() {
        let now = Local::now();
        let kv = Arc::new(MemoryKv::new());
        let journal = Journal::new(kv.clone(), Arc::new(FixedClock::new(now)));

        kv.set(&partition_key(now.date_naive()), b"not json").unwrap();
        assert!(journal.entries_for(now.date_naive()).is_empty());
    }
}
