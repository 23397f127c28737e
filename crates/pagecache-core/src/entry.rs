//! Cache entries and their durable snapshot form.

use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Aggregate data of one key: group name to merged payload.
pub type Aggregate = IndexMap<String, Value>;

/// Current snapshot layout version.
pub const SNAPSHOT_SCHEMA_VERSION: u64 = 1;

/// In-memory aggregate result plus load completion time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// All requested groups merged into one record.
    pub data: Aggregate,
    /// Wall-clock epoch milliseconds when the load completed.
    pub timestamp: u64,
}

impl CacheEntry {
    /// Creates an entry.
    pub fn new(data: Aggregate, timestamp: u64) -> Self {
        Self { data, timestamp }
    }

    /// Age at `now`, or `None` when the timestamp lies in the future.
    pub fn age(&self, now: u64) -> Option<Duration> {
        now.checked_sub(self.timestamp).map(Duration::from_millis)
    }

    /// Fresh iff `now - timestamp < ttl`.
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use pagecache_core::CacheEntry;
    ///
    /// let entry = CacheEntry::new(Default::default(), 1_000);
    /// let ttl = Duration::from_secs(300);
    ///
    /// assert!(entry.is_fresh(1_000 + 299_999, ttl));
    /// assert!(!entry.is_fresh(1_000 + 300_000, ttl));
    /// ```
    pub fn is_fresh(&self, now: u64, ttl: Duration) -> bool {
        self.age(now).is_some_and(|age| age < ttl)
    }

    /// Looks up a merged group.
    pub fn group(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Looks up one dataset inside a group object, e.g.
    /// `dataset("moduleData", "customers")`.
    pub fn dataset(&self, group: &str, name: &str) -> Option<&Vec<Value>> {
        self.group(group)?.get(name)?.as_array()
    }
}

/// Durable copy of a [`CacheEntry`] tagged with its layout version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRecord {
    /// Layout version; records with another version are never trusted.
    pub schema_version: u64,
    /// Same payload as the cache entry.
    pub data: Aggregate,
    /// Same timestamp as the cache entry.
    pub timestamp: u64,
}

impl SnapshotRecord {
    /// Returns the entry's timestamp.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

impl From<&CacheEntry> for SnapshotRecord {
    fn from(entry: &CacheEntry) -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            data: entry.data.clone(),
            timestamp: entry.timestamp,
        }
    }
}

impl From<SnapshotRecord> for CacheEntry {
    fn from(record: SnapshotRecord) -> Self {
        Self {
            data: record.data,
            timestamp: record.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_freshness_boundaries() {
        let entry = CacheEntry::new(Aggregate::new(), 10_000);
        let ttl = Duration::from_millis(500);

        assert!(entry.is_fresh(10_000, ttl));
        assert!(entry.is_fresh(10_499, ttl));
        assert!(!entry.is_fresh(10_500, ttl));
        assert!(!entry.is_fresh(20_000, ttl));
    }

    #[test]
    fn test_future_timestamp_is_never_fresh() {
        let entry = CacheEntry::new(Aggregate::new(), 10_000);
        assert!(entry.age(9_000).is_none());
        assert!(!entry.is_fresh(9_000, Duration::from_secs(3600)));
    }

    #[test]
    fn test_dataset_lookup() {
        let mut data = Aggregate::new();
        data.insert(
            "moduleData".to_string(),
            json!({"customers": [{"id": 1, "name": "Acme"}]}),
        );
        let entry = CacheEntry::new(data, 0);

        assert_eq!(entry.dataset("moduleData", "customers").unwrap().len(), 1);
        assert!(entry.dataset("moduleData", "users").is_none());
        assert!(entry.dataset("referenceData", "customers").is_none());
    }

    #[test]
    fn test_snapshot_conversion_keeps_payload() {
        let mut data = Aggregate::new();
        data.insert("session".to_string(), json!({"userId": "u1"}));
        let entry = CacheEntry::new(data, 42);

        let record = SnapshotRecord::from(&entry);
        assert_eq!(record.schema_version, SNAPSHOT_SCHEMA_VERSION);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["schemaVersion"], 1);
        assert_eq!(json["timestamp"], 42);

        assert_eq!(CacheEntry::from(record), entry);
    }
}
