#![allow(dead_code)]
use pagecache_core::{Aggregate, CacheEntry};
use serde_json::json;

/// Helper to create an Aggregate from a JSON string slice.
/// Panics if the JSON is not an object (intended for tests).
pub fn aggregate_from_json(json: &str) -> Aggregate {
    serde_json::from_str(json).expect("Failed to create test aggregate from JSON")
}

/// Returns an entry shaped like a customers page load.
pub fn customers_entry(timestamp: u64) -> CacheEntry {
    let mut data = Aggregate::new();
    data.insert("session".to_string(), json!({"userId": "u-1", "tenantId": "acme"}));
    data.insert(
        "moduleData".to_string(),
        json!({
            "customers": [
                {"id": "c-1", "name": "Acme Corp"},
                {"id": 2, "name": "Globex", "industry": "energy"}
            ]
        }),
    );
    CacheEntry::new(data, timestamp)
}
