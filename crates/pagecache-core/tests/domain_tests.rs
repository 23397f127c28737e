use std::time::Duration;

use pagecache_core::{
    CacheError, CacheKey, Clock, FetchError, ManualClock, Result, Scope, SessionAccessor,
    StaticSession,
};

mod common;

#[test]
fn test_ttl_workflow_with_manual_clock() {
    let clock = ManualClock::new(1_000_000);
    let ttl = Duration::from_secs(300);
    let entry = common::customers_entry(clock.now_millis());

    clock.advance(Duration::from_secs(1));
    assert!(entry.is_fresh(clock.now_millis(), ttl));

    clock.advance(Duration::from_secs(298));
    assert!(entry.is_fresh(clock.now_millis(), ttl));

    clock.advance(Duration::from_secs(2));
    assert!(!entry.is_fresh(clock.now_millis(), ttl));
}

#[test]
fn test_scope_isolation_of_keys() {
    let a = StaticSession::new("tenant-a").key_for("/dashboard");
    let b = StaticSession::new("tenant-b").key_for("/dashboard");
    let none = StaticSession::default().key_for("/dashboard");

    assert_ne!(a, b);
    assert_ne!(a, none);
    assert!(none.scope().is_global());
    assert_eq!(a, CacheKey::new(Scope::new("tenant-a"), "/dashboard"));
}

#[test]
fn test_error_context_preservation() {
    fn load_customers() -> Result<()> {
        Err(CacheError::fetch(
            "moduleData.customers",
            FetchError::remote_status(500, "database unavailable"),
        ))
    }

    let err = load_customers().unwrap_err();
    assert!(err.is_transient());

    match err {
        CacheError::Fetch { group, source } => {
            assert_eq!(group, "moduleData.customers");
            assert!(source.to_string().contains("database unavailable"));
        },
        other => panic!("Expected Fetch error, got {other:?}"),
    }
}
