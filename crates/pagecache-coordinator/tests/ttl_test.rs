//! Freshness, snapshot promotion and the end-to-end page scenario.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::*;
use pagecache_coordinator::SimulatedSource;

#[tokio::test]
async fn entry_is_fresh_until_ttl_elapses() {
    let h = harness(Duration::ZERO);
    let key = key("acme", "/users");

    h.coordinator.load(&key, &users_page()).await.unwrap();
    let calls = h.source.calls();

    // t0 + T - 1ms: still fresh
    h.advance(TTL - Duration::from_millis(1));
    h.coordinator.load(&key, &users_page()).await.unwrap();
    assert_eq!(h.source.calls(), calls);

    // t0 + T: expired in memory and in the snapshot store
    h.advance(Duration::from_millis(1));
    let entry = h.coordinator.load(&key, &users_page()).await.unwrap();

    assert_eq!(h.source.calls(), calls * 2);
    assert_eq!(entry.timestamp, T0 + TTL.as_millis() as u64);
    assert_eq!(h.coordinator.stats().rejections, 1);
}

#[tokio::test]
async fn entry_from_the_future_is_reloaded() {
    let h = harness(Duration::ZERO);
    let key = key("acme", "/users");

    h.coordinator.load(&key, &users_page()).await.unwrap();

    // Clock moved backwards: the stored timestamp is now in the future
    h.clock.set(T0 - 1_000);
    h.coordinator.load(&key, &users_page()).await.unwrap();

    assert_eq!(h.coordinator.stats().fetches, 2);
}

#[tokio::test]
async fn snapshot_is_promoted_without_fetch() {
    let h = harness(Duration::ZERO);
    let key = key("acme", "/customers");
    let first = h.coordinator.load(&key, &customers_page()).await.unwrap();

    // New coordinator, same storage: memory is gone, snapshot remains
    h.advance(Duration::from_secs(60));
    let source = Arc::new(SimulatedSource::crm_fixture());
    let reopened = h.reopen(source.clone());

    let entry = reopened.load(&key, &customers_page()).await.unwrap();

    assert_eq!(source.calls(), 0);
    assert_eq!(entry.data, first.data);
    assert_eq!(entry.timestamp, first.timestamp);
    assert_eq!(reopened.stats().snapshot_hits, 1);

    // Promoted: the next load is a memory hit
    reopened.load(&key, &customers_page()).await.unwrap();
    assert_eq!(reopened.stats().memory_hits, 1);
}

#[tokio::test]
async fn stale_snapshot_is_not_promoted() {
    let h = harness(Duration::ZERO);
    let key = key("acme", "/customers");
    h.coordinator.load(&key, &customers_page()).await.unwrap();

    h.advance(TTL);
    let source = Arc::new(SimulatedSource::crm_fixture());
    let reopened = h.reopen(source.clone());
    reopened.load(&key, &customers_page()).await.unwrap();

    assert_eq!(source.calls(), 3);
    assert_eq!(reopened.stats().rejections, 1);
}

#[tokio::test]
async fn page_scenario_end_to_end() {
    let h = harness(Duration::from_millis(10));
    let key = key("acme", "/customers");
    let requirements = customers_page();

    // Consumer mounts: one batch load
    let first = h.coordinator.load(&key, &requirements).await.unwrap();
    assert_eq!(h.coordinator.stats().fetches, 1);

    // Another consumer mounts one second later: no fetch
    h.advance(Duration::from_secs(1));
    let second = h.coordinator.load(&key, &requirements).await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(h.coordinator.stats().fetches, 1);

    // A record is edited: invalidate, then exactly one more batch
    h.coordinator.invalidate(Some(&key));
    let third = h.coordinator.load(&key, &requirements).await.unwrap();

    assert_eq!(h.coordinator.stats().fetches, 2);
    assert_eq!(h.source.calls(), 6);
    assert_eq!(third.timestamp, T0 + 1_000);
}

#[tokio::test]
async fn refresh_always_fetches() {
    let h = harness(Duration::ZERO);
    let key = key("acme", "/users");

    h.coordinator.load(&key, &users_page()).await.unwrap();
    h.coordinator.refresh(&key, &users_page()).await.unwrap();
    h.coordinator.refresh(&key, &users_page()).await.unwrap();

    assert_eq!(h.coordinator.stats().fetches, 3);
}
