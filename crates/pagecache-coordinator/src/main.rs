//! Pagecache demo binary.
//!
//! Runs a short page-navigation scenario against an in-process data source
//! and prints the resulting Prometheus metrics.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use futures::future::join_all;
use pagecache_coordinator::pagecache_core::{CacheKey, RequirementSet, StaticSession};
use pagecache_coordinator::{
    CacheCoordinator, CoordinatorSettings, PreloadRequest, SimulatedSource, init_metrics,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let metrics = init_metrics().context("failed to install metrics recorder")?;

    let config_path = std::env::var("PAGECACHE_CONFIG").ok().map(PathBuf::from);
    let settings = CoordinatorSettings::load(config_path.as_deref())?;

    tracing::info!(
        "Starting pagecache demo v{}",
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!("TTL: {}s", settings.ttl_seconds);
    tracing::info!("Snapshot backend: {:?}", settings.snapshot.backend);

    let source = Arc::new(SimulatedSource::crm_fixture().with_latency(Duration::from_millis(120)));
    let coordinator = CacheCoordinator::builder(source.clone())
        .settings(settings)
        .session(Arc::new(StaticSession::new("acme")))
        .build()?;

    let customers = RequirementSet::new()
        .with_session()
        .with_reference("countries")
        .with_module("customers");
    let users = RequirementSet::new().with_session().with_module("users");

    let customers_key = coordinator
        .current_key("/customers")
        .context("no session configured")?;
    let users_key = coordinator
        .current_key("/users")
        .context("no session configured")?;

    // Warm the page the user is likely to visit next
    let preload = coordinator.spawn_preload(vec![PreloadRequest::new(
        users_key.clone(),
        users.clone(),
    )]);

    // Five widgets on the same page ask for the same data at once
    let results = join_all((0..5).map(|_| coordinator.load(&customers_key, &customers))).await;
    for result in results {
        result?;
    }
    tracing::info!(calls = source.calls(), "Five concurrent loads completed");

    let report = preload.await?;
    tracing::info!(loaded = report.loaded, failed = report.failed, "Preload completed");

    // Navigating back is served from memory
    coordinator.load(&users_key, &users).await?;

    // A record was edited: drop the cached page and fetch again
    coordinator.invalidate(Some(&customers_key));
    coordinator.load(&customers_key, &customers).await?;

    coordinator.refresh(&users_key, &users).await?;

    // Another tenant never sees acme's entries
    let other = CacheKey::new("globex", customers_key.identifier());
    coordinator.load(&other, &customers).await?;

    let stats = coordinator.stats();
    tracing::info!(
        entries = stats.entries,
        fetches = stats.fetches,
        coalesced = stats.coalesced,
        hit_rate = stats.hit_rate,
        source_calls = source.calls(),
        "Scenario finished"
    );

    coordinator.teardown_current_scope();

    println!("{}", metrics.render());
    Ok(())
}
