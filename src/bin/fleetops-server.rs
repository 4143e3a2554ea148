//! FleetOps API server.
//!
//! Wires the storage backend, adapter registry, worker pool, and
//! reconciler together and serves the HTTP API. `DATABASE_URL` selects
//! the PostgreSQL backend; without it the server runs fully in memory.

use anyhow::Context;
use fleetops_core::config::FleetConfig;
use fleetops_core::discovery::DiscoveryReconciler;
use fleetops_core::events::EventPublisher;
use fleetops_core::logging::init_structured_logging;
use fleetops_core::orchestration::TaskOrchestrator;
use fleetops_core::registry::AdapterRegistry;
use fleetops_core::storage::{MemoryBackend, Stores};
use fleetops_core::web::{self, AppState};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_structured_logging();

    let config = FleetConfig::from_env().context("failed to load configuration")?;

    let stores = build_stores(&config).await?;
    let registry = Arc::new(AdapterRegistry::with_builtin_adapters());
    let events = EventPublisher::new(config.event_channel_capacity);

    let orchestrator = Arc::new(TaskOrchestrator::start(
        &config,
        stores.clone(),
        registry.clone(),
        events.clone(),
    ));
    let reconciler = Arc::new(DiscoveryReconciler::new(
        stores.clone(),
        registry.clone(),
        events,
    ));

    let state = AppState::new(orchestrator, reconciler, stores, registry);
    let app = web::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;
    info!(address = %config.bind_address, "🌐 FleetOps API listening");

    axum::serve(listener, app)
        .await
        .context("server terminated")?;
    Ok(())
}

#[cfg(feature = "postgres")]
async fn build_stores(config: &FleetConfig) -> anyhow::Result<Stores> {
    use fleetops_core::storage::PgStore;

    if let Some(database_url) = &config.database_url {
        let store = PgStore::connect(database_url)
            .await
            .context("failed to connect to PostgreSQL")?;
        store.migrate().await.context("schema migration failed")?;
        info!("📚 Storage backend: PostgreSQL");
        return Ok(Stores::from_postgres(Arc::new(store)));
    }
    info!("📚 Storage backend: in-memory");
    Ok(Stores::from_memory(Arc::new(MemoryBackend::new())))
}

#[cfg(not(feature = "postgres"))]
async fn build_stores(_config: &FleetConfig) -> anyhow::Result<Stores> {
    info!("📚 Storage backend: in-memory");
    Ok(Stores::from_memory(Arc::new(MemoryBackend::new())))
}
