//! beacond — volatile service-discovery daemon.
//!
//! Systems POST /announce to report where they are reachable; clients
//! GET /available for everyone seen recently. Nothing is persisted —
//! the whole table is gone on restart, by design.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use beacon_core::config::BeaconConfig;
use beacon_registry::{sweep_loop, Registry, RetentionPolicy};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = BeaconConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = BeaconConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        BeaconConfig::default()
    });

    let policy = RetentionPolicy {
        sweep_interval: Duration::from_secs(config.registry.sweep_interval_secs),
        entry_ttl: Duration::from_secs(config.registry.entry_ttl_secs),
        availability_window: Duration::from_secs(config.registry.availability_window_secs),
    };

    tracing::info!(
        bind_addr = %config.network.bind_addr,
        port = config.network.port,
        sweep_interval_secs = config.registry.sweep_interval_secs,
        entry_ttl_secs = config.registry.entry_ttl_secs,
        availability_window_secs = config.registry.availability_window_secs,
        "beacond starting"
    );

    // Shared state — one registry for the process lifetime.
    let registry = Arc::new(Registry::new(policy));

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // ── Spawn tasks ──────────────────────────────────────────────────────────

    let sweeper_task = tokio::spawn(sweep_loop(registry.clone(), shutdown_tx.subscribe()));

    let api_task = {
        let state = beacon_api::ApiState {
            registry: registry.clone(),
        };
        let bind_addr = config.network.bind_addr.clone();
        let port = config.network.port;
        tokio::spawn(async move {
            if let Err(e) = beacon_api::serve(state, &bind_addr, port).await {
                tracing::error!(error = %e, "API server failed");
            }
        })
    };

    // ── Wait for exit ────────────────────────────────────────────────────────

    let mut shutdown_rx = shutdown_tx.subscribe();

    tokio::select! {
        _ = shutdown_rx.recv() => tracing::info!("shutting down"),
        r = sweeper_task       => tracing::error!("sweeper task exited: {:?}", r),
        r = api_task           => tracing::error!("API task exited: {:?}", r),
    }

    Ok(())
}
