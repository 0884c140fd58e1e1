//! Background expiry sweep.
//!
//! Wakes on a fixed interval and deletes registry entries that have not
//! been refreshed within the hard TTL, bounding growth from announcers
//! that crashed or stopped without calling remove. A separate, shorter
//! availability window governs what readers see in the meantime.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::registry::Registry;

/// Sweep the registry on the policy's interval until shutdown.
///
/// One pass per wake: take "now" once, delete everything staler than
/// the TTL. Cancel by sending on the shutdown channel (or dropping the
/// task handle).
pub async fn sweep_loop(registry: Arc<Registry>, mut shutdown: broadcast::Receiver<()>) {
    let interval = registry.policy().sweep_interval;
    let mut ticker = tokio::time::interval(interval);

    tracing::info!(
        interval_secs = interval.as_secs(),
        ttl_secs = registry.policy().entry_ttl.as_secs(),
        "expiry sweeper starting"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = registry.sweep();
                if removed > 0 {
                    tracing::debug!(removed, "expired registry entries");
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("expiry sweeper stopping");
                return;
            }
        }
    }
}
