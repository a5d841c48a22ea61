//! Eviction of identities that no longer hold live state.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

/// Trait for gates whose per-identity state can be swept.
///
/// Gates create identity entries lazily and never drop them on their own,
/// so a long-running process needs something to call `sweep` periodically.
pub trait Sweep: Send + Sync {
    /// Remove identities that hold no live state. Returns how many were removed.
    fn sweep(&self) -> usize;

    /// Number of identities currently tracked.
    fn tracked_identities(&self) -> usize;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Spawn a background task sweeping every target on a fixed interval.
///
/// The task runs until aborted through the returned handle.
pub fn spawn_sweeper(targets: Vec<Arc<dyn Sweep>>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            for target in &targets {
                let removed = target.sweep();
                debug!(
                    gate = target.name(),
                    removed = removed,
                    tracked = target.tracked_identities(),
                    "Swept idle identities"
                );
            }
        }
    })
}
