//! Expiry Sweep Task
//!
//! Background task that periodically removes expired keys from the in-memory
//! remote tier. Redis expires keys on its own and needs no sweep.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::remote::MemoryStore;

/// Spawns a background task that periodically sweeps expired keys.
///
/// Reads already hide expired keys; the sweep only bounds memory held by keys
/// nobody reads again.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let store = Arc::new(MemoryStore::new());
/// let cleanup_handle = spawn_cleanup_task(store.clone(), 1);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(store: Arc<MemoryStore>, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.cleanup_expired();

            if removed > 0 {
                info!("Expiry sweep: removed {} expired keys", removed);
            } else {
                debug!("Expiry sweep: no expired keys found");
            }
        }
    })
}
