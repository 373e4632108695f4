//! TTL Cleanup Task
//!
//! Expired local entries are already ignored on read; this task frees their
//! memory for request paths nobody asks for again.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::ReadThroughCache;

/// Spawns a task that purges expired local-tier entries every
/// `cleanup_interval_secs` seconds.
///
/// The returned handle is aborted on shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(ReadThroughCache::local_only("f1"));
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), 30);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(
    cache: Arc<ReadThroughCache>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    // A zero period would make `interval` panic
    let period = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            period.as_secs()
        );

        let mut ticker = tokio::time::interval(period);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let removed = cache.local().purge_expired().await;
            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}
