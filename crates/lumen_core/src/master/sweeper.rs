use std::{sync::Arc, time::Duration};

use lumen_cache::ContentCache;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Clear `cache` every `interval_secs` until `shutdown` fires.
/// Returns `None` when clearing is disabled (`0`).
pub(super) fn spawn_cache_sweeper(
    cache: Arc<ContentCache>,
    interval_secs: u64,
    shutdown: CancellationToken,
) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        info!(target: "lumen::cache", "Periodic cache clearing disabled");
        return None;
    }

    let every = Duration::from_secs(interval_secs);
    info!(
        target: "lumen::cache",
        interval_secs,
        "Cache sweeper started"
    );

    Some(tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let evicted = cache.clear();
                    info!(target: "lumen::cache", evicted, "Content cache cleared");
                }
            }
        }

        debug!(target: "lumen::cache", "Cache sweeper stopped");
    }))
}
