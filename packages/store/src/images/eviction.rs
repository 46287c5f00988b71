use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::local::LocalBlobStore;

/// Shortest period between sweeps.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Remove local images older than `retention`, measured from `now_ms`.
///
/// Best-effort: failures are logged and count as nothing removed.
pub async fn sweep(store: &LocalBlobStore, retention: Duration, now_ms: i64) -> u64 {
    let retention_ms = i64::try_from(retention.as_millis()).unwrap_or(i64::MAX);
    let cutoff = now_ms.saturating_sub(retention_ms);

    match store.evict_older_than(cutoff).await {
        Ok(removed) => {
            if removed > 0 {
                info!(removed, "Auto-cleaned old local images");
            }
            removed
        }
        Err(e) => {
            warn!(error = %e, "Local image sweep skipped");
            0
        }
    }
}

/// Handle to a running eviction task.
pub struct EvictionHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl EvictionHandle {
    /// Cancel the task and wait for an in-flight sweep to finish.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "Eviction task ended abnormally");
        }
    }
}

/// Sweep immediately, then every `interval` (at least [`MIN_SWEEP_INTERVAL`]),
/// until stopped.
pub fn spawn_eviction_task(
    store: LocalBlobStore,
    retention: Duration,
    interval: Duration,
) -> EvictionHandle {
    let interval = interval.max(MIN_SWEEP_INTERVAL);
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    info!(
        retention_secs = retention.as_secs(),
        interval_secs = interval.as_secs(),
        "Starting local image eviction"
    );

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    sweep(&store, retention, Utc::now().timestamp_millis()).await;
                }
            }
        }
    });

    EvictionHandle { cancel, task }
}
