use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::SubtitleCache;

/// Handle for stopping the background cache sweeper
pub struct SweeperHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stops the sweeper, waiting for an in-progress sweep to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Cache sweeper task failed");
        }
        tracing::info!("Cache sweeper stopped");
    }
}

/// Spawns a task that sweeps stale entries out of `cache` every `interval`
///
/// The first sweep runs immediately so entries that went stale while the
/// process was down are cleaned up at startup.
pub fn spawn_sweeper(cache: Arc<dyn SubtitleCache>, interval: Duration) -> SweeperHandle {
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

    let task = tokio::spawn(async move {
        tracing::info!(
            cache = cache.name(),
            interval_secs = interval.as_secs(),
            "Cache sweeper started"
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match cache.sweep().await {
                        Ok(0) => tracing::debug!(cache = cache.name(), "Cache sweep found nothing stale"),
                        Ok(removed) => tracing::info!(cache = cache.name(), removed, "Cache sweep removed stale entries"),
                        Err(e) => tracing::error!(cache = cache.name(), error = %e, "Cache sweep failed"),
                    }
                }
                _ = shutdown_rx.recv() => break,
            }
        }
    });

    SweeperHandle { shutdown_tx, task }
}
