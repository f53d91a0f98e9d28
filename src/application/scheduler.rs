// Background refresh: periodic sweep over all registered cache keys
use crate::application::cache::CacheRegistry;
use crate::domain::model::ErrorCode;
use crate::domain::traits::QueryOperation;
use crate::infrastructure::config::SchedulerSettings;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Handle to a running refresh scheduler.
///
/// Dropping the handle closes the shutdown channel, which stops the
/// scheduler on its next wakeup; [`SchedulerHandle::shutdown`] also waits
/// for the task to finish.
pub struct SchedulerHandle {
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop the scheduler and wait for the task to wind down.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        let _ = self.task.await;
    }
}

/// Spawn the background refresh task.
///
/// A short initial delay lets connection pools finish initializing before
/// the first sweep. Each sweep refreshes all stale keys concurrently; a
/// slow or failing key delays only itself.
pub fn spawn(
    registry: Arc<CacheRegistry>,
    operations: Vec<(String, Arc<dyn QueryOperation>)>,
    settings: &SchedulerSettings,
) -> SchedulerHandle {
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
    let sweep_period = Duration::from_secs(settings.sweep_seconds.max(1));
    let initial_delay = Duration::from_secs(settings.initial_delay_seconds);

    let task = tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(initial_delay) => {}
            _ = &mut shutdown_rx => {
                debug!("Refresh scheduler stopped before first sweep");
                return;
            }
        }

        let mut ticker = tokio::time::interval(sweep_period);
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    debug!("Refresh scheduler stopped");
                    return;
                }
                _ = ticker.tick() => {
                    sweep(&registry, &operations).await;
                }
            }
        }
    });

    debug!(
        "Refresh scheduler started: sweep every {}s after {}s delay",
        settings.sweep_seconds, settings.initial_delay_seconds
    );
    SchedulerHandle { shutdown_tx, task }
}

/// One pass over every registered key, refreshing the stale ones.
///
/// Failures are isolated per key: a failed refresh is logged and the rest
/// of the sweep proceeds.
async fn sweep(registry: &CacheRegistry, operations: &[(String, Arc<dyn QueryOperation>)]) {
    let mut refreshes = Vec::new();
    for (key, op) in operations {
        let Some(entry) = registry.entry(key) else {
            continue;
        };
        if entry.is_fresh().await {
            continue;
        }
        let op = op.clone();
        refreshes.push(async move {
            let result = entry.refresh(op.as_ref()).await;
            if result.error_code != ErrorCode::Success {
                warn!(
                    "{} - background refresh failed: {}",
                    entry.key(),
                    result.error_desc.as_deref().unwrap_or("unknown error")
                );
            }
        });
    }

    if refreshes.is_empty() {
        return;
    }
    debug!("Cache sweep: refreshing {} stale keys", refreshes.len());
    join_all(refreshes).await;
}
