use std::time::Duration;

use taskdeck_logging::{ts_debug, ts_warn};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::{OpStatus, TaskStore};

const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Refreshes the task list every `interval` until `token` is cancelled or
/// the store shuts down. The first refresh happens one interval in.
///
/// Intervals shorter than one second are raised to one second.
pub fn spawn_poller(store: TaskStore, interval: Duration, token: CancellationToken) -> JoinHandle<()> {
    let interval = interval.max(MIN_POLL_INTERVAL);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }
            if store.is_shut_down() {
                break;
            }
            match store.fetch_tasks().await {
                OpStatus::Rejected(err) => ts_warn!("poll refresh failed: {}", err),
                status => ts_debug!("poll refresh: {:?}", status),
            }
        }
    })
}
