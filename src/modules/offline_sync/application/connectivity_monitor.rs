use crate::modules::offline_sync::application::sync_coordinator::SyncCoordinator;
use crate::modules::offline_sync::core::ports::ProductRemote;
use crate::modules::offline_sync::core::sync_report::SyncReport;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Probes the remote on an interval and feeds the result to the coordinator.
///
/// Keeps its own view of the last probe, so a restored connection replays the outbox
/// even when a user call already flipped the coordinator's flag back to online.
pub struct ConnectivityMonitor<TRemote>
where
    TRemote: ProductRemote + 'static,
{
    coordinator: Arc<SyncCoordinator<TRemote>>,
    interval: Duration,
    last_seen: bool,
}

impl<TRemote> ConnectivityMonitor<TRemote>
where
    TRemote: ProductRemote + 'static,
{
    pub fn new(coordinator: Arc<SyncCoordinator<TRemote>>, interval: Duration) -> Self {
        Self {
            coordinator,
            interval,
            last_seen: false,
        }
    }

    /// One probe. Returns the replay report when this observation triggered a pass.
    pub async fn observe(&mut self) -> Option<SyncReport> {
        let online = self.coordinator.probe().await;
        let restored = online && !self.last_seen;
        self.last_seen = online;

        let report = self.coordinator.connectivity_changed(online).await;
        if restored && report.is_none() {
            return self.coordinator.sync_pending().await;
        }
        report
    }

    pub fn spawn(mut self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(report) = self.observe().await else {
                    continue;
                };
                if !report.stalled.is_empty() {
                    tracing::warn!(
                        stalled = report.stalled.len(),
                        "queued mutations keep failing to replay"
                    );
                }
                if report.storage_degraded {
                    tracing::warn!("local storage is refusing writes, offline changes live in memory only");
                }
            }
        })
    }
}
