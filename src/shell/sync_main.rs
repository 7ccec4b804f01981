use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt};

use inventory::modules::offline_sync::adapters::outbound::http_product_client::HttpProductClient;
use inventory::modules::offline_sync::application::connectivity_monitor::ConnectivityMonitor;
use inventory::modules::offline_sync::application::sync_coordinator::{
    SyncCoordinator, SyncSettings,
};
use inventory::shared::infrastructure::key_value_store::file_system::FileKeyValueStore;
use inventory::shell::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = AppConfig::from_env()?;

    let store = Arc::new(FileKeyValueStore::open(&config.data_dir).await?);
    let remote = Arc::new(HttpProductClient::new(
        &config.api_url,
        config.request_timeout,
        config.probe_timeout,
    )?);
    let coordinator = Arc::new(SyncCoordinator::new(
        remote,
        store,
        SyncSettings {
            conflict_policy: config.conflict_policy,
            max_replay_attempts: config.max_replay_attempts,
        },
    ));

    let queued = coordinator.pending().await.len();
    tracing::info!(
        api = %config.api_url,
        data_dir = %config.data_dir.display(),
        policy = %config.conflict_policy,
        queued,
        "sync client started"
    );

    let mut connectivity = coordinator.subscribe_connectivity();
    let indicator = tokio::spawn(async move {
        while connectivity.changed().await.is_ok() {
            let status = if *connectivity.borrow_and_update() {
                "online"
            } else {
                "offline"
            };
            tracing::info!(status, "connectivity");
        }
    });
    let monitor = ConnectivityMonitor::new(coordinator.clone(), config.probe_interval).spawn();

    tokio::signal::ctrl_c().await?;
    monitor.abort();
    indicator.abort();
    tracing::info!(
        queued = coordinator.pending().await.len(),
        cached = coordinator.cached().await.len(),
        "sync client stopped"
    );
    Ok(())
}
