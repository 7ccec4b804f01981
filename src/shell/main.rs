use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt};

use inventory::modules::products::adapters::outbound::product_repository_in_memory::InMemoryProductRepository;
use inventory::shell::config::AppConfig;
use inventory::shell::http::router;
use inventory::shell::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = AppConfig::from_env()?;

    // In-memory persistence for now
    let repository = Arc::new(InMemoryProductRepository::new());
    let app = router(AppState::new(repository));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Product API: http://{}/products", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
