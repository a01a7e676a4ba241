//! Process entry point: loads configuration, opens the store, and serves
//! the five-route HTTP API.

use std::sync::Arc;

use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cfg = config::Config::from_env();
    tracing::info!(bind_addr = %cfg.bind_addr, replicas = ?cfg.replicas, "starting up");

    let store = Arc::new(store::open(&cfg)?);
    let replicator = Arc::new(store::Replicator::new(cfg.replicas.clone()));
    let state = Arc::new(AppState { store, replicator });

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!(addr = %cfg.bind_addr, "listening");
    axum::serve(listener, server::app(state)).await?;

    Ok(())
}
