use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use finport_ai::app;
use finport_ai::config::AppConfig;
use finport_ai::logging::{init_logging, LoggingConfig};
use finport_ai::models::RebalanceConfig;
use finport_ai::state::AppState;
use finport_ai::store::PgRebalanceStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    init_logging(LoggingConfig::from_env())?;

    let config = AppConfig::from_env()?;

    let rebalance_config = RebalanceConfig::default();
    rebalance_config.validate()?;

    // Connections are acquired lazily, per query.
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_lazy_with(config.database.clone());

    let state = AppState {
        store: Arc::new(PgRebalanceStore::new(pool.clone())),
        rebalance_config: Arc::new(rebalance_config),
    };
    let app = app::create_app(state);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("🚀 FinPort-AI running at http://{}/", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Shut down cleanly");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
