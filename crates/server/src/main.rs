//! Loyalty Server - Main entry point

use anyhow::Context;
use loyalty_core::Backend;
use loyalty_engine::{load_game_config, LoyaltyService, SystemClock};
use loyalty_persistence::Database;
use loyalty_server::{build_router, AppState, ServerConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loyalty_server=debug,loyalty_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Loyalty Portal server");

    let config = ServerConfig::from_env()?;
    let db = Database::connect(&config.db_path)
        .await
        .with_context(|| format!("opening database at {}", config.db_path.display()))?;
    tracing::info!("Database ready at {}", config.db_path.display());

    let backend: Arc<dyn Backend> = Arc::new(db.clone());
    let game = load_game_config(backend.as_ref()).await;
    let service = LoyaltyService::new(
        backend,
        Arc::new(SystemClock),
        config.engine_config(),
        game,
    );

    let app = build_router(AppState::new(service, db));
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    tracing::info!("Loyalty server listening on {}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
        .context("server error")?;

    tracing::info!("Loyalty server stopped");
    Ok(())
}
