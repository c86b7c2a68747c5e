//! Crispy Arena - Battle Server

use std::sync::Arc;

use duel_server::{ArenaService, InMemoryCharacterStore, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Crispy Arena battle server");

    let config = ServerConfig::from_env()?;
    tracing::info!(
        sweep_interval_secs = config.sweep_interval_secs,
        stale_after_secs = config.stale_after_secs,
        "Configuration loaded"
    );

    let service = ArenaService::new(config, Arc::new(InMemoryCharacterStore::new()))?;
    let sweeper = service.spawn_sweeper();

    tokio::signal::ctrl_c().await?;

    sweeper.abort();
    tracing::info!(
        active_battles = service.registry().len()?,
        "Shutting down"
    );
    Ok(())
}
