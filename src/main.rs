//! Prompt Refinery server binary.
//!
//! Loads configuration, initializes tracing, and serves the refinery API.

use std::sync::Arc;

use prompt_refinery::adapters::backends::BackendKind;
use prompt_refinery::adapters::http::{refinery_router, RefineryAppState};
use prompt_refinery::adapters::session::InMemorySessionStore;
use prompt_refinery::config::AppConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    let json_logs = config.is_production();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.server.log_level.clone().into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    let backend = BackendKind::select(&config.backend);
    if backend == BackendKind::Simulated && !config.backend.force_mock {
        tracing::warn!("No model backend configured, serving simulated replies");
    }
    tracing::info!(backend = %backend, environment = ?config.server.environment, "Backend selected");

    let state = RefineryAppState::new(
        Arc::new(InMemorySessionStore::new()),
        config.backend.clone(),
        reqwest::Client::new(),
    );
    let app = refinery_router(state, &config.server.cors_origins_list());

    let addr = config.server.socket_addr()?;
    tracing::info!("Prompt Refinery listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutting down");
}
