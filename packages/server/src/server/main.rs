// Main entry point for the seeker API server

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use seeker::{CrawlerPlugin, OrchestratorConfig, PostgresStore, SearchOrchestrator, WikipediaPlugin};
use server_core::{
    server::{build_app, AppState},
    Config,
};
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,seeker=debug,server_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Handshakes Seeker API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    let store = Arc::new(
        PostgresStore::from_pool(pool.clone())
            .await
            .context("Failed to bootstrap seeker schema")?,
    );

    let wikipedia = WikipediaPlugin::from_env().context("Failed to create Wikipedia plugin")?;
    let plugins: Vec<Arc<dyn CrawlerPlugin>> = vec![Arc::new(wikipedia)];

    let orchestrator = Arc::new(
        SearchOrchestrator::from_store(store, plugins)
            .context("Failed to create search orchestrator")?
            .with_config(
                OrchestratorConfig::default()
                    .with_poll_backoff(Duration::from_secs(config.poll_backoff_secs)),
            ),
    );

    let shutdown = CancellationToken::new();
    let workers = orchestrator.start(shutdown.clone());
    tracing::info!(plugins = ?orchestrator.plugin_names(), "Search workers started");

    let app = build_app(AppState::new(orchestrator).with_db_pool(pool));

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .context("Server error")?;

    shutdown.cancel();
    for worker in workers {
        if let Err(e) = worker.await {
            tracing::warn!(error = %e, "Search worker ended abnormally");
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    tokio::select! {
        _ = shutdown.cancelled() => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown signal received");
        }
    }
    shutdown.cancel();
}
