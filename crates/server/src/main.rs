use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use referboard_core::{
    load_config, validate_config, EventbriteSource, SheetsSource, TicketEngine, TicketSource,
};
use referboard_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("REFERBOARD_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Polling {} Eventbrite events", config.eventbrite.event_ids.len());
    info!("Cache duration: {}s", config.cache.duration_secs);

    if !config.eventbrite.token_configured() {
        warn!("Eventbrite token not configured; ticket requests will fail until it is set");
    }

    // Primary source is always created; a missing token is reported per request
    let primary: Arc<dyn TicketSource> = Arc::new(
        EventbriteSource::new(config.eventbrite.clone())
            .context("Failed to create Eventbrite client")?,
    );

    // Secondary source is optional
    let secondary: Option<Arc<dyn TicketSource>> = if config.sheets.is_enabled() {
        match SheetsSource::new(config.sheets.clone()) {
            Ok(source) => {
                info!("Google Sheets source enabled (range {})", config.sheets.range);
                Some(Arc::new(source))
            }
            Err(e) => {
                error!("Failed to initialize Google Sheets source, continuing without it: {}", e);
                None
            }
        }
    } else {
        info!("Google Sheets not configured");
        None
    };

    let engine = Arc::new(TicketEngine::new(
        primary,
        secondary,
        config.cache.duration_secs,
    ));

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), engine));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
