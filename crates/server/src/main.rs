mod api;
mod metrics;
mod sources;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dragnet_core::{
    load_config, validate_config, HttpFetcher, PageFetcher, SearchManager, SessionListener,
};

use api::create_router;
use sources::build_extractor;
use state::{AppState, ConfiguredSource, SessionRegistry};

/// Client-level fetch ceiling; per-source timeouts are enforced per request.
const FETCH_CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
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
    let config_path = std::env::var("DRAGNET_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;
    info!("Configuration loaded successfully");

    // Shared HTTP fetcher for all sources
    let fetcher: Arc<dyn PageFetcher> = Arc::new(
        HttpFetcher::new(FETCH_CLIENT_TIMEOUT).context("Failed to create HTTP fetcher")?,
    );

    // Build extractors for enabled sources
    let mut configured = Vec::new();
    for entry in config.sources.iter().filter(|s| s.enabled) {
        info!(
            source = %entry.spec.name,
            kind = ?entry.kind,
            crawler = entry.spec.crawler,
            "Source enabled"
        );
        configured.push(ConfiguredSource {
            entry: entry.clone(),
            extractor: build_extractor(entry),
        });
    }
    if configured.is_empty() {
        warn!("No sources enabled; searches will be rejected");
    }

    // Session registry doubles as the manager's listener
    let sessions = Arc::new(SessionRegistry::new());
    let manager = SearchManager::with_workers(
        config.search.workers,
        Arc::clone(&sessions) as Arc<dyn SessionListener>,
    );
    info!(workers = config.search.workers, "Search manager initialized");

    let shutdown_timeout = Duration::from_secs(config.search.shutdown_timeout_secs);

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        manager,
        fetcher,
        configured,
        sessions,
    ));

    // Create router
    let app = create_router(Arc::clone(&state));

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

    // Drain in-flight search units before exiting
    info!("Server shutting down...");
    if !state.manager().shutdown(shutdown_timeout).await {
        warn!(
            "Search units still in flight after {:?}, exiting anyway",
            shutdown_timeout
        );
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
