use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediadex_core::{
    load_config, metrics, validate_config, FederatedSearch, GroupStore, Shard, SizeMonitor,
    SqliteGroupStore, SqliteShard, ShardName, WriteRouter,
};

use mediadex_server::api::create_router;
use mediadex_server::state::AppState;

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
    let config_path = std::env::var("MEDIADEX_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Primary shard: {:?}", config.shards.primary_path);
    info!("Secondary shard: {:?}", config.shards.secondary_path);
    info!(
        "Migration threshold: {} MB",
        config.routing.migration_threshold_mb
    );

    // Open the two shards
    let primary: Arc<dyn Shard> = Arc::new(
        SqliteShard::open(&config.shards.primary_path, ShardName::Primary)
            .context("Failed to open primary shard")?,
    );
    let secondary: Arc<dyn Shard> = Arc::new(
        SqliteShard::open(&config.shards.secondary_path, ShardName::Secondary)
            .context("Failed to open secondary shard")?,
    );
    info!("Shards initialized");

    // Open the saved group store
    let groups: Arc<dyn GroupStore> = Arc::new(
        SqliteGroupStore::open(&config.shards.groups_path)
            .context("Failed to open group store")?,
    );
    info!("Group store initialized");

    // Size monitor and write router
    let monitor = Arc::new(SizeMonitor::new(
        config.routing.size_cache_ttl(),
        config.routing.migration_threshold_bytes(),
    ));
    let router = WriteRouter::new(Arc::clone(&primary), Arc::clone(&secondary), monitor);

    // Federated search engine
    let search = FederatedSearch::new(
        Arc::clone(&primary),
        Arc::clone(&secondary),
        Arc::clone(&groups),
        config.search.use_caption_filter,
    );

    // Metrics registry
    let metrics_registry = prometheus::Registry::new();
    metrics::register_metrics(&metrics_registry).context("Failed to register metrics")?;

    // Create app state and router
    let state = Arc::new(AppState::new(
        config.clone(),
        router,
        search,
        groups,
        metrics_registry,
    ));
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
