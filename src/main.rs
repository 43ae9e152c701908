use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hotelier::api::metrics::init_metrics;
use hotelier::api::rate_limit::spawn_cleanup_task;
use hotelier::config::Config;
use hotelier::AppState;

#[derive(Parser, Debug)]
#[command(name = "hotelier")]
#[command(author, version, about = "Hotel administration and guest booking API", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "hotelier.toml", env = "HOTELIER_CONFIG")]
    config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;

    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Hotelier v{}", env!("CARGO_PKG_VERSION"));

    for dir in [&config.server.data_dir, &config.server.media_dir] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    let db = hotelier::db::init(&config.server.data_dir).await?;

    let mut state = AppState::new(config.clone(), db);
    match init_metrics() {
        Ok(handle) => state = state.with_metrics(handle),
        Err(e) => tracing::warn!(error = %e, "Metrics disabled"),
    }
    let state = Arc::new(state);

    if config.rate_limit.enabled {
        spawn_cleanup_task(state.rate_limiter.clone(), config.rate_limit.cleanup_interval);
    }

    if config.auth.admin_token.as_deref().map_or(true, str::is_empty) {
        tracing::warn!("No admin token configured; dashboard routes are unauthenticated");
    }

    let app = hotelier::api::create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("API server listening on http://{}", addr);
    tracing::info!(
        "Serving media from {} at {}/media",
        config.server.media_dir.display(),
        config.server.public_url.trim_end_matches('/')
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

    tracing::info!("Shutdown signal received");
}
