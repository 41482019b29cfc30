//! veritas-engine - Ensemble deepfake detection service
//!
//! Serves the detection engine over HTTP:
//! - `POST /api/detect`
//! - `GET /api/models`, `/api/models/best`, `/api/models/:id`
//! - `GET /health`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use veritas_common::config::{load_config, resolve_config_path};
use veritas_common::VeritasConfig;
use veritas_engine::{build_router, AppState, DetectionEngine};

/// Command-line arguments for veritas-engine
#[derive(Parser, Debug)]
#[command(name = "veritas-engine")]
#[command(about = "Ensemble deepfake detection service")]
#[command(version)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, env = "VERITAS_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overrides `[server].bind`
    #[arg(short, long, env = "VERITAS_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing so the configured level applies
    let config_path = resolve_config_path(args.config.as_deref());
    let mut config = match &config_path {
        Some(path) => load_config(path).context("Failed to load configuration")?,
        None => VeritasConfig::default(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("veritas_engine={0},veritas_common={0},tower_http={0}", config.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting veritas-engine v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &config_path {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("No configuration file found, using defaults"),
    }

    config.apply_env_credentials();

    let engine = DetectionEngine::from_config(&config).context("Failed to build detection engine")?;
    info!(
        models = engine.registry().len(),
        deadline_ms = engine.overall_deadline().as_millis() as u64,
        "Detection engine ready"
    );

    let app = build_router(AppState::new(Arc::new(engine)));

    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;
    info!("Listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
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
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
