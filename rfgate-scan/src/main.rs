//! rfgate-scan - RFID gate scanning service
//!
//! Connects to the reader event stream, resolves sighted tags against the
//! backend and serves the control API the gate UI drives.

use anyhow::{Context, Result};
use clap::Parser;
use rfgate_common::config::{resolve_config_path, TomlConfig};
use rfgate_common::events::EventBus;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rfgate_scan::{AppState, Collaborators, ScanEngine};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "RFID gate scanning service")]
struct Args {
    /// Config file (overrides RFGATE_CONFIG and the default locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Control API listen address (overrides `bind`)
    #[arg(short, long, env = "RFGATE_BIND")]
    bind: Option<String>,

    /// Gate id (overrides `gate_id`)
    #[arg(short, long, env = "RFGATE_GATE")]
    gate: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref())?;
    let mut config = TomlConfig::load(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(gate) = args.gate {
        config.gate_id = gate;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting rfgate-scan");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!(config = %config_path.display(), gate_id = %config.gate_id, "Configuration loaded");

    let event_bus = EventBus::new(100);
    let collaborators = Collaborators::from_config(&config)?;
    let engine = ScanEngine::new(
        config.gate_id.clone(),
        config.engine.clone(),
        collaborators,
        event_bus,
    );

    // No automatic reconnect: a failed or dropped reader stream needs a restart
    let reader = match engine.open(&config.reader).await {
        Ok(handle) => Some(handle),
        Err(e) => {
            error!(error = %e, "Reader stream unavailable");
            None
        }
    };

    let app = rfgate_scan::build_router(AppState::new(engine));

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("Listening on http://{}", config.bind);
    info!("Health check: http://{}/health", config.bind);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Some(handle) = reader {
        handle.close().await;
    }

    served?;
    info!("rfgate-scan stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
