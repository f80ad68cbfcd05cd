//! MusicMash server - main entry point
//!
//! Serves the playlist builder API: Spotify sign-in, the top-tracks proxy,
//! and the workflow editor with its SQLite-backed saves.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use musicmash_common::config::{default_config_path, prepare_root_folder, TomlConfig};
use musicmash_common::db::init_database;
use musicmash_common::events::EventBus;
use musicmash_server::config::CliOverrides;
use musicmash_server::{build_router, AppState, ServiceConfig};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const EVENT_BUS_CAPACITY: usize = 100;

/// Command-line arguments for musicmash-server
#[derive(Parser, Debug)]
#[command(name = "musicmash-server")]
#[command(about = "Visual playlist builder backend")]
#[command(version)]
struct Args {
    /// Path to config.toml
    #[arg(short, long, env = "MUSICMASH_CONFIG")]
    config: Option<PathBuf>,

    /// Folder holding the database
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:5730
    #[arg(short, long)]
    bind: Option<String>,

    /// Log level when RUST_LOG is not set
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(default_config_path);
    let toml_config = TomlConfig::load_or_default(config_path.as_deref());

    let cli = CliOverrides {
        root_folder: args.root_folder,
        bind: args.bind,
        log_level: args.log_level,
    };

    let config = ServiceConfig::resolve(&cli, &toml_config)
        .context("Failed to resolve configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "musicmash_server={0},musicmash_common={0},tower_http={0}",
                    config.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting MusicMash server v{}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) if path.exists() => info!("Config file: {}", path.display()),
        _ => warn!("No config file found, using environment and defaults"),
    }
    info!("Root folder: {}", config.root_folder.display());
    info!("Workspace: {} (placement: {})", config.workspace, config.placement);

    let db_path = prepare_root_folder(&config.root_folder)
        .context("Failed to prepare root folder")?;
    let db_pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;
    info!("Database: {}", db_path.display());

    let event_bus = EventBus::new(EVENT_BUS_CAPACITY);
    let bind_address = config.bind_address.clone();
    let state = AppState::build(config, db_pool, event_bus)
        .await
        .context("Failed to initialize application state")?;
    let editor = state.editor.clone();
    let shutdown = state.shutdown.clone();

    let app = build_router(state);

    info!("Starting HTTP server on {}", bind_address);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_address))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Open SSE streams would otherwise keep connections alive forever
            shutdown.cancel();
        })
        .await
        .context("Server error")?;

    // Pending edits must not be lost on exit
    editor.flush().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
