//! rosterd - guild roster and shared-timer daemon
//!
//! Wires together:
//! - The cache-backed JSON file store
//! - The countdown timer engine
//! - Ephemeral interaction state with periodic cleanup
//! - The in-process update bus
//! - The HTTP admin API

mod http;

use anyhow::{Context, Result};
use clap::Parser;
use roster_api::PushEvent;
use roster_core::{Selections, TimerEngine, CLEANUP_INTERVAL};
use roster_store::JsonStore;
use roster_util::default_data_file;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// rosterd - guild roster and shared-timer daemon
#[derive(Parser, Debug)]
#[command(name = "rosterd")]
#[command(about = "Guild roster and shared-timer daemon", long_about = None)]
struct Args {
    /// Data file path (or set ROSTER_DATA_FILE env var)
    #[arg(short, long, env = "ROSTER_DATA_FILE", default_value_os_t = default_data_file())]
    data_file: PathBuf,

    /// Listen address for the HTTP admin API (or set ROSTER_BIND env var)
    #[arg(short, long, env = "ROSTER_BIND", default_value = "127.0.0.1:3000")]
    bind: String,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "rosterd starting"
    );

    // Open the store; creates the data file or persists pending migrations
    let store = Arc::new(
        JsonStore::open(&args.data_file)
            .await
            .with_context(|| format!("Failed to open data file {:?}", args.data_file))?,
    );
    info!(data_file = %args.data_file.display(), "Store initialized");

    let engine = Arc::new(TimerEngine::new(store.clone()));

    // Ephemeral interaction state with a periodic expiry sweep
    let selections = Arc::new(Selections::new());
    let cleanup = selections.spawn_cleanup(CLEANUP_INTERVAL);

    // Update bus; this subscriber keeps the channel drained even when no
    // frontend transport is attached
    let (updates, _) = broadcast::channel::<PushEvent>(16);
    let mut bus_rx = updates.subscribe();
    let bus_logger = tokio::spawn(async move {
        loop {
            match bus_rx.recv().await {
                Ok(event) => debug!(kind = ?event.kind(), "State update"),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "Update bus logger lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let state = http::AppState {
        store,
        engine,
        updates,
    };

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    info!(addr = %args.bind, "HTTP server listening");

    axum::serve(listener, http::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    // Graceful shutdown
    info!("Shutting down rosterd");
    cleanup.abort();
    bus_logger.abort();
    info!("Shutdown complete");
    Ok(())
}

/// Resolves when SIGTERM or SIGINT arrives.
async fn shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "Failed to create SIGTERM handler");
            return std::future::pending::<()>().await;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "Failed to create SIGINT handler");
            return std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
        _ = sigint.recv() => info!("Received SIGINT, shutting down gracefully"),
    }
}
