//! Server startup, shutdown, and worker spawning logic.
//!
//! `run_server` handles:
//! - Link store initialization (from snapshot when configured)
//! - Application state and router creation
//! - Server binding and graceful shutdown
//! - Snapshot worker spawning and the final flush

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::jobs::{create_job_channel, spawn_flush_ticker, Worker};
use crate::routes;
use crate::state::AppState;
use crate::store::LinkStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Open the link store, loading the snapshot file if one is configured and present.
pub fn open_store(config: &Config) -> AppResult<LinkStore> {
    match &config.snapshot.path {
        Some(path) if path.exists() => LinkStore::load_snapshot(path),
        Some(path) => {
            info!("No snapshot at {}, starting empty", path.display());
            Ok(LinkStore::new())
        }
        None => {
            info!("Snapshots disabled, links live in memory only");
            Ok(LinkStore::new())
        }
    }
}

/// Run the web server with the given configuration.
///
/// # Errors
///
/// This function will return an error if:
/// - The snapshot file exists but cannot be loaded
/// - Router construction fails
/// - Server binding fails
/// - Server runtime error occurs
pub async fn run_server(config: Config, addr: String) -> AppResult<()> {
    info!("Starting snaplink server...");

    let store = Arc::new(open_store(&config)?);

    // Snapshot worker, only when persistence is configured
    let mut background = None;
    let job_sender = match &config.snapshot.path {
        Some(path) => {
            let (job_sender, job_receiver) = create_job_channel();
            let worker = Worker::new(Arc::clone(&store), path.clone(), job_receiver);
            let worker_handle = tokio::spawn(worker.run());
            let ticker_handle = spawn_flush_ticker(
                job_sender.clone(),
                Duration::from_secs(config.snapshot.interval_seconds),
            );
            background = Some((worker_handle, ticker_handle));
            Some(job_sender)
        }
        None => None,
    };

    let state = Arc::new(AppState::new(&config, Arc::clone(&store), job_sender));

    let app = routes::create_router(
        Arc::clone(&state),
        config.cors.allowed_origins.clone(),
        config.rate_limit.clone(),
    )?;

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to address {}: {}", addr, e)))?;

    info!("Server listening on {}", addr);
    info!("Base URL: {}", config.server.base_url);

    axum::serve(listener, app)
        .with_graceful_shutdown(create_shutdown_signal())
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    // Final flush, then let the worker drain and stop
    if let Some((worker_handle, ticker_handle)) = background {
        ticker_handle.abort();
        if let Some(sender) = &state.job_sender {
            sender.flush_snapshot();
        }
        drop(state);

        worker_handle.await.unwrap_or_else(|e| {
            error!("Worker task failed: {:?}", e);
        });
        info!("Final snapshot written ({} links)", store.len());
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves when Ctrl+C (or SIGTERM on Unix) is received.
///
/// # Panics
///
/// Panics if signal handler installation fails. Without signal delivery there is
/// no graceful shutdown to perform.
async fn create_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    #[cfg(not(unix))]
    ctrl_c.await;
}
