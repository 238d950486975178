use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info};

use super::api::{self, AppState, SharedState};
use crate::config::{ShowcaseConfig, Workspace};
use crate::generate::Generator;
use crate::jobs::{JobRunner, JobStore};
use crate::manifest::ManifestStore;

/// Listener options for `showcase serve`.
pub struct ServerConfig {
    pub port: u16,
    pub dev_mode: bool,
}

/// Build the application router.
pub fn build_router(state: SharedState) -> Router {
    api::api_router().with_state(state)
}

/// Wire the job runner, manifest store and router from configuration.
pub fn build_state(config: &ShowcaseConfig, workspace: Workspace) -> Result<SharedState> {
    let generator = Generator::from_config(config, workspace.clone())?;
    let store = JobStore::new(Duration::from_secs(config.server.job_retention_secs));
    Ok(Arc::new(AppState {
        runner: JobRunner::new(store, generator),
        manifest: ManifestStore::new(workspace.manifest_path()),
        generation: config.generation.clone(),
        api_key: config.model.api_key.clone(),
    }))
}

/// Start the HTTP server and block until Ctrl+C. In-flight jobs are aborted
/// on shutdown.
pub async fn start_server(state: SharedState, server: ServerConfig, sweep_interval: Duration) -> Result<()> {
    let sweeper = spawn_sweeper(state.runner.store().clone(), sweep_interval);

    let mut app = build_router(Arc::clone(&state));
    if server.dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    let host = if server.dev_mode { "0.0.0.0" } else { "127.0.0.1" };
    let addr = format!("{}:{}", host, server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    info!(%local_addr, "showcase server listening");
    println!("Showcase server running at http://{}", local_addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error");

    state.runner.shutdown();
    sweeper.abort();
    println!("Server shut down gracefully.");
    served
}

fn spawn_sweeper(store: JobStore, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every.max(Duration::from_secs(1)));
        loop {
            ticker.tick().await;
            let evicted = store.evict_expired();
            if evicted > 0 {
                debug!(evicted, remaining = store.len(), "job sweep");
            }
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    println!("\nShutting down...");
}
