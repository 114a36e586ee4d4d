//! Gateway server: backend check, router, graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ValueEnum;
use gateconf::GateConfig;
use tracing::info;

use crate::backend::{KuboBackend, MemoryBackend, StorageBackend};
use crate::web::{self, WebState};

/// Which storage backend `serve` talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BackendKind {
    /// Kubo-compatible RPC API at `backend.api_url`
    #[default]
    Kubo,
    /// In-process map; content is lost on exit
    Memory,
}

pub fn build_backend(kind: BackendKind, config: &GateConfig) -> Result<Arc<dyn StorageBackend>> {
    Ok(match kind {
        BackendKind::Kubo => Arc::new(
            KuboBackend::from_config(&config.infra.backend)
                .context("Failed to create storage backend client")?,
        ),
        BackendKind::Memory => Arc::new(MemoryBackend::new()),
    })
}

/// Run the gateway until SIGINT or SIGTERM.
///
/// Fails before binding if the backend does not answer a version request.
pub async fn run(config: GateConfig, backend: Arc<dyn StorageBackend>) -> Result<()> {
    info!("cidgate starting");

    let version = backend.version().await.with_context(|| {
        format!(
            "Storage backend at {} is not reachable (is the node running?)",
            config.infra.backend.api_url
        )
    })?;
    info!(%version, "storage backend connected");

    info!(
        threshold = config.cache.threshold,
        eviction = %config.cache.eviction,
        "content cache"
    );
    if config.infra.paths.persist_copies {
        info!(
            upload_dir = %config.infra.paths.upload_dir.display(),
            retrieve_dir = %config.infra.paths.retrieve_dir.display(),
            "persisting copies"
        );
    }

    let app = web::router(WebState::from_config(&config, backend));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.infra.bind.http_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("cidgate ready on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT, shutting down...");
        }
        _ = terminate() => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!("Failed to install SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
