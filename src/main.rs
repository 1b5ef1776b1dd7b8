//! keti3 cache server
//!
//! Serves the group cache and URL resolution over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keti3_cache::api::{create_router, AppState};
use keti3_cache::{spawn_cleanup_task, Config, MemoryStore, RedisStore, RemoteStore};

/// Main entry point for the cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect the remote tier (Redis, or in-memory with an expiry sweep)
/// 4. Build the cache facade and optional URL resolver
/// 5. Start HTTP server on configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keti3_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting keti3 cache server");

    let config = Config::from_env().context("failed to load configuration")?;
    info!(
        "Configuration loaded: groups={}, port={}, redis={}, signer={}",
        config.cache_groups.len(),
        config.server_port,
        config.redis_url.is_some(),
        config.signer.is_some()
    );

    let (remote, cleanup_handle): (Arc<dyn RemoteStore>, Option<JoinHandle<()>>) =
        match &config.redis_url {
            Some(url) => {
                let store = RedisStore::connect(url)
                    .await
                    .context("failed to connect to Redis")?;
                (Arc::new(store) as Arc<dyn RemoteStore>, None)
            }
            None => {
                warn!("REDIS_URL not set, using in-memory remote tier");
                let store = Arc::new(MemoryStore::new());
                let handle = spawn_cleanup_task(store.clone(), config.cleanup_interval);
                (store as Arc<dyn RemoteStore>, Some(handle))
            }
        };

    let state = AppState::from_config(&config, remote).context("failed to build cache")?;
    info!("Cache facade initialized");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the expiry sweep if one is running.
async fn shutdown_signal(cleanup_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    if let Some(handle) = cleanup_handle {
        handle.abort();
        warn!("Expiry sweep aborted");
    }
}
