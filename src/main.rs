//! Peercache demo node
//!
//! Serves the `scores` group over the peer protocol, backed by a slow
//! in-memory data source, and optionally a front-end API.
//!
//! ```text
//! $ SERVER_PORT=8001 PEERS=http://localhost:8001,http://localhost:8002 peercache
//! $ SERVER_PORT=8002 PEERS=http://localhost:8001,http://localhost:8002 API_ENABLED=true peercache
//! $ curl "http://localhost:9999/api?key=Tom"
//! 630
//! $ curl http://localhost:8001/_cache/scores/kkk
//! kkk not exist
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use peercache::api::{create_api_router, create_peer_router, ApiState, AppState};
use peercache::{Config, Group, HttpPool, LoaderFn, Registry};

/// Latency of the demo data source.
const SLOW_DB_DELAY: Duration = Duration::from_millis(200);

fn slow_db(key: &str) -> Option<&'static str> {
    match key {
        "Tom" => Some("630"),
        "Jack" => Some("589"),
        "Sam" => Some("567"),
        _ => None,
    }
}

fn create_group(registry: &Registry, cache_bytes: usize) -> anyhow::Result<Group> {
    let group = registry.create_group(
        "scores",
        cache_bytes,
        LoaderFn(|key: String| async move {
            info!(key = %key, "[SlowDB] search key");
            tokio::time::sleep(SLOW_DB_DELAY).await;
            slow_db(&key)
                .map(|v| v.as_bytes().to_vec())
                .ok_or_else(|| anyhow::anyhow!("{key} not exist"))
        }),
    )?;
    Ok(group)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "peercache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    config.validate()?;
    info!(
        "Configuration loaded: self={}, peers={:?}, base_path={}, replicas={}, cache_bytes={}",
        config.self_addr, config.peers, config.base_path, config.replicas, config.cache_bytes
    );

    let registry = Registry::new();
    let group = create_group(&registry, config.cache_bytes)?;

    let pool = Arc::new(HttpPool::from_config(&config)?);
    group.register_peers(pool)?;

    if config.api_enabled {
        let app = create_api_router(ApiState::new(group.clone()));
        let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("binding front-end on {addr}"))?;
        info!("Front-end listening on http://{}", addr);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "front-end server failed");
            }
        });
    }

    let app = create_peer_router(AppState::new(registry), &config.base_path);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding peer server on {addr}"))?;
    info!("Peer server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("peer server failed")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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
}
