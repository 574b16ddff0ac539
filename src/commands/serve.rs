//! HTTP server command implementation.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{info, warn};

use linkhub::config::{self, Config, StoreBackend};
use linkhub::hub::{ActorRegistry, HUB_ACTOR_NAME, StoreFactory};
use linkhub::server::{self, AppState};

pub async fn run(
    config_path: &str,
    host_override: Option<IpAddr>,
    port_override: Option<u16>,
) -> Result<()> {
    let mut config = Config::load(config_path)
        .await
        .with_context(|| format!("failed to load config from {config_path}"))?;

    // CLI overrides config
    if let Some(host) = host_override {
        config.server.host = host.to_string();
    }
    if let Some(port) = port_override {
        config.server.port = port;
    }

    let stores = match config.store.backend {
        StoreBackend::Memory => StoreFactory::Memory,
        StoreBackend::File => {
            let raw = config
                .store
                .path
                .as_deref()
                .unwrap_or(Path::new(config::DEFAULT_STORE_DIR));
            StoreFactory::File(config::resolve_path(Path::new(config_path), raw))
        }
    };
    info!(stores = ?stores, "Opening actor stores");

    let registry = ActorRegistry::new(stores);
    let state = AppState::from_config(&config, registry.clone())
        .context("failed to build HTTP client")?;

    if state.chat.has_completion() {
        info!(model = %config.chat.model, "Chat completion enabled");
    } else {
        info!("Chat completion disabled, using rule-based replies");
    }
    if config::non_empty(&config.verifier.url).is_none() {
        warn!("Verification endpoint not configured, /verify will answer 501");
    }

    // Seed the store before the first request arrives.
    registry.get_or_spawn(HUB_ACTOR_NAME).await;

    let app = server::build_app(state, config.server.request_timeout_seconds);

    let ip: IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("invalid host '{}'", config.server.host))?;
    let addr = SocketAddr::new(ip, config.server.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(addr = %addr, "Starting server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drain queued actor commands before exiting
    registry.shutdown().await;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
