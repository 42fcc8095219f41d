// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::sync::Arc;

use axum::extract::Request;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::application::access_service::AccessService;
use crate::application::dashboard_service::DashboardService;
use crate::application::live_updates::LiveUpdateBroadcaster;
use crate::infrastructure::config::load_config;
use crate::infrastructure::event_listener::EventListener;
use crate::infrastructure::file_storage::FileStorage;
use crate::infrastructure::ws_config_writer::WsConfigWriter;
use crate::presentation::app_state::AppState;
use crate::presentation::router::{build_router, with_ingress_prefix};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lovelace_access_manager=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            return Err(e.into());
        }
    };
    tracing::info!(
        "Starting Lovelace Access Manager v{} (storage: {})",
        env!("CARGO_PKG_VERSION"),
        config.storage_dir.display()
    );

    // Infrastructure
    let storage = Arc::new(FileStorage::new(config.storage_dir.clone()));
    let writer = Arc::new(WsConfigWriter::new(
        config.control_url.clone(),
        config.access_token().to_string(),
        config.save_timeout(),
    ));
    let broadcaster = Arc::new(LiveUpdateBroadcaster::new(config.heartbeat_interval()));

    // Services
    let state = Arc::new(AppState {
        dashboard_service: DashboardService::new(storage.clone()),
        access_service: AccessService::new(storage, writer),
        broadcaster: broadcaster.clone(),
        options_path: config.options_path.clone(),
    });

    let shutdown = CancellationToken::new();
    let listener_task = EventListener::new(
        config.control_url.clone(),
        config.access_token().to_string(),
        broadcaster.clone(),
        config.reconnect_delay(),
    )
    .spawn(shutdown.child_token());

    let app = with_ingress_prefix(build_router(state), config.ingress_path.clone());

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        axum::ServiceExt::<Request>::into_make_service(app),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown, broadcaster))
    .await?;

    if let Err(e) = listener_task.await {
        tracing::warn!("Event listener task ended abnormally: {}", e);
    }
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM, then stop the listener and end open streams
/// so in-flight SSE responses do not hold the server open.
async fn shutdown_signal(shutdown: CancellationToken, broadcaster: Arc<LiveUpdateBroadcaster>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
    shutdown.cancel();
    broadcaster.close_all();
}
