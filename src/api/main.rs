use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use form_platform_api::config::AppConfig;
use form_platform_api::middleware::observability::init_tracing;
use form_platform_api::routes::{AppState, build_app};
use form_platform_api::services::spawn_sweep_task;
use tracing::info;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    info!("Application starting...");

    let config = Arc::new(AppConfig::from_env().context("Invalid configuration")?);
    info!(
        "Environment: {}, sweep every {:?}",
        config.app_env, config.sweep_interval
    );

    let storage = AppState::init_storage(&config)
        .await
        .context("Failed to initialise storage")?;
    let state = AppState::new(config.clone(), storage);
    state
        .bootstrap()
        .await
        .context("Failed to seed roles and admin account")?;

    // The sweep runs on its own interval regardless of request traffic.
    let sweep = spawn_sweep_task(state.forms.repository().clone(), config.sweep_interval);

    let app = build_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on {}", addr);
    info!("Health check available at http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    sweep.abort();
    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on SIGINT or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for CTRL+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
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
        _ = ctrl_c => info!("SIGINT received, shutting down gracefully"),
        _ = terminate => info!("SIGTERM received, shutting down gracefully"),
    }
}
