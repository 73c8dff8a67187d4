mod config;
mod dto;
mod handlers;
mod models;
mod repository;
mod router;
mod service;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use std::sync::Arc;

use service::CapsuleService;

#[tokio::main]
async fn main() {
    // Log setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Load config
    let cfg = config::load_config().unwrap_or_else(|e| {
        tracing::error!("Failed to load config: {e}");
        panic!("failed to load config: {e}");
    });
    tracing::info!("Successfully loaded time capsule config");

    // Store connection, shared by every request
    let repo = repository::connect(&cfg.store_uri)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to establish store connection: {e}");
            panic!("failed to establish store connection: {e}");
        });
    tracing::info!("Using {} document store", repo.backend());

    // Service creation
    let service = Arc::new(CapsuleService::new(repo.clone()));

    let router = router::build(service, &cfg.allowed_origins);

    let listener = TcpListener::bind(("0.0.0.0", cfg.port))
        .await
        .expect("Failed to bind to address");
    let addr = listener.local_addr().expect("listener has no local address");

    tracing::info!("Time capsule server starting, listening on {}", addr);

    if let Err(e) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("HTTP server error: {e}");
    }

    repo.close().await;
    tracing::info!("Time capsule server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining requests");
}
