//! Server initialization and routing
//!
//! This module handles the Axum server setup including:
//! - Router configuration with all API endpoints
//! - Worker pool bound on the insert route
//! - Startup banner and graceful shutdown handling

use crate::config::ServerConfig;
use crate::middleware::{log_requests, request_id};
use crate::routes::{api_info, documents, health, not_found};
use crate::state::ServerState;
use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use docingest::{BackendConfig, IngestService, ServiceMode};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes and middleware
///
/// `POST /v1/documents` runs behind a concurrency limit of
/// `max_workers` (at least 1); requests beyond it wait for a free slot.
///
/// Middleware stack (outermost first):
/// 1. HTTP tracing
/// 2. Request ID tracking
/// 3. Request logging
pub fn build_router(state: Arc<ServerState>) -> Router {
    let documents = Router::new()
        .route("/v1/documents", post(documents::insert_document))
        .layer(GlobalConcurrencyLimitLayer::new(state.config.max_workers.max(1)))
        .layer(DefaultBodyLimit::max(state.config.max_body_size()));

    Router::new()
        .route("/", get(api_info))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .merge(documents)
        .fallback(not_found)
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the document ingestion server
///
/// Initialization steps:
/// 1. Sets up structured JSON logging with the configured log level
/// 2. Loads backend settings and runs the one-shot backend connection
/// 3. Builds the Axum router and binds the listener
/// 4. Serves until SIGTERM or Ctrl+C
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    init_tracing(&config.log_level);

    let backend_config = config.backend_config()?;
    let service = IngestService::connect(&backend_config).await;
    let state = Arc::new(ServerState::new(config.clone(), service));

    let app = build_router(state.clone());
    let addr: SocketAddr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    log_startup(&state, addr, &backend_config);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(
        fallback_documents = state.service.fallback_store().count(),
        "Server shutdown complete"
    );
    Ok(())
}

fn init_tracing(log_level: &str) {
    let result = tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json()
        .try_init();
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

fn log_startup(state: &ServerState, addr: SocketAddr, backend: &BackendConfig) {
    let mode = state.service.mode();
    tracing::info!(%addr, "docingest server started");
    tracing::info!(
        %mode,
        workers = state.config.max_workers,
        max_body_mb = state.config.max_body_size_mb,
        "Server mode"
    );

    match mode {
        ServiceMode::Connected => tracing::info!(
            host = %backend.host,
            port = backend.port,
            database = %backend.database,
            "Writing through MarkLogic"
        ),
        ServiceMode::Simulated => {
            tracing::info!("To enable MarkLogic integration:");
            tracing::info!("  1. Build with the `marklogic` feature (on by default)");
            tracing::info!(
                env_file = %state.config.env_file,
                "  2. Configure MARKLOGIC_* settings in the environment or env file"
            );
            tracing::info!(
                host = %backend.host,
                port = backend.port,
                "  3. Ensure MarkLogic is running and reachable"
            );
        }
    }

    tracing::info!("Supported operations: InsertDocument");
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
