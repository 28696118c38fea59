//! Main HTTP Gateway Server.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use docscan_config::Settings;
use docscan_core::{AdmissionGate, EngineFactory, PipelineHandle};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument, warn};

use crate::{extract, health_api};

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub settings: Arc<Settings>,
    /// The one engine instance, built on first extraction.
    pub pipeline: Arc<PipelineHandle>,
    pub gate: AdmissionGate,
}

impl GatewayState {
    pub fn new(settings: Settings, factory: Arc<dyn EngineFactory>) -> Self {
        let gate = AdmissionGate::new(
            settings.max_concurrent_requests,
            settings.admission_policy,
            settings.admission_timeout(),
        );
        Self {
            settings: Arc::new(settings),
            pipeline: Arc::new(PipelineHandle::new(factory)),
            gate,
        }
    }
}

/// Build the router with every route and middleware layer.
pub fn build_router(state: GatewayState) -> Router {
    let body_limit = usize::try_from(state.settings.max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let extract_path = state.settings.extract_path();

    Router::new()
        .route("/", get(health_api::root))
        .route("/health", get(health_api::health))
        .route(
            &extract_path,
            post(extract::extract_document).layer(DefaultBodyLimit::max(body_limit)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Starts the HTTP server and runs until SIGINT/SIGTERM.
///
/// In-flight requests are allowed to finish before this returns.
#[instrument(skip(state))]
pub async fn start_server(state: GatewayState) -> Result<()> {
    let addr = state.settings.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, extract = %state.settings.extract_path(), "Gateway HTTP server listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Cannot listen for SIGTERM");
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
    info!("Shutdown signal received, draining in-flight requests");
}
