//! Health probe and service index.

use axum::{extract::State, Json};
use docscan_core::HealthReport;
use media::ALLOWED_EXTENSIONS;
use serde_json::{json, Value};

use crate::server::GatewayState;

/// Handler for `GET /health`.
///
/// Reports the pipeline state without constructing it.
pub async fn health(State(state): State<GatewayState>) -> Json<HealthReport> {
    Json(HealthReport::new(
        &state.settings.app_name,
        &state.settings.app_version,
        state.pipeline.status(),
    ))
}

/// Handler for `GET /`
pub async fn root(State(state): State<GatewayState>) -> Json<Value> {
    let settings = &state.settings;
    Json(json!({
        "service": settings.app_name,
        "version": settings.app_version,
        "status": "running",
        "health": "/health",
        "extract": settings.extract_path(),
        "max_upload_mb": settings.max_upload_mb(),
        "allowed_extensions": ALLOWED_EXTENSIONS,
    }))
}
