//! `POST {API_V1_PREFIX}/ocr/extract-document`
//!
//! Flow: validate and stage the upload → take an admission slot →
//! get (or build) the pipeline → run the engine → scrub paths → respond.
//! The slot and the temp file are owned by this future, so they are released
//! on every exit, including client disconnects.

use std::time::Instant;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use docscan_core::ExtractionResponse;
use media::{detect_mime_type, is_pdf};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::redact::redact_staged_path;
use crate::server::GatewayState;
use crate::upload::{read_upload, Upload};

pub async fn extract_document(
    State(state): State<GatewayState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ExtractionResponse>, ApiError> {
    let started = Instant::now();
    let request_id = Uuid::new_v4();
    let span = info_span!("extract_document", %request_id);

    async move {
        let mut multipart = multipart.inspect_err(|e| warn!(error = %e, "Rejected request"))?;
        let response = process(&state, &mut multipart, request_id, started).await;
        if let Err(err) = &response {
            if err.is_client_error() {
                warn!(error = %err, status = err.status().as_u16(), "Rejected upload");
            }
        }
        response.map(Json)
    }
    .instrument(span)
    .await
}

async fn process(
    state: &GatewayState,
    multipart: &mut Multipart,
    request_id: Uuid,
    started: Instant,
) -> Result<ExtractionResponse, ApiError> {
    let settings = &state.settings;
    let Upload {
        file_name,
        artifact,
    } = read_upload(
        multipart,
        settings.max_upload_bytes,
        settings.upload_tmp_dir.as_deref(),
        request_id,
    )
    .await?;
    let size = artifact.len();
    info!(file = %file_name, size, "Upload accepted");

    let _permit = state.gate.acquire().await.map_err(|e| {
        warn!(
            error = %e,
            in_flight = state.gate.in_flight(),
            limit = state.gate.limit(),
            policy = %state.gate.policy(),
            "No extraction slot"
        );
        ApiError::from(e)
    })?;

    let engine = state.pipeline.get_or_init().await.map_err(|e| {
        error!(error = %e, "OCR pipeline unavailable");
        ApiError::from(e)
    })?;

    let mime = detect_mime_type(artifact.path());
    debug!(mime, multi_page = is_pdf(artifact.path()), engine = engine.name(), "Running extraction");
    let outcome = tokio::time::timeout(settings.engine_timeout(), engine.extract(artifact.path())).await;
    let mut results = match outcome {
        Ok(Ok(results)) => results,
        Ok(Err(e)) => {
            error!(file = %file_name, size, mime, engine = engine.name(), error = %e, "Extraction failed");
            return Err(ApiError::Processing { request_id });
        }
        Err(_) => {
            error!(
                file = %file_name,
                size,
                mime,
                timeout_secs = settings.engine_timeout_secs,
                "Extraction timed out"
            );
            return Err(ApiError::Processing { request_id });
        }
    };

    let staged = artifact.path().display().to_string();
    for page in &mut results {
        redact_staged_path(page, &staged, &file_name);
    }
    if let Err(e) = artifact.remove() {
        warn!(path = %staged, error = %e, "Failed to delete staged upload");
    }

    let response = ExtractionResponse::new(results, started.elapsed());
    info!(
        file = %file_name,
        results = response.results.len(),
        processing_time = response.processing_time,
        "Document processed"
    );
    Ok(response)
}
