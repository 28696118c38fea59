use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::pipeline::PipelineStatus;

/// Success envelope for `POST /api/v1/ocr/extract-document`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResponse {
    pub success: bool,
    pub message: String,
    /// Wall-clock seconds from request receipt to response assembly.
    pub processing_time: f64,
    /// Engine output, passed through untouched apart from path scrubbing.
    pub results: Vec<Value>,
    pub timestamp: DateTime<Utc>,
}

impl ExtractionResponse {
    pub fn new(results: Vec<Value>, elapsed: Duration) -> Self {
        Self {
            success: true,
            message: format!(
                "Document processed successfully. Found {} results.",
                results.len()
            ),
            processing_time: elapsed.as_secs_f64(),
            results,
            timestamp: Utc::now(),
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub service: String,
    pub version: String,
    pub pipeline_ready: bool,
    pub timestamp: DateTime<Utc>,
}

impl HealthReport {
    /// A failed pipeline makes the service unhealthy; an uninitialized one does not,
    /// since construction is deferred to the first extraction.
    pub fn new(service: &str, version: &str, pipeline: PipelineStatus) -> Self {
        let status = match pipeline {
            PipelineStatus::Failed => "unhealthy",
            _ => "healthy",
        };
        Self {
            status: status.to_string(),
            service: service.to_string(),
            version: version.to_string(),
            pipeline_ready: pipeline == PipelineStatus::Ready,
            timestamp: Utc::now(),
        }
    }
}

/// Uniform error envelope returned for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    pub error_type: String,
    /// Correlates a server-side failure with its log entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>, error_type: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error_type: error_type.into(),
            request_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = Some(request_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extraction_message_counts_results() {
        let resp = ExtractionResponse::new(vec![json!({}), json!({})], Duration::from_millis(1500));
        assert!(resp.success);
        assert_eq!(resp.message, "Document processed successfully. Found 2 results.");
        assert!((resp.processing_time - 1.5).abs() < 1e-9);
    }

    #[test]
    fn health_reflects_pipeline_state() {
        let idle = HealthReport::new("svc", "1.0.0", PipelineStatus::Uninitialized);
        assert_eq!(idle.status, "healthy");
        assert!(!idle.pipeline_ready);

        let ready = HealthReport::new("svc", "1.0.0", PipelineStatus::Ready);
        assert!(ready.pipeline_ready);

        let failed = HealthReport::new("svc", "1.0.0", PipelineStatus::Failed);
        assert_eq!(failed.status, "unhealthy");
        assert!(!failed.pipeline_ready);
    }

    #[test]
    fn error_body_omits_missing_request_id() {
        let body = serde_json::to_value(ErrorBody::new("Empty file uploaded", "empty_file")).unwrap();
        assert_eq!(body["success"], json!(false));
        assert!(body.get("request_id").is_none());
    }
}
