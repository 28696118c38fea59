//! Client-facing error taxonomy.
//!
//! Every failure leaving the gateway is one of these variants, rendered as an
//! [`ErrorBody`] envelope. Underlying causes are logged where they happen and
//! never copied into the response.

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use docscan_core::{AdmissionError, ErrorBody, PipelineError};
use thiserror::Error;
use uuid::Uuid;

/// Seconds a client is told to back off when no extraction slot is free.
pub const RETRY_AFTER_SECS: u64 = 5;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid file format '{extension}'. Allowed: {allowed}")]
    InvalidFormat { extension: String, allowed: String },

    #[error("File too large. Maximum size: {}", size_label(.max_bytes))]
    FileTooLarge { max_bytes: u64 },

    #[error("Empty file uploaded")]
    EmptyFile,

    #[error("No file uploaded. Send the document in the multipart field 'file'")]
    MissingFile,

    #[error("Malformed multipart request: {0}")]
    BadMultipart(String),

    #[error("Server busy. Retry in {retry_after_secs} seconds")]
    Busy { retry_after_secs: u64 },

    #[error("OCR pipeline is unavailable")]
    PipelineUnavailable,

    #[error("Processing error. The document could not be processed")]
    Processing { request_id: Uuid },

    #[error("Internal server error")]
    Internal { request_id: Uuid },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidFormat { .. }
            | Self::EmptyFile
            | Self::MissingFile
            | Self::BadMultipart(_) => StatusCode::BAD_REQUEST,
            Self::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Busy { .. } | Self::PipelineUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Processing { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable class, the `error_type` field of the envelope.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidFormat { .. } => "invalid_format",
            Self::FileTooLarge { .. } => "file_too_large",
            Self::EmptyFile => "empty_file",
            Self::MissingFile => "missing_file",
            Self::BadMultipart(_) => "bad_request",
            Self::Busy { .. } => "server_busy",
            Self::PipelineUnavailable => "pipeline_unavailable",
            Self::Processing { .. } => "processing_error",
            Self::Internal { .. } => "internal_error",
        }
    }

    /// Whether the client sent something unacceptable.
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }

    /// Map a multipart read failure, treating axum's body-limit rejection as oversize.
    pub fn from_multipart(err: MultipartError, max_bytes: u64) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::FileTooLarge { max_bytes }
        } else {
            Self::BadMultipart(err.body_text())
        }
    }
}

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;

/// `50.0MB` style, dropping to KB or bytes where one decimal of MB would read `0.0MB`.
fn size_label(bytes: &u64) -> String {
    let bytes = *bytes;
    if bytes as f64 / MIB as f64 >= 0.05 {
        format!("{:.1}MB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1}KB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} bytes")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = ErrorBody::new(self.to_string(), self.error_type());
        if let Self::Processing { request_id } | Self::Internal { request_id } = &self {
            body = body.with_request_id(*request_id);
        }

        let mut response = (self.status(), Json(body)).into_response();
        if let Self::Busy { retry_after_secs } = self {
            response.headers_mut().insert(
                header::RETRY_AFTER,
                HeaderValue::from(retry_after_secs),
            );
        }
        response
    }
}

impl From<AdmissionError> for ApiError {
    fn from(_: AdmissionError) -> Self {
        Self::Busy {
            retry_after_secs: RETRY_AFTER_SECS,
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(_: PipelineError) -> Self {
        Self::PipelineUnavailable
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::BadMultipart(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn too_large_message_uses_megabytes() {
        let err = ApiError::FileTooLarge {
            max_bytes: 50 * 1024 * 1024,
        };
        assert_eq!(err.to_string(), "File too large. Maximum size: 50.0MB");
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(err.is_client_error());
    }

    #[test]
    fn small_limits_are_not_shown_as_zero_megabytes() {
        assert_eq!(size_label(&1024), "1.0KB");
        assert_eq!(size_label(&51_200), "50.0KB");
        assert_eq!(size_label(&512), "512 bytes");
        assert_eq!(size_label(&(MIB / 10)), "0.1MB");
        assert_eq!(
            ApiError::FileTooLarge { max_bytes: 1024 }.to_string(),
            "File too large. Maximum size: 1.0KB"
        );
    }

    #[test]
    fn admission_failures_are_busy() {
        for cause in [
            AdmissionError::Saturated { limit: 3 },
            AdmissionError::TimedOut {
                waited: Duration::from_secs(300),
            },
        ] {
            let err = ApiError::from(cause);
            assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
            assert_eq!(err.error_type(), "server_busy");
        }
    }

    #[test]
    fn busy_response_carries_retry_after() {
        let response = ApiError::Busy {
            retry_after_secs: 7,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "7");
    }

    #[test]
    fn pipeline_detail_is_not_exposed() {
        let err = ApiError::from(PipelineError::InitFailed(
            "cannot run '/opt/venv/bin/paddleocr'".into(),
        ));
        assert!(!err.to_string().contains("/opt/venv"));
    }
}
