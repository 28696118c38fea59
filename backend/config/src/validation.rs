//! Settings validation: semantic checks with user-friendly messages.

use crate::settings::Settings;
use thiserror::Error;

/// A settings validation error with the offending variable and a message.
#[derive(Debug, Error)]
#[error("Invalid setting '{key}': {message}")]
pub struct ConfigValidationError {
    pub key: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn error(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            key: key.into(),
            message: message.into(),
        });
    }

    pub(crate) fn warn(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            key: key.into(),
            message: message.into(),
        });
    }

    /// Append another report's findings to this one.
    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Validate the settings and return a report of all errors and warnings.
pub fn validate(settings: &Settings) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(settings, &mut report);
    validate_limits(settings, &mut report);
    validate_engine(settings, &mut report);
    report
}

fn validate_server(settings: &Settings, report: &mut ValidationReport) {
    if settings.port < 1024 && settings.port != 80 && settings.port != 443 {
        report.warn(
            "APP_PORT",
            format!(
                "Port {} requires elevated privileges; consider using a port >= 1024",
                settings.port
            ),
        );
    }
    if !settings.api_v1_prefix.starts_with('/') {
        report.error("API_V1_PREFIX", "Prefix must start with '/'");
    }
}

fn validate_limits(settings: &Settings, report: &mut ValidationReport) {
    if settings.max_upload_bytes == 0 {
        report.error("MAX_UPLOAD_SIZE", "Upload limit must be > 0");
    }
    if settings.max_concurrent_requests == 0 {
        report.error("MAX_CONCURRENT_REQUESTS", "At least one concurrent request is required");
    }
    if settings.admission_timeout_secs == 0 {
        report.warn(
            "ADMISSION_TIMEOUT_SECS",
            "Requests will wait indefinitely for a free extraction slot",
        );
    }
}

/// GPU execution is mandatory; a CPU configuration is rejected outright.
fn validate_engine(settings: &Settings, report: &mut ValidationReport) {
    if !settings.use_gpu {
        report.error("USE_GPU", "GPU execution is required; CPU inference is not supported");
    }
    if !settings.device.to_ascii_lowercase().starts_with("gpu") {
        report.error(
            "DEVICE",
            format!("Device '{}' is not a GPU device (expected 'gpu' or 'gpu:N')", settings.device),
        );
    }
    if settings.engine_command.trim().is_empty() {
        report.error("ENGINE_COMMAND", "Engine command cannot be empty");
    }
}
