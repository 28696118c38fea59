//! `docscan-config` — runtime settings for the docscan service.
//!
//! Provides:
//! - [`Settings`], loaded once from environment variables
//! - Default values for every variable
//! - Semantic validation with errors and warnings

pub mod defaults;
pub mod settings;
pub mod validation;

pub use settings::{LogFormat, Settings};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use std::collections::HashMap;

/// Load settings from the process environment and validate them.
///
/// This is the main entry point at startup. Nothing is logged here because
/// the logger is configured from the returned settings; call [`log_report`]
/// once it is up.
pub fn load() -> (Settings, ValidationReport) {
    load_with(&std::env::vars().collect())
}

/// Same as [`load`] with an explicit variable map.
pub fn load_with(env: &HashMap<String, String>) -> (Settings, ValidationReport) {
    let mut report = ValidationReport::default();
    let settings = Settings::parse(env, &mut report);
    report.merge(validate(&settings));
    (settings, report)
}

/// Emit every finding of a report through `tracing`.
pub fn log_report(report: &ValidationReport) {
    for warning in &report.warnings {
        tracing::warn!(key = %warning.key, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(key = %error.key, message = %error.message, "Config error");
    }
}
