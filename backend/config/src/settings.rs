//! Process-wide settings, read once from the environment at startup.
//!
//! Every variable is optional. Values that fail to parse are replaced by
//! their default and reported as warnings rather than aborting startup;
//! semantic checks (zero limits, CPU device, ...) live in [`crate::validation`].

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use docscan_core::AdmissionPolicy;
use serde::{Deserialize, Serialize};

use crate::defaults::*;
use crate::validation::ValidationReport;

/// Console log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "plain" | "pretty" => Ok(Self::Text),
            other => Err(format!("unknown log format '{other}' (expected 'json' or 'text')")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Text => f.write_str("text"),
        }
    }
}

/// docscan runtime settings. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Service name reported by `/health`
    pub app_name: String,
    /// Service version reported by `/health`
    pub app_version: String,
    /// HTTP bind address
    pub host: String,
    /// HTTP port
    pub port: u16,
    /// Forces debug logging
    pub debug: bool,
    /// Prefix for versioned API routes
    pub api_v1_prefix: String,

    /// Largest accepted upload, in bytes
    pub max_upload_bytes: u64,
    /// Extractions allowed to run at once
    pub max_concurrent_requests: usize,
    pub admission_policy: AdmissionPolicy,
    /// 0 waits indefinitely
    pub admission_timeout_secs: u64,

    /// Executable of the OCR engine CLI
    pub engine_command: String,
    /// Executable used to enumerate CUDA devices
    pub gpu_probe_command: String,
    pub engine_timeout_secs: u64,
    pub use_gpu: bool,
    /// Engine device string, e.g. `gpu` or `gpu:0`
    pub device: String,
    /// Where uploads are staged; system temp dir when unset
    pub upload_tmp_dir: Option<PathBuf>,

    pub log_level: String,
    pub log_format: LogFormat,
    /// Optional directory for rotated NDJSON log files
    pub log_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            app_version: DEFAULT_APP_VERSION.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            debug: false,
            api_v1_prefix: DEFAULT_API_V1_PREFIX.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            admission_policy: AdmissionPolicy::default(),
            admission_timeout_secs: DEFAULT_ADMISSION_TIMEOUT_SECS,
            engine_command: DEFAULT_ENGINE_COMMAND.to_string(),
            gpu_probe_command: DEFAULT_GPU_PROBE_COMMAND.to_string(),
            engine_timeout_secs: DEFAULT_ENGINE_TIMEOUT_SECS,
            use_gpu: true,
            device: DEFAULT_DEVICE.to_string(),
            upload_tmp_dir: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: LogFormat::default(),
            log_dir: None,
        }
    }
}

impl Settings {
    /// Parse settings from a variable map, recording every fallback to a
    /// default in `report`. Use [`crate::load`] to read the process environment.
    pub(crate) fn parse(env: &HashMap<String, String>, report: &mut ValidationReport) -> Self {
        let defaults = Self::default();
        let lookup = |key: &str| {
            env.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Self {
            app_name: lookup("APP_NAME").unwrap_or(defaults.app_name),
            app_version: lookup("APP_VERSION").unwrap_or(defaults.app_version),
            host: lookup("APP_HOST").unwrap_or(defaults.host),
            port: parse_or(env, report, "APP_PORT", defaults.port),
            debug: parse_bool_or(env, report, "DEBUG", defaults.debug),
            api_v1_prefix: lookup("API_V1_PREFIX").unwrap_or(defaults.api_v1_prefix),
            max_upload_bytes: parse_or(
                env,
                report,
                "MAX_UPLOAD_SIZE",
                defaults.max_upload_bytes,
            ),
            max_concurrent_requests: parse_or(
                env,
                report,
                "MAX_CONCURRENT_REQUESTS",
                defaults.max_concurrent_requests,
            ),
            admission_policy: parse_or(
                env,
                report,
                "ADMISSION_POLICY",
                defaults.admission_policy,
            ),
            admission_timeout_secs: parse_or(
                env,
                report,
                "ADMISSION_TIMEOUT_SECS",
                defaults.admission_timeout_secs,
            ),
            engine_command: lookup("ENGINE_COMMAND").unwrap_or(defaults.engine_command),
            gpu_probe_command: lookup("GPU_PROBE_COMMAND").unwrap_or(defaults.gpu_probe_command),
            engine_timeout_secs: parse_or(
                env,
                report,
                "ENGINE_TIMEOUT_SECS",
                defaults.engine_timeout_secs,
            ),
            use_gpu: parse_bool_or(env, report, "USE_GPU", defaults.use_gpu),
            device: lookup("DEVICE").unwrap_or(defaults.device),
            upload_tmp_dir: lookup("UPLOAD_TMP_DIR").map(PathBuf::from),
            log_level: lookup("LOG_LEVEL")
                .map(|l| l.to_ascii_lowercase())
                .unwrap_or(defaults.log_level),
            log_format: parse_or(env, report, "LOG_FORMAT", defaults.log_format),
            log_dir: lookup("LOG_DIR").map(PathBuf::from),
        }
    }

    /// `None` means wait for a slot indefinitely.
    pub fn admission_timeout(&self) -> Option<Duration> {
        (self.admission_timeout_secs > 0).then(|| Duration::from_secs(self.admission_timeout_secs))
    }

    pub fn engine_timeout(&self) -> Duration {
        Duration::from_secs(self.engine_timeout_secs.max(1))
    }

    /// `debug` wins over `log_level`.
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.log_level
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Full path of the extraction route, e.g. `/api/v1/ocr/extract-document`.
    pub fn extract_path(&self) -> String {
        format!("{}/ocr/extract-document", self.api_v1_prefix.trim_end_matches('/'))
    }

    pub fn max_upload_mb(&self) -> f64 {
        self.max_upload_bytes as f64 / (1024.0 * 1024.0)
    }
}

fn parse_or<T>(
    env: &HashMap<String, String>,
    report: &mut ValidationReport,
    key: &str,
    default: T,
) -> T
where
    T: FromStr + fmt::Debug,
    T::Err: fmt::Display,
{
    match env.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|err| {
            report.warn(key, format!("Invalid value '{raw}' ({err}); using default {default:?}"));
            default
        }),
    }
}

fn parse_bool_or(
    env: &HashMap<String, String>,
    report: &mut ValidationReport,
    key: &str,
    default: bool,
) -> bool {
    match env.get(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => default,
        Some(raw) => match raw.as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            "" => default,
            _ => {
                report.warn(key, format!("Invalid boolean '{raw}'; using default {default}"));
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn parse_clean(pairs: &[(&str, &str)]) -> Settings {
        let mut report = ValidationReport::default();
        let settings = Settings::parse(&env(pairs), &mut report);
        assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);
        settings
    }

    #[test]
    fn empty_env_yields_defaults() {
        let settings = parse_clean(&[]);
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.max_upload_bytes, 50 * 1024 * 1024);
        assert_eq!(settings.max_concurrent_requests, 3);
        assert_eq!(settings.port, 8000);
        assert_eq!(settings.app_version, "1.0.0");
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    fn reads_overrides() {
        let settings = parse_clean(&[
            ("APP_PORT", "9100"),
            ("MAX_UPLOAD_SIZE", "1048576"),
            ("MAX_CONCURRENT_REQUESTS", "5"),
            ("ADMISSION_POLICY", "reject"),
            ("LOG_FORMAT", "text"),
            ("LOG_LEVEL", "WARN"),
            ("UPLOAD_TMP_DIR", "/var/tmp/docscan"),
        ]);
        assert_eq!(settings.port, 9100);
        assert_eq!(settings.max_upload_bytes, 1_048_576);
        assert_eq!(settings.max_concurrent_requests, 5);
        assert_eq!(settings.admission_policy, AdmissionPolicy::Reject);
        assert_eq!(settings.log_format, LogFormat::Text);
        assert_eq!(settings.log_level, "warn");
        assert_eq!(settings.upload_tmp_dir, Some(PathBuf::from("/var/tmp/docscan")));
    }

    #[test]
    fn unparseable_values_fall_back_with_warnings() {
        let mut report = ValidationReport::default();
        let settings = Settings::parse(
            &env(&[("APP_PORT", "eighty"), ("LOG_FORMAT", "xml"), ("DEBUG", "maybe")]),
            &mut report,
        );
        assert_eq!(settings.port, DEFAULT_PORT);
        assert_eq!(settings.log_format, LogFormat::Json);
        assert!(!settings.debug);

        let keys: Vec<_> = report.warnings.iter().map(|w| w.key.as_str()).collect();
        assert_eq!(keys, ["APP_PORT", "DEBUG", "LOG_FORMAT"]);
        assert!(report.is_valid());
    }

    #[test]
    fn debug_forces_debug_level() {
        let settings = parse_clean(&[("DEBUG", "true"), ("LOG_LEVEL", "error")]);
        assert_eq!(settings.effective_log_level(), "debug");
    }

    #[test]
    fn zero_admission_timeout_means_unbounded() {
        let mut settings = Settings::default();
        assert_eq!(settings.admission_timeout(), Some(Duration::from_secs(300)));
        settings.admission_timeout_secs = 0;
        assert_eq!(settings.admission_timeout(), None);
    }

    #[test]
    fn extract_path_joins_prefix() {
        let mut settings = Settings::default();
        assert_eq!(settings.extract_path(), "/api/v1/ocr/extract-document");
        settings.api_v1_prefix = "/api/v2/".into();
        assert_eq!(settings.extract_path(), "/api/v2/ocr/extract-document");
    }
}
