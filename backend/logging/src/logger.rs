//! Structured Logger
//!
//! Wraps `tracing` to provide JSON or text console output, optional NDJSON
//! file rotation, and environment-based level control.

use std::path::Path;

use docscan_config::LogFormat;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_PREFIX: &str = "docscan.log";

/// Targets that are chatty at info level and rarely useful.
const QUIET_TARGETS: &[&str] = &["hyper=warn", "h2=warn", "tower=warn", "tower_http=info"];

/// Filter directives for a base level, with noisy dependencies held back.
pub fn filter_directives(level: &str) -> String {
    let mut directives = vec![level.trim().to_ascii_lowercase()];
    directives.extend(QUIET_TARGETS.iter().map(|d| d.to_string()));
    directives.join(",")
}

/// Initialize the global structured logger.
///
/// `RUST_LOG` overrides `level` when set. When `log_dir` is given, a second
/// JSON layer writes to `docscan.log.YYYY-MM-DD` inside it.
pub fn init_logger(format: LogFormat, level: &str, log_dir: Option<&Path>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(level)));

    let console_layer = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stdout)
            .with_current_span(true)
            .boxed(),
        LogFormat::Text => fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(true)
            .with_ansi(false)
            .boxed(),
    };

    let file_layer = log_dir.map(|dir| {
        let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
        fmt::layer()
            .json()
            .with_writer(file_appender)
            .with_ansi(false)
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    tracing::info!(level, %format, "Logging configured");
}
