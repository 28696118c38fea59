//! Structured logging for docscan.
//!
//! Console output in JSON or text, optional daily-rotated NDJSON files.

pub mod logger;

pub use logger::{filter_directives, init_logger};
