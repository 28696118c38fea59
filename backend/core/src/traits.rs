use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::EngineError;

/// A constructed OCR engine, ready to run inference.
///
/// The output is the engine's raw per-page records. Their shape belongs to the
/// engine and changes with its version, so it stays an untyped [`Value`] here.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Short identifier used in logs (e.g., "paddleocr-vl").
    fn name(&self) -> &str;

    /// Run document extraction on a file already staged on disk.
    async fn extract(&self, path: &Path) -> Result<Vec<Value>, EngineError>;
}

/// Builds the engine. Called at most once per process by [`crate::PipelineHandle`].
#[async_trait]
pub trait EngineFactory: Send + Sync {
    /// Construct the engine. Must return [`EngineError::GpuUnavailable`] rather
    /// than fall back to CPU execution.
    async fn construct(&self) -> Result<Arc<dyn OcrEngine>, EngineError>;
}
