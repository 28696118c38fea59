use std::time::Duration;

use thiserror::Error;

/// Failure reported by an OCR engine implementation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("GPU not available: {0}")]
    GpuUnavailable(String),

    #[error("engine construction failed: {0}")]
    Construction(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("inference timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed engine output: {0}")]
    Output(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure to obtain a ready pipeline.
///
/// Cloneable so the first construction failure can be handed to every later caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("GPU not available: {0}")]
    GpuUnavailable(String),

    #[error("pipeline initialization failed: {0}")]
    InitFailed(String),
}

impl From<EngineError> for PipelineError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::GpuUnavailable(reason) => PipelineError::GpuUnavailable(reason),
            other => PipelineError::InitFailed(other.to_string()),
        }
    }
}

/// Failure to enter the admission gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("all {limit} extraction slots are busy")]
    Saturated { limit: usize },

    #[error("timed out after {waited:?} waiting for an extraction slot")]
    TimedOut { waited: Duration },

    #[error("admission gate closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_failure_keeps_its_kind() {
        let err = PipelineError::from(EngineError::GpuUnavailable("no devices".into()));
        assert_eq!(err, PipelineError::GpuUnavailable("no devices".into()));
    }

    #[test]
    fn other_engine_failures_become_init_failed() {
        let err = PipelineError::from(EngineError::Construction("paddleocr missing".into()));
        match err {
            PipelineError::InitFailed(msg) => assert!(msg.contains("paddleocr missing")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
