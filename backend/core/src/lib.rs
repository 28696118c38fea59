//! `docscan-core` — shared building blocks of the docscan OCR service.
//!
//! Provides:
//! - Engine traits ([`OcrEngine`], [`EngineFactory`]) that hide the external model
//! - [`PipelineHandle`], the lazily constructed, process-wide engine owner
//! - [`AdmissionGate`], the bound on concurrent extractions
//! - Response envelopes shared by the HTTP layer

pub mod admission;
pub mod error;
pub mod pipeline;
pub mod traits;
pub mod types;

pub use admission::{AdmissionGate, AdmissionPermit, AdmissionPolicy};
pub use error::{AdmissionError, EngineError, PipelineError};
pub use pipeline::{PipelineHandle, PipelineStatus};
pub use traits::{EngineFactory, OcrEngine};
pub use types::{ErrorBody, ExtractionResponse, HealthReport};
