//! Lazily constructed OCR pipeline.
//!
//! The engine is expensive to build (model weights, GPU context), so it is
//! constructed on the first extraction rather than at startup. Construction is
//! serialized through an async mutex; everyone else reads the published handle
//! or the published failure without taking the lock.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::error::PipelineError;
use crate::traits::{EngineFactory, OcrEngine};

const UNINITIALIZED: u8 = 0;
const INITIALIZING: u8 = 1;
const READY: u8 = 2;
const FAILED: u8 = 3;

/// Observable lifecycle state of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

impl PipelineStatus {
    fn from_raw(raw: u8) -> Self {
        match raw {
            INITIALIZING => Self::Initializing,
            READY => Self::Ready,
            FAILED => Self::Failed,
            _ => Self::Uninitialized,
        }
    }
}

/// Owner of the single engine instance for this process.
///
/// `Ready` and `Failed` are terminal: a failed construction is not retried,
/// and every later caller receives the same error.
pub struct PipelineHandle {
    factory: Arc<dyn EngineFactory>,
    state: AtomicU8,
    engine: OnceLock<Arc<dyn OcrEngine>>,
    failure: OnceLock<PipelineError>,
    init_lock: Mutex<()>,
}

impl PipelineHandle {
    pub fn new(factory: Arc<dyn EngineFactory>) -> Self {
        Self {
            factory,
            state: AtomicU8::new(UNINITIALIZED),
            engine: OnceLock::new(),
            failure: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    /// Current state. Never blocks and never starts construction.
    pub fn status(&self) -> PipelineStatus {
        PipelineStatus::from_raw(self.state.load(Ordering::Acquire))
    }

    pub fn is_ready(&self) -> bool {
        self.status() == PipelineStatus::Ready
    }

    /// Return the ready engine, constructing it on first use.
    pub async fn get_or_init(&self) -> Result<Arc<dyn OcrEngine>, PipelineError> {
        if let Some(engine) = self.published()? {
            return Ok(engine);
        }

        let _guard = self.init_lock.lock().await;

        // Another caller may have finished while we waited for the lock.
        if let Some(engine) = self.published()? {
            return Ok(engine);
        }

        let reset = ResetOnCancel(&self.state);
        self.state.store(INITIALIZING, Ordering::Release);
        info!("Initializing OCR pipeline");
        let started = Instant::now();

        let outcome = self.factory.construct().await;
        std::mem::forget(reset);

        match outcome {
            Ok(engine) => {
                let engine = Arc::clone(self.engine.get_or_init(|| engine));
                self.state.store(READY, Ordering::Release);
                info!(
                    engine = engine.name(),
                    elapsed_secs = started.elapsed().as_secs_f64(),
                    "OCR pipeline initialized"
                );
                Ok(engine)
            }
            Err(err) => {
                let err = PipelineError::from(err);
                error!(error = %err, "Failed to initialize OCR pipeline");
                let err = self.failure.get_or_init(|| err).clone();
                self.state.store(FAILED, Ordering::Release);
                Err(err)
            }
        }
    }

    fn published(&self) -> Result<Option<Arc<dyn OcrEngine>>, PipelineError> {
        if let Some(engine) = self.engine.get() {
            return Ok(Some(Arc::clone(engine)));
        }
        if let Some(err) = self.failure.get() {
            return Err(err.clone());
        }
        Ok(None)
    }
}

impl fmt::Debug for PipelineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineHandle")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

/// Puts the state back to `Uninitialized` if the constructing future is dropped
/// mid-flight, so the next caller starts over instead of seeing `Initializing`
/// forever.
struct ResetOnCancel<'a>(&'a AtomicU8);

impl Drop for ResetOnCancel<'_> {
    fn drop(&mut self) {
        let _ = self.0.compare_exchange(
            INITIALIZING,
            UNINITIALIZED,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}
