//! PaddleOCR-VL engine driven through the `paddleocr doc_parser` CLI.
//!
//! Construction checks for a GPU and a working CLI; each extraction runs
//! the document parser on the staged file and reads back the JSON it saves.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use docscan_config::Settings;
use docscan_core::{EngineError, EngineFactory, OcrEngine};
use serde_json::Value;
use tracing::{error, info};

use crate::exec::run_command;
use crate::gpu::probe_gpus;
use crate::output::collect_json_results;

const ENGINE_NAME: &str = "paddleocr-vl";
const PIPELINE_SUBCOMMAND: &str = "doc_parser";
const VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(120);

/// How to invoke the PaddleOCR CLI.
#[derive(Debug, Clone)]
pub struct PaddleOcrVlConfig {
    /// CLI executable (e.g. `paddleocr` or an absolute venv path).
    pub command: String,
    /// Executable used to enumerate CUDA devices.
    pub gpu_probe_command: String,
    /// Passed as `--device`; must name a GPU.
    pub device: String,
    /// Upper bound on one extraction subprocess.
    pub timeout: Duration,
}

impl PaddleOcrVlConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            command: settings.engine_command.clone(),
            gpu_probe_command: settings.gpu_probe_command.clone(),
            device: settings.device.clone(),
            timeout: settings.engine_timeout(),
        }
    }

    /// Arguments for one `doc_parser` run.
    pub fn extract_args(&self, input: &Path, save_path: &Path) -> Vec<String> {
        vec![
            PIPELINE_SUBCOMMAND.to_string(),
            "-i".to_string(),
            input.display().to_string(),
            "--save_path".to_string(),
            save_path.display().to_string(),
            "--device".to_string(),
            self.device.clone(),
        ]
    }
}

/// Builds [`PaddleOcrVlEngine`] once a GPU and the CLI are confirmed.
pub struct PaddleOcrVlFactory {
    config: PaddleOcrVlConfig,
}

impl PaddleOcrVlFactory {
    pub fn new(config: PaddleOcrVlConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EngineFactory for PaddleOcrVlFactory {
    async fn construct(&self) -> Result<Arc<dyn OcrEngine>, EngineError> {
        if !self.config.device.to_ascii_lowercase().starts_with("gpu") {
            return Err(EngineError::GpuUnavailable(format!(
                "device '{}' requested; GPU execution is required",
                self.config.device
            )));
        }

        let devices = probe_gpus(&self.config.gpu_probe_command).await?;

        let version = run_command(&self.config.command, ["--version"], VERSION_CHECK_TIMEOUT)
            .await
            .map_err(|e| {
                EngineError::Construction(format!("cannot run '{}': {e}", self.config.command))
            })?;
        if !version.success() {
            return Err(EngineError::Construction(format!(
                "'{} --version' exited with code {}: {}",
                self.config.command,
                version.exit_code,
                version.stderr_tail()
            )));
        }

        info!(
            command = %self.config.command,
            version = %version.stdout.trim(),
            device = %self.config.device,
            gpus = devices.len(),
            "PaddleOCR-VL CLI available"
        );

        Ok(Arc::new(PaddleOcrVlEngine {
            config: self.config.clone(),
        }))
    }
}

/// Constructed engine. Stateless between calls; safe to share across requests.
pub struct PaddleOcrVlEngine {
    config: PaddleOcrVlConfig,
}

#[async_trait]
impl OcrEngine for PaddleOcrVlEngine {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    async fn extract(&self, path: &Path) -> Result<Vec<Value>, EngineError> {
        let save_dir = tempfile::Builder::new().prefix("docscan-result-").tempdir()?;
        let started = Instant::now();
        info!(path = %path.display(), "Running PaddleOCR-VL");

        let output = run_command(
            &self.config.command,
            self.config.extract_args(path, save_dir.path()),
            self.config.timeout,
        )
        .await?;

        if !output.success() {
            error!(
                exit_code = output.exit_code,
                stderr = %output.stderr_tail(),
                "PaddleOCR-VL exited with an error"
            );
            return Err(EngineError::Inference(format!(
                "{PIPELINE_SUBCOMMAND} exited with code {}",
                output.exit_code
            )));
        }

        let results = collect_json_results(save_dir.path()).await?;
        if results.is_empty() {
            return Err(EngineError::Output("engine saved no result files".into()));
        }

        info!(
            pages = results.len(),
            elapsed_secs = started.elapsed().as_secs_f64(),
            "PaddleOCR-VL finished"
        );
        Ok(results)
    }
}
