//! CUDA device discovery.
//!
//! The service refuses to run without a GPU, so both startup and pipeline
//! construction go through [`probe_gpus`]. Devices are enumerated with
//! `nvidia-smi -L`, whose lines look like
//! `GPU 0: NVIDIA A10G (UUID: GPU-5a1c...)`.

use std::io::ErrorKind;
use std::time::Duration;

use docscan_core::EngineError;
use tracing::{debug, info};

use crate::exec::run_command;

const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// One CUDA device reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuDevice {
    pub index: u32,
    pub name: String,
}

/// Parse `nvidia-smi -L` output. Lines that are not device entries (MIG
/// sub-devices, warnings) are skipped.
pub fn parse_device_list(stdout: &str) -> Vec<GpuDevice> {
    stdout
        .lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix("GPU ")?;
            let (index, rest) = rest.split_once(':')?;
            let index = index.trim().parse().ok()?;
            let name = rest
                .split_once("(UUID")
                .map_or(rest, |(name, _)| name)
                .trim()
                .to_string();
            Some(GpuDevice { index, name })
        })
        .collect()
}

/// Enumerate CUDA devices with `command -L`.
///
/// Every failure mode (tool missing, driver error, zero devices) maps to
/// [`EngineError::GpuUnavailable`].
pub async fn probe_gpus(command: &str) -> Result<Vec<GpuDevice>, EngineError> {
    let output = match run_command(command, ["-L"], PROBE_TIMEOUT).await {
        Ok(output) => output,
        Err(EngineError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            return Err(EngineError::GpuUnavailable(format!(
                "'{command}' not found; NVIDIA driver is not installed"
            )));
        }
        Err(e) => return Err(EngineError::GpuUnavailable(e.to_string())),
    };

    if !output.success() {
        return Err(EngineError::GpuUnavailable(format!(
            "'{command} -L' exited with code {}: {}",
            output.exit_code,
            output.stderr_tail()
        )));
    }

    let devices = parse_device_list(&output.stdout);
    debug!(raw = %output.stdout.trim(), "GPU probe output");
    if devices.is_empty() {
        return Err(EngineError::GpuUnavailable("no CUDA devices detected".into()));
    }

    info!(
        count = devices.len(),
        devices = ?devices.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
        "GPU detected"
    );
    Ok(devices)
}
