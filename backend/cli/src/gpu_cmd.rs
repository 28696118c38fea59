//! CLI GPU Check Command
//!
//! Runs the same probes as server startup and engine construction, without
//! starting anything.

use std::time::Duration;

use anyhow::{bail, Result};
use docscan_config::Settings;
use docscan_engine::exec::run_command;
use docscan_engine::probe_gpus;

const VERSION_TIMEOUT: Duration = Duration::from_secs(120);

pub async fn run(settings: &Settings) -> Result<()> {
    println!("\n🔍 Checking GPU prerequisites (device '{}')...\n", settings.device);

    let gpus_ok = check_gpus(settings).await;
    let engine_ok = check_engine(settings).await;

    println!();
    if gpus_ok && engine_ok {
        println!("✅ GPU and engine CLI are available.");
        Ok(())
    } else {
        println!("❌ Some checks failed! Please fix the errors above.");
        bail!("GPU prerequisites not met")
    }
}

async fn check_gpus(settings: &Settings) -> bool {
    println!("GPU devices ({}):", settings.gpu_probe_command);
    match probe_gpus(&settings.gpu_probe_command).await {
        Ok(devices) => {
            for device in &devices {
                println!("  🟢 GPU {}: {}", device.index, device.name);
            }
            true
        }
        Err(e) => {
            println!("  🔴 {e}");
            false
        }
    }
}

async fn check_engine(settings: &Settings) -> bool {
    println!("Engine CLI ({}):", settings.engine_command);
    match run_command(&settings.engine_command, ["--version"], VERSION_TIMEOUT).await {
        Ok(out) if out.success() => {
            println!("  🟢 {}", out.stdout.trim());
            true
        }
        Ok(out) => {
            println!("  🔴 exited with code {}: {}", out.exit_code, out.stderr_tail());
            false
        }
        Err(e) => {
            println!("  🔴 cannot run: {e}");
            false
        }
    }
}
