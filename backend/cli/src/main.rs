mod gpu_cmd;
mod status_cmd;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use docscan_config::Settings;
use docscan_engine::{probe_gpus, PaddleOcrVlConfig, PaddleOcrVlFactory};
use docscan_gateway::{start_server, GatewayState};

#[derive(Parser)]
#[command(name = "docscan")]
#[command(about = "docscan — document extraction over HTTP, backed by PaddleOCR-VL")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the extraction service
    Serve {
        /// Port to bind the HTTP server to (overrides APP_PORT)
        #[arg(short, long)]
        port: Option<u16>,
        /// Address to bind to (overrides APP_HOST)
        #[arg(long)]
        host: Option<String>,
    },
    /// Query the health endpoint of a running service
    Status {
        /// Base URL of the service, e.g. http://ocr-box:8000
        #[arg(long)]
        url: Option<String>,
    },
    /// Check that a GPU and the engine CLI are available
    CheckGpu,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (mut settings, report) = docscan_config::load();

    // One-shot commands print to the terminal; keep their log output quiet.
    let level = match cli.command {
        Commands::Serve { .. } => settings.effective_log_level().to_string(),
        _ if settings.debug => "debug".to_string(),
        _ => "warn".to_string(),
    };
    logging::init_logger(settings.log_format, &level, settings.log_dir.as_deref());
    docscan_config::log_report(&report);

    match cli.command {
        Commands::Serve { port, host } => {
            if !report.is_valid() {
                bail!(
                    "invalid configuration ({} error(s)); see the log for details",
                    report.errors.len()
                );
            }
            if let Some(port) = port {
                settings.port = port;
            }
            if let Some(host) = host {
                settings.host = host;
            }
            run_server(settings).await
        }
        Commands::Status { url } => status_cmd::run(&settings, url.as_deref()).await,
        Commands::CheckGpu => gpu_cmd::run(&settings).await,
    }
}

async fn run_server(settings: Settings) -> Result<()> {
    info!(
        service = %settings.app_name,
        version = %settings.app_version,
        "Starting docscan"
    );
    info!(
        max_upload_mb = %format!("{:.1}", settings.max_upload_mb()),
        max_concurrent_requests = settings.max_concurrent_requests,
        admission_policy = %settings.admission_policy,
        device = %settings.device,
        "Limits configured"
    );
    info!(
        url = %format!("http://{}{}", settings.bind_address(), settings.extract_path()),
        "Extraction endpoint"
    );

    let devices = probe_gpus(&settings.gpu_probe_command)
        .await
        .context("GPU preflight failed; docscan requires a CUDA-capable GPU")?;
    info!(gpus = devices.len(), "GPU preflight passed");
    info!("OCR pipeline will be initialized on the first extraction request");

    let factory = Arc::new(PaddleOcrVlFactory::new(PaddleOcrVlConfig::from_settings(
        &settings,
    )));
    let state = GatewayState::new(settings, factory);

    start_server(state).await?;

    info!("docscan shut down");
    Ok(())
}
