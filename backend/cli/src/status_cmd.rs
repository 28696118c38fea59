//! CLI Status Command
//!
//! Queries `/health` of a running service and prints the report.

use std::time::Duration;

use anyhow::{bail, Result};
use docscan_config::Settings;
use serde_json::Value;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Health URL from an explicit base URL, or from the bind settings.
pub fn health_url(settings: &Settings, base: Option<&str>) -> String {
    if let Some(base) = base {
        return format!("{}/health", base.trim_end_matches('/'));
    }
    let host = match settings.host.as_str() {
        "0.0.0.0" | "::" | "[::]" => "127.0.0.1",
        host => host,
    };
    format!("http://{host}:{}/health", settings.port)
}

pub async fn run(settings: &Settings, base: Option<&str>) -> Result<()> {
    let url = health_url(settings, base);
    println!("\n📊 {} status ({url})\n", settings.app_name);

    let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
    let body: Value = match client.get(&url).send().await {
        Ok(resp) => resp.json().await?,
        Err(e) => {
            println!("🔴 Service is not reachable: {e}");
            bail!("service at {url} is not running");
        }
    };

    println!("{}", serde_json::to_string_pretty(&body)?);

    match body["status"].as_str() {
        Some("healthy") => {
            let pipeline = if body["pipeline_ready"] == true {
                "ready"
            } else {
                "not initialized yet"
            };
            println!("\n✅ Healthy. OCR pipeline {pipeline}.");
            Ok(())
        }
        _ => {
            println!("\n❌ Service reports unhealthy.");
            bail!("service at {url} is unhealthy")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_bind_maps_to_loopback() {
        let settings = Settings::default();
        assert_eq!(health_url(&settings, None), "http://127.0.0.1:8000/health");
    }

    #[test]
    fn explicit_base_wins() {
        let settings = Settings::default();
        assert_eq!(
            health_url(&settings, Some("http://ocr-box:9000/")),
            "http://ocr-box:9000/health"
        );
    }
}
