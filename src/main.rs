//! journey-export server entry point.

use journey_export::{Config, JourneyExporter};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "journey_export=info,tower_http=info";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    match start().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "journey-export stopped with an error");
            ExitCode::FAILURE
        }
    }
}

async fn start() -> journey_export::Result<()> {
    let config = Arc::new(Config::from_env()?);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        upstream = %config.upstream.base_url,
        report = %config.upstream.report_name,
        integrity_digest = config.relay.integrity_digest,
        "Starting journey-export"
    );

    let exporter = Arc::new(JourneyExporter::new(config)?);
    journey_export::run(exporter).await
}
