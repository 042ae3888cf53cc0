//! # journey-export
//!
//! HTTP relay that hands out the fleet platform's daily journey export.
//!
//! A caller sends platform credentials to `GET /api/journey-export`. The
//! service logs in upstream, looks for an export job covering yesterday,
//! triggers one when none exists, waits for it to finish and streams the
//! resulting file back.
//!
//! ## Quick Start
//!
//! ```no_run
//! use journey_export::{Config, JourneyExporter};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(Config::from_env()?);
//!     let exporter = Arc::new(JourneyExporter::new(config)?);
//!
//!     // Serve until SIGTERM / Ctrl+C
//!     journey_export::run(exporter).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Resolve-then-relay facade
pub mod exporter;
/// Export job matching
pub mod matcher;
/// Completion polling
pub mod poller;
/// Export file download
pub mod relay;
/// Existing-or-trigger job resolution
pub mod resolver;
/// Core domain types
pub mod types;
/// Fleet platform client
pub mod upstream;
/// Date window computation
pub mod window;

// unwrap/expect are acceptable in test doubles
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use config::{Config, PollConfig, RelayConfig, ServerConfig, UpstreamConfig};
pub use error::{ApiError, Error, Result, ToHttpStatus};
pub use exporter::JourneyExporter;
pub use resolver::{Resolution, ResolutionPath, Resolver};
pub use types::{Credentials, DateWindow, Job, JobState, Session};
pub use upstream::{ExportPlatform, PlatformClient};

/// Serve the API until a termination signal arrives.
///
/// On the signal the shutdown token is cancelled: the listener stops
/// accepting, polls in progress are abandoned and the server drains.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn run(exporter: Arc<JourneyExporter>) -> Result<()> {
    let shutdown = CancellationToken::new();

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        signal_token.cancel();
    });

    api::start_api_server(exporter, shutdown).await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM signal"),
                _ = sigint.recv() => tracing::info!("Received SIGINT signal (Ctrl+C)"),
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
