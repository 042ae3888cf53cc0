//! HTTP API server module
//!
//! Exposes the journey export download plus health and OpenAPI endpoints.

use crate::{JourneyExporter, Result};
use axum::{Router, routing::get};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// - `GET /api/journey-export` - Resolve and download yesterday's journey export
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
///
/// Any other path answers 404 with the standard JSON error body.
pub fn create_router(exporter: Arc<JourneyExporter>, shutdown: CancellationToken) -> Router {
    let cors_enabled = exporter.config().server.cors_enabled;
    let state = AppState::new(exporter, shutdown);

    let router = Router::new()
        .route("/api/journey-export", get(routes::journey_export))
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        .fallback(routes::not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_enabled {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    }
}

/// Start the API server on the configured bind address.
///
/// Runs until `shutdown` is cancelled, then stops accepting connections and
/// waits for in-flight requests. Cancelling `shutdown` also cancels every
/// request's token, so polls in progress end promptly.
///
/// # Example
///
/// ```no_run
/// use journey_export::{Config, JourneyExporter};
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::from_env()?);
/// let exporter = Arc::new(JourneyExporter::new(config)?);
///
/// // Serve until the token is cancelled
/// journey_export::api::start_api_server(exporter, CancellationToken::new()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(
    exporter: Arc<JourneyExporter>,
    shutdown: CancellationToken,
) -> Result<()> {
    let bind_address = exporter.config().server.bind_address();

    tracing::info!(
        address = %bind_address,
        "Starting API server"
    );

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    serve(listener, exporter, shutdown).await
}

/// Serve the API on an already bound listener until `shutdown` is cancelled
pub async fn serve(
    listener: TcpListener,
    exporter: Arc<JourneyExporter>,
    shutdown: CancellationToken,
) -> Result<()> {
    let address = listener.local_addr().map_err(crate::error::Error::Io)?;
    let app = create_router(exporter, shutdown.clone());

    tracing::info!(
        address = %address,
        "API server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(cancelled(shutdown))
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

fn cancelled(token: CancellationToken) -> impl Future<Output = ()> + Send + 'static {
    async move { token.cancelled().await }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
