//! Application state for the API server

use crate::JourneyExporter;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone) and provides
/// access to the exporter and the server-wide shutdown token.
#[derive(Clone)]
pub struct AppState {
    /// The export service
    pub exporter: Arc<JourneyExporter>,

    /// Cancelled when the server shuts down; requests derive child tokens from it
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Create a new AppState
    pub fn new(exporter: Arc<JourneyExporter>, shutdown: CancellationToken) -> Self {
        Self { exporter, shutdown }
    }
}
