//! Access to the fleet platform's REST API
//!
//! The resolution workflow only talks to the platform through the
//! [`ExportPlatform`] trait. [`PlatformClient`] is the HTTP implementation;
//! tests substitute scripted doubles.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Credentials, DateWindow, Job, JobState, Session};

mod client;
mod wire;

pub use client::PlatformClient;

/// What the platform told us when an export was triggered
///
/// The response body is optional; when present it may name the new job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggeredExport {
    /// Job identifier, if the platform returned one
    pub job_id: Option<String>,
}

/// Operations the resolution workflow needs from the fleet platform
///
/// Implementations issue each call exactly once; retry policy lives in the
/// poller, not here.
///
/// # Examples
///
/// ```no_run
/// use journey_export::config::UpstreamConfig;
/// use journey_export::types::{Credentials, JobState};
/// use journey_export::upstream::{ExportPlatform, PlatformClient};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = PlatformClient::new(UpstreamConfig::default())?;
/// let session = client
///     .authenticate(&Credentials::new("ops@example.com", "secret"))
///     .await?;
/// let jobs = client.list_jobs(&session, &JobState::ALL).await?;
/// println!("{} recent jobs", jobs.len());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait ExportPlatform: Send + Sync {
    /// Log in with the caller's credentials
    ///
    /// Fails with [`Error::Auth`](crate::Error::Auth) when the platform rejects
    /// the login or its response lacks the session token or tenant identifier.
    async fn authenticate(&self, credentials: &Credentials) -> Result<Session>;

    /// List recent export jobs in any of `states`, newest first
    ///
    /// Only the first page is fetched.
    async fn list_jobs(&self, session: &Session, states: &[JobState]) -> Result<Vec<Job>>;

    /// Ask the platform to generate the report for `data_window`
    async fn trigger_export(
        &self,
        session: &Session,
        data_window: &DateWindow,
    ) -> Result<TriggeredExport>;
}
