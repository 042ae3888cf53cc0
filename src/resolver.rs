//! Resolution of the daily journey export
//!
//! Per request the resolver logs in, looks for an export job created in the
//! recent past, and then either returns its result immediately, waits for it,
//! or triggers a fresh export and waits for that one.

use chrono::{DateTime, Local, TimeZone, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, PollConfig};
use crate::error::{Error, Result};
use crate::matcher::find_match;
use crate::poller::{PollOutcome, wait_for_completion};
use crate::types::{Credentials, DateWindow, Job, JobState, Session};
use crate::upstream::ExportPlatform;
use crate::window::{data_window, job_search_window};

/// How a resolution reached its result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPath {
    /// A completed job already existed; no polling happened
    Existing,
    /// A matching job was still running and was polled to completion
    AwaitedExisting,
    /// No job existed; one was triggered and polled to completion
    Triggered,
}

/// Successful outcome of a resolution
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The completed job
    pub job: Job,
    /// Where the finished file can be fetched
    pub result_url: String,
    /// Which branch of the workflow produced the result
    pub path: ResolutionPath,
    /// Number of poll checks performed (zero on the short-circuit path)
    pub poll_checks: u32,
}

/// The two windows a resolution works with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionWindows {
    /// Calendar day the report covers
    pub data: DateWindow,
    /// Creation-time range used to find the export job
    pub search: DateWindow,
}

/// Orchestrates login, job discovery, triggering and polling
pub struct Resolver {
    platform: Arc<dyn ExportPlatform>,
    report_name: String,
    search_lookback: std::time::Duration,
    search_lookahead: std::time::Duration,
    poll: PollConfig,
}

impl Resolver {
    /// Create a resolver over `platform` using the report and timing settings in `config`
    pub fn new(platform: Arc<dyn ExportPlatform>, config: &Config) -> Self {
        Self {
            platform,
            report_name: config.upstream.report_name.clone(),
            search_lookback: config.upstream.search_lookback,
            search_lookahead: config.upstream.search_lookahead,
            poll: config.poll.clone(),
        }
    }

    /// Compute the data and job-search windows relative to `now`
    ///
    /// The data window follows `now`'s time zone; the search window does not
    /// depend on it.
    pub fn windows_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> ResolutionWindows {
        ResolutionWindows {
            data: data_window(now),
            search: job_search_window(
                now.with_timezone(&Utc),
                self.search_lookback,
                self.search_lookahead,
            ),
        }
    }

    /// Resolve yesterday's export for the caller, using the local clock
    pub async fn resolve(
        &self,
        credentials: &Credentials,
        cancel: &CancellationToken,
    ) -> Result<Resolution> {
        let windows = self.windows_at(&Local::now());
        self.resolve_within(credentials, windows, cancel).await
    }

    /// Resolve the export using precomputed windows
    pub async fn resolve_within(
        &self,
        credentials: &Credentials,
        windows: ResolutionWindows,
        cancel: &CancellationToken,
    ) -> Result<Resolution> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let session = self.platform.authenticate(credentials).await?;
        tracing::info!(
            tenant_id = %session.tenant_id(),
            data_start = %windows.data.start,
            data_end = %windows.data.end,
            "resolving journey export"
        );

        let jobs = self.platform.list_jobs(&session, &JobState::ALL).await?;
        let existing = find_match(&jobs, &self.report_name, &windows.search).cloned();

        match existing {
            Some(job) if job.state == JobState::Completed => {
                tracing::info!(job_id = %job.id, "reusing completed export job");
                completed(job, ResolutionPath::Existing, 0)
            }
            Some(job) if job.state.is_failure() => {
                tracing::warn!(job_id = %job.id, state = %job.state, "existing export job failed");
                Err(Error::JobFailed {
                    job_id: job.id,
                    state: job.state,
                })
            }
            Some(job) => {
                tracing::info!(job_id = %job.id, state = %job.state, "waiting for running export job");
                let outcome = self.poll(&session, &windows.search, cancel).await?;
                completed(outcome.job, ResolutionPath::AwaitedExisting, outcome.checks)
            }
            None => {
                let triggered = self.platform.trigger_export(&session, &windows.data).await?;
                tracing::info!(
                    job_id = triggered.job_id.as_deref().unwrap_or("unknown"),
                    "triggered new export job"
                );
                let outcome = self.poll(&session, &windows.search, cancel).await?;
                completed(outcome.job, ResolutionPath::Triggered, outcome.checks)
            }
        }
    }

    async fn poll(
        &self,
        session: &Session,
        search: &DateWindow,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome> {
        wait_for_completion(
            self.platform.as_ref(),
            session,
            &self.report_name,
            search,
            &self.poll,
            cancel,
        )
        .await
    }
}

fn completed(job: Job, path: ResolutionPath, poll_checks: u32) -> Result<Resolution> {
    let result_url = job
        .result_url
        .clone()
        .ok_or_else(|| Error::MissingResult {
            job_id: job.id.clone(),
        })?;

    Ok(Resolution {
        job,
        result_url,
        path,
        poll_checks,
    })
}
