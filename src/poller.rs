//! Fixed-interval polling of an export job until it settles
//!
//! The platform usually finishes an export within a narrow, predictable band,
//! so the loop waits a constant interval between checks instead of backing off.
//! Waits are timer suspensions on the runtime and stop early when the
//! cancellation token fires.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::PollConfig;
use crate::error::{Error, Result};
use crate::matcher::find_match;
use crate::types::{DateWindow, Job, JobState, Session};
use crate::upstream::ExportPlatform;

/// A completed job and how many checks it took to see it
#[derive(Debug, Clone)]
pub struct PollOutcome {
    /// The job in state [`JobState::Completed`]
    pub job: Job,
    /// Number of job listings performed
    pub checks: u32,
}

/// Wait until the job named `report_name` inside `window` completes
///
/// Sleeps `initial_delay` first because freshly created jobs are not always
/// visible straight away. Each check lists jobs and matches again, so a job
/// that only shows up after a few checks is still picked up.
///
/// # Errors
///
/// - [`Error::JobFailed`] as soon as the job reaches `ERROR` or `CANCELLED`
/// - [`Error::Timeout`] when `max_wait` passes without completion
/// - [`Error::Cancelled`] when `cancel` fires
/// - any listing error, unchanged; listing failures are not retried
pub async fn wait_for_completion(
    platform: &dyn ExportPlatform,
    session: &Session,
    report_name: &str,
    window: &DateWindow,
    config: &PollConfig,
    cancel: &CancellationToken,
) -> Result<PollOutcome> {
    let started = Instant::now();
    let deadline = started + config.max_wait;
    let mut checks = 0u32;

    pause(config.initial_delay, cancel).await?;

    loop {
        if Instant::now() >= deadline {
            tracing::warn!(
                checks,
                waited_ms = started.elapsed().as_millis() as u64,
                "export job did not complete in time"
            );
            return Err(Error::Timeout {
                waited: started.elapsed(),
            });
        }

        checks += 1;
        let jobs = platform.list_jobs(session, &JobState::ALL).await?;

        match find_match(&jobs, report_name, window) {
            Some(job) if job.state == JobState::Completed => {
                tracing::info!(
                    job_id = %job.id,
                    checks,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "export job completed"
                );
                return Ok(PollOutcome {
                    job: job.clone(),
                    checks,
                });
            }
            Some(job) if job.state.is_failure() => {
                tracing::warn!(job_id = %job.id, state = %job.state, checks, "export job failed");
                return Err(Error::JobFailed {
                    job_id: job.id.clone(),
                    state: job.state.clone(),
                });
            }
            Some(job) => {
                tracing::debug!(job_id = %job.id, state = %job.state, checks, "export job still running");
            }
            None => {
                tracing::debug!(checks, "export job not visible yet");
            }
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        pause(config.poll_interval.min(remaining), cancel).await?;
    }
}

/// Sleep for `duration` unless `cancel` fires first
async fn pause(duration: Duration, cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    if duration.is_zero() {
        return Ok(());
    }

    tokio::select! {
        _ = cancel.cancelled() => {
            tracing::debug!("poll wait cancelled");
            Err(Error::Cancelled)
        }
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}
