//! Shared test doubles for the export workflow.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::{Error, Result};
use crate::types::{Credentials, DateWindow, Job, JobState, Session};
use crate::upstream::{ExportPlatform, TriggeredExport};

/// Build a job named `name` created at `created_at`
pub(crate) fn job_at(
    name: &str,
    created_at: DateTime<Utc>,
    state: JobState,
    result_url: Option<&str>,
) -> Job {
    Job {
        id: format!("job-{}", created_at.timestamp_millis()),
        name: name.to_string(),
        created_at,
        state,
        result_url: result_url.map(str::to_string),
    }
}

/// In-memory platform replaying a script of job listings.
///
/// Each `list_jobs` call consumes the next listing; the last one is repeated
/// once the script runs out.
pub(crate) struct ScriptedPlatform {
    listings: Mutex<VecDeque<Vec<Job>>>,
    accept_login: bool,
    fail_list_after: Option<u32>,
    auth_calls: AtomicU32,
    list_calls: AtomicU32,
    trigger_calls: AtomicU32,
    triggered: Mutex<Vec<DateWindow>>,
    logins: Mutex<Vec<Credentials>>,
}

impl ScriptedPlatform {
    pub(crate) fn with_listings(listings: Vec<Vec<Job>>) -> Self {
        Self {
            listings: Mutex::new(listings.into()),
            accept_login: true,
            fail_list_after: None,
            auth_calls: AtomicU32::new(0),
            list_calls: AtomicU32::new(0),
            trigger_calls: AtomicU32::new(0),
            triggered: Mutex::new(Vec::new()),
            logins: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn repeating(listing: Vec<Job>) -> Self {
        Self::with_listings(vec![listing])
    }

    pub(crate) fn rejecting_login() -> Self {
        Self {
            accept_login: false,
            ..Self::with_listings(vec![])
        }
    }

    /// Make every listing after the first `n` fail with an upstream error
    pub(crate) fn failing_list_after(mut self, n: u32) -> Self {
        self.fail_list_after = Some(n);
        self
    }

    pub(crate) fn session(&self) -> Session {
        Session::new("test-token", "test-tenant")
    }

    pub(crate) fn auth_calls(&self) -> u32 {
        self.auth_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn list_calls(&self) -> u32 {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn trigger_calls(&self) -> u32 {
        self.trigger_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn triggered_windows(&self) -> Vec<DateWindow> {
        self.triggered.lock().unwrap().clone()
    }

    /// Credentials of every login attempt, in order
    pub(crate) fn logins(&self) -> Vec<Credentials> {
        self.logins.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExportPlatform for ScriptedPlatform {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Session> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        self.logins.lock().unwrap().push(credentials.clone());
        if self.accept_login {
            Ok(self.session())
        } else {
            Err(Error::auth("login returned 401"))
        }
    }

    async fn list_jobs(&self, _session: &Session, _states: &[JobState]) -> Result<Vec<Job>> {
        let call = self.list_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_list_after.is_some_and(|n| call > n) {
            return Err(Error::Upstream {
                operation: "list jobs",
                status: 502,
                body: "bad gateway".into(),
            });
        }

        let mut listings = self.listings.lock().unwrap();
        let listing = if listings.len() > 1 {
            listings.pop_front().unwrap_or_default()
        } else {
            listings.front().cloned().unwrap_or_default()
        };
        Ok(listing)
    }

    async fn trigger_export(
        &self,
        _session: &Session,
        data_window: &DateWindow,
    ) -> Result<TriggeredExport> {
        self.trigger_calls.fetch_add(1, Ordering::SeqCst);
        self.triggered.lock().unwrap().push(*data_window);
        Ok(TriggeredExport::default())
    }
}
