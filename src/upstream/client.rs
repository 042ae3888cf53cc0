//! HTTP implementation of [`ExportPlatform`]

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde_json::Value;

use super::wire::{self, ExportRequest, JobListResponse, JobSearchRequest, LoginRequest};
use super::{ExportPlatform, TriggeredExport};
use crate::config::UpstreamConfig;
use crate::error::{Error, Result};
use crate::types::{Credentials, DateWindow, Job, JobState, Session};

/// Response header carrying the session token after login
pub const TOKEN_HEADER: &str = "x-auth-token";
/// Request header carrying the tenant identifier
pub const TENANT_HEADER: &str = "x-organization-id";
/// Request header carrying the client identification string
pub const CLIENT_HEADER: &str = "x-client-name";

const LOGIN_PATH: &str = "/auth/login";
const JOB_SEARCH_PATH: &str = "/jobs/search";
const EXPORT_PATH: &str = "/reports/journeys/export";

/// Fleet platform client backed by a pooled [`reqwest::Client`]
///
/// Stateless apart from the connection pool: sessions are passed in per call.
#[derive(Debug, Clone)]
pub struct PlatformClient {
    http: reqwest::Client,
    config: UpstreamConfig,
}

impl PlatformClient {
    /// Build a client for the configured platform
    pub fn new(config: UpstreamConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.client_name.clone())
            .build()?;
        Ok(Self { http, config })
    }

    /// Build a client reusing an existing HTTP connection pool
    pub fn with_http_client(http: reqwest::Client, config: UpstreamConfig) -> Self {
        Self { http, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http
            .post(self.url(path))
            .header(CLIENT_HEADER, &self.config.client_name)
            .timeout(self.config.request_timeout)
    }

    fn post_authenticated(&self, path: &str, session: &Session) -> RequestBuilder {
        self.post(path)
            .header(TOKEN_HEADER, session.token())
            .header(TENANT_HEADER, session.tenant_id())
    }
}

/// Map a non-success response to [`Error::Upstream`], keeping the body for diagnostics
async fn ensure_success(operation: &'static str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(operation, status = status.as_u16(), body = %body, "platform call failed");
    Err(Error::Upstream {
        operation,
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl ExportPlatform for PlatformClient {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Session> {
        let response = self
            .post(LOGIN_PATH)
            .json(&LoginRequest {
                email: &credentials.email,
                password: &credentials.password,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::auth(format!("login returned {}", status.as_u16())));
        }

        let token = response
            .headers()
            .get(TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .ok_or_else(|| Error::auth(format!("login response has no {TOKEN_HEADER} header")))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::auth(format!("login response body unreadable: {e}")))?;
        let tenant_id = wire::tenant_id(&body)
            .ok_or_else(|| Error::auth("login response has no organization id"))?;

        tracing::debug!(tenant_id = %tenant_id, "authenticated against platform");
        Ok(Session::new(token, tenant_id))
    }

    async fn list_jobs(&self, session: &Session, states: &[JobState]) -> Result<Vec<Job>> {
        let request = JobSearchRequest {
            page: 0,
            size: self.config.page_size,
            states: states.iter().map(JobState::as_str).collect(),
            sort: "createDate,desc",
        };

        let response = self
            .post_authenticated(JOB_SEARCH_PATH, session)
            .json(&request)
            .send()
            .await?;
        let response = ensure_success("list jobs", response).await?;

        let listing: JobListResponse = serde_json::from_slice(&response.bytes().await?)?;
        let jobs = listing
            .into_jobs()
            .into_iter()
            .filter_map(|raw| match raw.normalize() {
                Ok(job) => Some(job),
                Err(reason) => {
                    tracing::warn!(reason = %reason, "dropping unusable job record");
                    None
                }
            })
            .collect::<Vec<_>>();

        for job in jobs.iter().filter(|job| matches!(job.state, JobState::Unknown(_))) {
            tracing::warn!(job_id = %job.id, state = %job.state, "platform reported an unknown job state");
        }

        Ok(jobs)
    }

    async fn trigger_export(
        &self,
        session: &Session,
        data_window: &DateWindow,
    ) -> Result<TriggeredExport> {
        let request = ExportRequest::new(
            &self.config.report_name,
            &self.config.report_format,
            data_window,
        );

        let response = self
            .post_authenticated(EXPORT_PATH, session)
            .json(&request)
            .send()
            .await?;
        let response = ensure_success("trigger export", response).await?;

        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(TriggeredExport::default());
        }

        match serde_json::from_slice::<Value>(&body) {
            Ok(value) => Ok(TriggeredExport {
                job_id: wire::triggered_job_id(&value),
            }),
            Err(e) => {
                tracing::debug!(error = %e, "trigger response is not JSON, proceeding");
                Ok(TriggeredExport::default())
            }
        }
    }
}
