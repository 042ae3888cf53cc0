//! Request and response bodies exchanged with the platform
//!
//! The platform has changed its response shapes over time. Everything is
//! decoded leniently here and normalized into [`Job`] so nothing past this
//! module sees the raw shapes.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{DateWindow, Job, JobState};

#[derive(Debug, Serialize)]
pub(super) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct JobSearchRequest<'a> {
    pub page: u32,
    pub size: u32,
    pub states: Vec<&'a str>,
    pub sort: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ExportRequest<'a> {
    pub report_name: &'a str,
    pub format: &'a str,
    pub start_date: String,
    pub end_date: String,
}

impl<'a> ExportRequest<'a> {
    pub fn new(report_name: &'a str, format: &'a str, window: &DateWindow) -> Self {
        Self {
            report_name,
            format,
            start_date: window.start.to_rfc3339_opts(SecondsFormat::Millis, true),
            end_date: window.end.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Job listing: either a bare array or a page object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum JobListResponse {
    Bare(Vec<RawJob>),
    Page {
        #[serde(alias = "items", default)]
        content: Vec<RawJob>,
    },
}

impl JobListResponse {
    pub fn into_jobs(self) -> Vec<RawJob> {
        match self {
            JobListResponse::Bare(jobs) => jobs,
            JobListResponse::Page { content } => content,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RawJob {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "createdAt")]
    create_date: Option<Value>,
    #[serde(default)]
    state: Option<String>,
    // Legacy shape: {"status": {"state": "..."}}
    #[serde(default)]
    status: Option<Value>,
    #[serde(default, alias = "resultUrl")]
    result_file_url: Option<String>,
}

impl RawJob {
    /// Turn the raw record into a [`Job`], or explain why it is unusable
    pub fn normalize(self) -> Result<Job, String> {
        let id = self
            .id
            .as_ref()
            .and_then(value_to_string)
            .ok_or_else(|| "job without id".to_string())?;
        let name = self
            .name
            .ok_or_else(|| format!("job {id} without name"))?;
        let created_at = self
            .create_date
            .as_ref()
            .and_then(parse_timestamp)
            .ok_or_else(|| format!("job {id} without a usable creation date"))?;

        let raw_state = self.state.or_else(|| {
            self.status.as_ref().and_then(|status| match status {
                Value::String(s) => Some(s.clone()),
                Value::Object(map) => map.get("state").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
        });
        let state = match raw_state {
            Some(raw) => JobState::from(raw.as_str()),
            None => JobState::Unknown(String::new()),
        };

        let result_url = self.result_file_url.filter(|url| !url.trim().is_empty());

        Ok(Job {
            id,
            name,
            created_at,
            state,
            result_url,
        })
    }
}

/// Pull the tenant identifier out of a login response body
pub(super) fn tenant_id(body: &Value) -> Option<String> {
    body.get("organizationId")
        .or_else(|| body.get("user").and_then(|user| user.get("organizationId")))
        .or_else(|| body.get("tenantId"))
        .and_then(value_to_string)
}

/// Pull an optional job identifier out of a trigger response body
pub(super) fn triggered_job_id(body: &Value) -> Option<String> {
    body.get("id")
        .or_else(|| body.get("jobId"))
        .and_then(value_to_string)
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            // Offset-less timestamps are taken as UTC
            .or_else(|| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| Utc.from_utc_datetime(&naive))
            }),
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}
