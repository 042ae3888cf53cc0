//! Core types for journey-export

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Credentials supplied by the caller, passed straight through to the platform login
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Platform account e-mail
    pub email: String,
    /// Platform account password
    pub password: String,
}

impl Credentials {
    /// Create credentials from an e-mail and password
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Authenticated platform session
///
/// Lives for a single resolution and is never persisted. Both fields are
/// required on every call after login, so the only way to obtain one is a
/// successful login that yielded both.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    tenant_id: String,
}

impl Session {
    /// Build a session from a login token and tenant identifier
    pub fn new(token: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            tenant_id: tenant_id.into(),
        }
    }

    /// The opaque session token
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The tenant (organization) identifier
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

/// Lifecycle state of a platform export job
///
/// The platform sends these as upper-case strings. Anything not recognised is
/// kept in [`JobState::Unknown`] and treated as still running.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum JobState {
    /// Accepted, not yet queued
    Scheduled,
    /// Queued behind other jobs
    Waiting,
    /// Being generated
    Processing,
    /// Finished; the result file is available
    Completed,
    /// Finished with a failure
    Error,
    /// Cancelled on the platform side
    Cancelled,
    /// A state string this crate does not know about
    Unknown(String),
}

impl JobState {
    /// Every known state, in lifecycle order
    pub const ALL: [JobState; 6] = [
        JobState::Scheduled,
        JobState::Waiting,
        JobState::Processing,
        JobState::Completed,
        JobState::Error,
        JobState::Cancelled,
    ];

    /// Wire representation of the state
    pub fn as_str(&self) -> &str {
        match self {
            JobState::Scheduled => "SCHEDULED",
            JobState::Waiting => "WAITING",
            JobState::Processing => "PROCESSING",
            JobState::Completed => "COMPLETED",
            JobState::Error => "ERROR",
            JobState::Cancelled => "CANCELLED",
            JobState::Unknown(raw) => raw,
        }
    }

    /// True once no further transition can happen
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Error | JobState::Cancelled
        )
    }

    /// True for terminal states that carry no result
    pub fn is_failure(&self) -> bool {
        matches!(self, JobState::Error | JobState::Cancelled)
    }
}

impl From<&str> for JobState {
    fn from(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SCHEDULED" => JobState::Scheduled,
            "WAITING" => JobState::Waiting,
            "PROCESSING" => JobState::Processing,
            "COMPLETED" => JobState::Completed,
            "ERROR" => JobState::Error,
            "CANCELLED" | "CANCELED" => JobState::Cancelled,
            _ => JobState::Unknown(raw.to_string()),
        }
    }
}

impl FromStr for JobState {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(JobState::from(s))
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for JobState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for JobState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(JobState::from(raw.as_str()))
    }
}

/// Canonical export job record, normalized from whatever shape the platform sent
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Job {
    /// Platform identifier
    pub id: String,
    /// Report name, matched exactly
    pub name: String,
    /// When the platform created the job (trigger time, not data time)
    pub created_at: DateTime<Utc>,
    /// Current lifecycle state
    pub state: JobState,
    /// Result file reference, present once the job completed
    pub result_url: Option<String>,
}

/// Closed time range, inclusive at both ends
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    /// First instant inside the window
    pub start: DateTime<Utc>,
    /// Last instant inside the window
    pub end: DateTime<Utc>,
}

impl DateWindow {
    /// Create a window from its two bounds
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Whether `instant` lies inside the window, bounds included
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}
