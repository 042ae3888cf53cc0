//! Configuration types for journey-export
//!
//! Everything here is read once at startup and shared read-only afterwards.
//! [`Config::from_env`] is the deployment entry point; the serde derives let
//! embedders build a config from their own sources.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::IpAddr, net::SocketAddr, time::Duration};

/// HTTP listener settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind (default: 0.0.0.0)
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on (default: 3000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
}

impl ServerConfig {
    /// Socket address the API server binds to
    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: true,
        }
    }
}

/// Fleet platform settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the platform REST API, without trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Exact name of the report to resolve
    #[serde(default = "default_report_name")]
    pub report_name: String,

    /// Report format identifier sent when triggering an export
    #[serde(default = "default_report_format")]
    pub report_format: String,

    /// Client identification string sent on every platform request
    #[serde(default = "default_client_name")]
    pub client_name: String,

    /// Page size used when listing jobs (only the first page is read)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Per-request timeout for platform calls (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// How far back the job-search window reaches (default: 3 hours)
    #[serde(default = "default_search_lookback", with = "duration_serde")]
    pub search_lookback: Duration,

    /// How far ahead the job-search window reaches, for clock skew (default: 5 minutes)
    #[serde(default = "default_search_lookahead", with = "duration_serde")]
    pub search_lookahead: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            report_name: default_report_name(),
            report_format: default_report_format(),
            client_name: default_client_name(),
            page_size: default_page_size(),
            request_timeout: default_request_timeout(),
            search_lookback: default_search_lookback(),
            search_lookahead: default_search_lookahead(),
        }
    }
}

/// Timing of the job poller
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay before the first check (default: 3 seconds)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Fixed delay between checks (default: 5 seconds)
    #[serde(default = "default_poll_interval", with = "duration_serde")]
    pub poll_interval: Duration,

    /// Give up after this long (default: 5 minutes)
    #[serde(default = "default_max_wait", with = "duration_serde")]
    pub max_wait: Duration,
}

impl PollConfig {
    /// Poll timing with no waits at all, handy for tests
    pub fn immediate() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            poll_interval: Duration::ZERO,
            max_wait: Duration::from_secs(5),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_delay: default_initial_delay(),
            poll_interval: default_poll_interval(),
            max_wait: default_max_wait(),
        }
    }
}

/// Settings for relaying the finished file
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelayConfig {
    /// File name advertised in Content-Disposition
    #[serde(default = "default_download_filename")]
    pub download_filename: String,

    /// Buffer the file and attach SHA-256/MD5 digests (default: false)
    #[serde(default)]
    pub integrity_digest: bool,

    /// Timeout for the whole file transfer (default: 5 minutes)
    #[serde(default = "default_download_timeout", with = "duration_serde")]
    pub download_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            download_filename: default_download_filename(),
            integrity_digest: false,
            download_timeout: default_download_timeout(),
        }
    }
}

/// Main configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener
    #[serde(default)]
    pub server: ServerConfig,

    /// Fleet platform access
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Poller timing
    #[serde(default)]
    pub poll: PollConfig,

    /// File relay
    #[serde(default)]
    pub relay: RelayConfig,
}

impl Config {
    /// Build the configuration from process environment variables
    ///
    /// Unset variables fall back to defaults; set but unparseable ones are errors.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = get("PORT") {
            config.server.port = parse_value("PORT", &port)?;
        }
        if let Some(host) = get("HOST") {
            config.server.host = parse_value("HOST", &host)?;
        }
        if let Some(cors) = get("JOURNEY_EXPORT_CORS") {
            config.server.cors_enabled = parse_bool("JOURNEY_EXPORT_CORS", &cors)?;
        }

        if let Some(url) = get("JOURNEY_EXPORT_UPSTREAM_URL") {
            url::Url::parse(&url).map_err(|e| {
                Error::config("JOURNEY_EXPORT_UPSTREAM_URL", format!("invalid URL: {e}"))
            })?;
            config.upstream.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(name) = get("JOURNEY_EXPORT_REPORT_NAME") {
            config.upstream.report_name = name;
        }
        if let Some(client) = get("JOURNEY_EXPORT_CLIENT_NAME") {
            config.upstream.client_name = client;
        }
        if let Some(minutes) = get("JOURNEY_EXPORT_LOOKBACK_MINUTES") {
            config.upstream.search_lookback =
                parse_minutes("JOURNEY_EXPORT_LOOKBACK_MINUTES", &minutes)?;
        }
        if let Some(minutes) = get("JOURNEY_EXPORT_LOOKAHEAD_MINUTES") {
            config.upstream.search_lookahead =
                parse_minutes("JOURNEY_EXPORT_LOOKAHEAD_MINUTES", &minutes)?;
        }

        if let Some(ms) = get("JOURNEY_EXPORT_POLL_INTERVAL_MS") {
            config.poll.poll_interval = parse_millis("JOURNEY_EXPORT_POLL_INTERVAL_MS", &ms)?;
        }
        if let Some(ms) = get("JOURNEY_EXPORT_INITIAL_DELAY_MS") {
            config.poll.initial_delay = parse_millis("JOURNEY_EXPORT_INITIAL_DELAY_MS", &ms)?;
        }
        if let Some(ms) = get("JOURNEY_EXPORT_MAX_WAIT_MS") {
            config.poll.max_wait = parse_millis("JOURNEY_EXPORT_MAX_WAIT_MS", &ms)?;
        }

        if let Some(flag) = get("JOURNEY_EXPORT_INTEGRITY_DIGEST") {
            config.relay.integrity_digest = parse_bool("JOURNEY_EXPORT_INTEGRITY_DIGEST", &flag)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject combinations that can never produce a successful resolution
    pub fn validate(&self) -> Result<()> {
        if self.poll.initial_delay >= self.poll.max_wait {
            return Err(Error::config(
                "JOURNEY_EXPORT_INITIAL_DELAY_MS",
                "initial delay must be shorter than the max wait",
            ));
        }
        if self.poll.poll_interval.is_zero() {
            return Err(Error::config(
                "JOURNEY_EXPORT_POLL_INTERVAL_MS",
                "poll interval must be positive",
            ));
        }
        if self.upstream.page_size == 0 {
            return Err(Error::Config {
                message: "page size must be positive".to_string(),
                key: None,
            });
        }
        Ok(())
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::config(key, format!("invalid value {raw:?}: {e}")))
}

fn parse_millis(key: &str, raw: &str) -> Result<Duration> {
    parse_value::<u64>(key, raw).map(Duration::from_millis)
}

fn parse_minutes(key: &str, raw: &str) -> Result<Duration> {
    let minutes = parse_value::<u64>(key, raw)?;
    minutes
        .checked_mul(60)
        .map(Duration::from_secs)
        .ok_or_else(|| Error::config(key, format!("{minutes} minutes is out of range")))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::config(key, format!("invalid boolean {raw:?}"))),
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    3000
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "https://api.fleet-platform.example/v1".into()
}

fn default_report_name() -> String {
    "Planilha de Jornadas V2".into()
}

fn default_report_format() -> String {
    "XLSX".into()
}

fn default_client_name() -> String {
    concat!("journey-export/", env!("CARGO_PKG_VERSION")).into()
}

fn default_page_size() -> u32 {
    100
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_search_lookback() -> Duration {
    Duration::from_secs(3 * 60 * 60)
}

fn default_search_lookahead() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(3)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_max_wait() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_download_filename() -> String {
    "journey-export.xlsx".into()
}

fn default_download_timeout() -> Duration {
    Duration::from_secs(5 * 60)
}

// Durations are carried as integer milliseconds
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_deployment_constants() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.upstream.report_name, "Planilha de Jornadas V2");
        assert_eq!(config.upstream.page_size, 100);
        assert_eq!(config.poll, PollConfig::default());
        assert!(!config.relay.integrity_digest);
    }

    #[test]
    fn test_env_overrides_are_applied() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("JOURNEY_EXPORT_UPSTREAM_URL", "http://127.0.0.1:9000/api/"),
            ("JOURNEY_EXPORT_POLL_INTERVAL_MS", "250"),
            ("JOURNEY_EXPORT_INITIAL_DELAY_MS", "100"),
            ("JOURNEY_EXPORT_MAX_WAIT_MS", "1000"),
            ("JOURNEY_EXPORT_LOOKBACK_MINUTES", "90"),
            ("JOURNEY_EXPORT_INTEGRITY_DIGEST", "yes"),
        ]))
        .unwrap();

        assert_eq!(config.server.bind_address().port(), 8080);
        assert_eq!(config.upstream.base_url, "http://127.0.0.1:9000/api");
        assert_eq!(config.poll.poll_interval, Duration::from_millis(250));
        assert_eq!(config.poll.initial_delay, Duration::from_millis(100));
        assert_eq!(config.poll.max_wait, Duration::from_secs(1));
        assert_eq!(config.upstream.search_lookback, Duration::from_secs(90 * 60));
        assert!(config.relay.integrity_digest);
    }

    #[test]
    fn test_empty_values_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup(&[("PORT", "  ")])).unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_invalid_port_reports_key() {
        let err = Config::from_lookup(lookup(&[("PORT", "http")])).unwrap_err();
        match err {
            Error::Config { key, .. } => assert_eq!(key.as_deref(), Some("PORT")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_boolean_is_rejected() {
        let result = Config::from_lookup(lookup(&[("JOURNEY_EXPORT_CORS", "maybe")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_initial_delay_must_be_shorter_than_max_wait() {
        let result = Config::from_lookup(lookup(&[
            ("JOURNEY_EXPORT_INITIAL_DELAY_MS", "5000"),
            ("JOURNEY_EXPORT_MAX_WAIT_MS", "5000"),
        ]));
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_zero_poll_interval_is_rejected() {
        let err = Config::from_lookup(lookup(&[("JOURNEY_EXPORT_POLL_INTERVAL_MS", "0")]))
            .unwrap_err();
        match err {
            Error::Config { key, .. } => {
                assert_eq!(key.as_deref(), Some("JOURNEY_EXPORT_POLL_INTERVAL_MS"))
            }
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_huge_lookback_is_a_config_error() {
        let huge = u64::MAX.to_string();
        let err = Config::from_lookup(lookup(&[(
            "JOURNEY_EXPORT_LOOKBACK_MINUTES",
            huge.as_str(),
        )]))
        .unwrap_err();
        match err {
            Error::Config { key, .. } => {
                assert_eq!(key.as_deref(), Some("JOURNEY_EXPORT_LOOKBACK_MINUTES"))
            }
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_partial_json_uses_field_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"poll": {"poll_interval": 1500}, "server": {"port": 4000}}"#)
                .unwrap();

        assert_eq!(config.server.port, 4000);
        assert_eq!(config.poll.poll_interval, Duration::from_millis(1500));
        assert_eq!(config.poll.initial_delay, Duration::from_secs(3));
        assert_eq!(config.relay.download_filename, "journey-export.xlsx");
    }
}
