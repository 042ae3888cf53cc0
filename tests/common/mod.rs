//! Common test utilities for journey-export integration tests

use chrono::{DateTime, SecondsFormat, Utc};
use journey_export::{Config, JourneyExporter, PollConfig};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const REPORT: &str = "Planilha de Jornadas V2";
pub const TOKEN: &str = "session-token-1";
pub const TENANT: &str = "4521";
pub const FILE_BYTES: &[u8] = b"PK\x03\x04journeys-of-yesterday";
pub const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Fake fleet platform: login, job search, export trigger and the file host
pub struct FakePlatform {
    pub server: MockServer,
}

impl FakePlatform {
    /// Start a platform that accepts any login and serves the export file
    pub async fn start() -> Self {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-auth-token", TOKEN)
                    .set_body_json(json!({"user": {"organizationId": TENANT.parse::<u64>().unwrap()}})),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/files/journeys.xlsx"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(FILE_BYTES.to_vec(), XLSX))
            .mount(&server)
            .await;

        Self { server }
    }

    pub fn file_url(&self) -> String {
        format!("{}/files/journeys.xlsx", self.server.uri())
    }

    /// Answer job searches with `jobs`; the first `first_n` searches get
    /// `first` instead when given
    pub async fn list_jobs(&self, jobs: Value, first: Option<(u64, Value)>) {
        if let Some((times, body)) = first {
            Mock::given(method("POST"))
                .and(path("/jobs/search"))
                .and(header("x-auth-token", TOKEN))
                .and(header("x-organization-id", TENANT))
                .respond_with(ResponseTemplate::new(200).set_body_json(body))
                .up_to_n_times(times)
                .with_priority(1)
                .mount(&self.server)
                .await;
        }

        Mock::given(method("POST"))
            .and(path("/jobs/search"))
            .and(header("x-auth-token", TOKEN))
            .and(header("x-organization-id", TENANT))
            .respond_with(ResponseTemplate::new(200).set_body_json(jobs))
            .mount(&self.server)
            .await;
    }

    /// Accept export triggers, expecting exactly `times` of them
    pub async fn expect_triggers(&self, times: u64) {
        Mock::given(method("POST"))
            .and(path("/reports/journeys/export"))
            .and(header("x-auth-token", TOKEN))
            .and(header("x-organization-id", TENANT))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({"jobId": 981})))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Reject every login with 401
    pub async fn reject_logins(&self) {
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
            .with_priority(1)
            .mount(&self.server)
            .await;
    }
}

/// A job record in the platform's wire format
pub fn wire_job(id: u64, state: &str, created_at: DateTime<Utc>, result_url: Option<&str>) -> Value {
    json!({
        "id": id,
        "name": REPORT,
        "createDate": created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        "state": state,
        "resultFileUrl": result_url,
    })
}

/// Config pointing at the fake platform with no poll delays
pub fn config_for(platform: &FakePlatform) -> Config {
    let base_url = platform.server.uri();
    let mut config = Config::from_lookup(|key| match key {
        "JOURNEY_EXPORT_UPSTREAM_URL" => Some(base_url.clone()),
        _ => None,
    })
    .unwrap();
    config.poll = PollConfig::immediate();
    config
}

/// A running journey-export server
pub struct RunningServer {
    pub base_url: String,
    pub shutdown: CancellationToken,
    pub handle: JoinHandle<journey_export::Result<()>>,
}

/// Serve `config` on a free local port
pub async fn spawn_server(config: Config) -> RunningServer {
    let exporter = Arc::new(JourneyExporter::new(Arc::new(config)).unwrap());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(journey_export::api::serve(
        listener,
        exporter,
        shutdown.clone(),
    ));

    RunningServer {
        base_url: format!("http://{address}"),
        shutdown,
        handle,
    }
}
