use super::*;
use crate::Config;
use crate::config::PollConfig;
use crate::test_support::{ScriptedPlatform, job_at};
use crate::types::JobState;
use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::Response;
use chrono::{Duration as ChronoDuration, Utc};
use std::time::Duration;
use tower::ServiceExt;


const REPORT: &str = "Planilha de Jornadas V2";

fn test_config() -> Config {
    let mut config = Config::default();
    config.poll = PollConfig::immediate();
    config
}

/// Helper to build a router over a scripted platform
fn create_test_router(platform: Arc<ScriptedPlatform>, config: Config) -> Router {
    let exporter = JourneyExporter::with_platform(Arc::new(config), platform).unwrap();
    create_router(Arc::new(exporter), CancellationToken::new())
}

/// A job created a few minutes ago, inside any reasonable search window
fn recent_job(state: JobState, result_url: Option<&str>) -> crate::types::Job {
    job_at(REPORT, Utc::now() - ChronoDuration::minutes(10), state, result_url)
}

fn get(uri: &str) -> axum::http::request::Builder {
    Request::builder().method("GET").uri(uri)
}

async fn body_json(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_api_server_spawns_and_stops_on_shutdown() {
    let platform = Arc::new(ScriptedPlatform::repeating(vec![]));
    let exporter =
        Arc::new(JourneyExporter::with_platform(Arc::new(test_config()), platform).unwrap());
    let shutdown = CancellationToken::new();

    // Port 0 = OS assigns a free port
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let server = tokio::spawn(serve(listener, exporter, shutdown.clone()));

    let response = reqwest::get(format!("http://{address}/health")).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);

    shutdown.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server should stop after shutdown")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cors_enabled() {
    let platform = Arc::new(ScriptedPlatform::repeating(vec![]));
    let app = create_test_router(platform, test_config());

    let request = get("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let platform = Arc::new(ScriptedPlatform::repeating(vec![]));
    let mut config = test_config();
    config.server.cors_enabled = false;
    let app = create_test_router(platform, config);

    let request = get("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}
