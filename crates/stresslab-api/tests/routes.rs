//! Router behaviour, driven in-process with `oneshot`.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use stresslab_api::{AppState, router};
use stresslab_automation::{Automation, MockEngine, RunState};
use stresslab_core::StresslabConfig;
use tower::ServiceExt;

fn config_in(dir: &Path) -> StresslabConfig {
    let cad = dir.join("FirstResolt.IGS");
    std::fs::write(&cad, "IGES stub").unwrap();

    let mut config = StresslabConfig::default();
    config.simulation.cad_file = cad;
    config.results.csv_path = dir.join("stress_results.csv");
    config.engine.work_dir = dir.join("work");
    config
}

fn app_with(config: &StresslabConfig, engine: MockEngine) -> (Router, Automation) {
    let automation = Automation::new(config, Arc::new(engine)).unwrap();
    let app = router(AppState::new(automation.clone(), "stresslab-test"));
    (app, automation)
}

fn app(config: &StresslabConfig) -> Router {
    app_with(config, MockEngine::sample()).0
}

async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, Option<String>, String) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

fn json_body(body: &str) -> Value {
    serde_json::from_str(body).expect("body should be JSON")
}

#[tokio::test]
async fn test_results_without_csv_is_not_found() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config_in(dir.path());

    for uri in ["/api/simulation", "/results"] {
        let (status, _, body) = send(app(&config), "GET", uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            json_body(&body),
            json!({"error": "Simulation results not available"})
        );
    }
}

#[tokio::test]
async fn test_results_returned_as_records() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config_in(dir.path());
    std::fs::write(
        &config.results.csv_path,
        "Time,Force\n0.0,0\n0.5,125.5\n1.0,250\n",
    )
    .unwrap();

    let (status, content_type, body) = send(app(&config), "GET", "/api/simulation").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("application/json"));
    assert_eq!(
        json_body(&body),
        json!([
            {"Time": 0.0, "Force": 0},
            {"Time": 0.5, "Force": 125.5},
            {"Time": 1.0, "Force": 250},
        ])
    );
}

#[tokio::test]
async fn test_header_only_csv_is_empty_array() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config_in(dir.path());
    std::fs::write(&config.results.csv_path, "node,SX\n").unwrap();

    let (status, _, body) = send(app(&config), "GET", "/results").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!([]));
}

#[tokio::test]
async fn test_malformed_csv_is_server_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config_in(dir.path());
    std::fs::write(&config.results.csv_path, "node,SX\n1,2,3\n").unwrap();

    let (status, _, body) = send(app(&config), "GET", "/api/simulation").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(&body),
        json!({"error": "Failed to process simulation results"})
    );
}

#[tokio::test]
async fn test_empty_csv_is_server_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config_in(dir.path());
    std::fs::write(&config.results.csv_path, "").unwrap();

    let (status, _, body) = send(app(&config), "GET", "/api/simulation").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(&body),
        json!({"error": "Failed to process simulation results"})
    );

    let (status, _, body) = send(app(&config), "GET", "/plot").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Failed to generate plot");
}

#[tokio::test]
async fn test_duplicate_columns_are_suffixed() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config_in(dir.path());
    std::fs::write(&config.results.csv_path, "SX,SX\n1,2\n").unwrap();

    let (status, _, body) = send(app(&config), "GET", "/results").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!([{"SX": 1, "SX.1": 2}]));
}

#[tokio::test]
async fn test_plot_without_csv_is_plain_not_found() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config_in(dir.path());

    for uri in ["/plot", "/"] {
        let (status, _, body) = send(app(&config), "GET", uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Simulation results not available");
    }
}

#[tokio::test]
async fn test_plot_time_force_is_line_chart() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config_in(dir.path());
    std::fs::write(&config.results.csv_path, "Time,Force\n0,0\n1,250\n").unwrap();

    let (status, content_type, body) = send(app(&config), "GET", "/plot").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/html"));
    assert!(body.contains("Simulation Force Over Time"));
    assert!(body.contains("\"mode\":\"lines\""));
}

#[tokio::test]
async fn test_plot_other_columns_is_scatter() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config_in(dir.path());
    std::fs::write(&config.results.csv_path, "node,SX\n1,-1.5e6\n2,7.7e5\n").unwrap();

    let (status, _, body) = send(app(&config), "GET", "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Simulation Data"));
    assert!(body.contains("\"mode\":\"markers\""));
}

#[tokio::test]
async fn test_simulate_then_read_results() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config_in(dir.path());
    let (app, _) = app_with(&config, MockEngine::sample());

    let (status, _, body) = send(app.clone(), "POST", "/simulate").await;
    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["report"]["nodes"], 5);
    assert_eq!(body["report"]["columns"], json!(["SX"]));

    let (status, _, body) = send(app.clone(), "GET", "/api/simulation").await;
    assert_eq!(status, StatusCode::OK);
    let records = json_body(&body);
    assert_eq!(records.as_array().unwrap().len(), 5);
    assert_eq!(records[0]["node"], 1);

    let (_, _, body) = send(app, "GET", "/api/simulation/status").await;
    assert_eq!(json_body(&body)["state"], "succeeded");
}

#[tokio::test]
async fn test_simulate_failure_is_server_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config_in(dir.path());
    let (app, _) = app_with(&config, MockEngine::failing("solver crashed"));

    let (status, _, body) = send(app.clone(), "POST", "/simulate").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(&body);
    assert_eq!(body["error"], "Simulation failed");
    assert!(body["detail"].as_str().unwrap().contains("solver crashed"));
    assert!(body["log_tail"].as_str().unwrap().contains("*** ERROR ***"));

    let (_, _, body) = send(app, "GET", "/api/simulation/status").await;
    assert_eq!(json_body(&body)["state"], "failed");
}

#[tokio::test]
async fn test_simulate_while_running_is_conflict() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config_in(dir.path());
    let (app, automation) = app_with(
        &config,
        MockEngine::sample().with_delay(Duration::from_millis(200)),
    );

    let first = tokio::spawn(send(app.clone(), "POST", "/simulate"));
    automation
        .tracker()
        .subscribe()
        .wait_for(|s| s.is_running())
        .await
        .unwrap();

    let (status, _, body) = send(app.clone(), "GET", "/api/simulation/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["state"], "running");

    let (status, _, body) = send(app, "POST", "/simulate").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        json_body(&body),
        json!({"error": "A simulation is already running"})
    );

    let (status, _, _) = first.await.unwrap();
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_simulation_survives_client_disconnect() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config_in(dir.path());
    let (app, automation) = app_with(
        &config,
        MockEngine::sample().with_delay(Duration::from_millis(300)),
    );

    // The client gives up long before the solver is done.
    let abandoned =
        tokio::time::timeout(Duration::from_millis(50), send(app, "POST", "/simulate")).await;
    assert!(abandoned.is_err());

    automation
        .tracker()
        .subscribe()
        .wait_for(|s| *s != RunState::Idle)
        .await
        .unwrap();
    let state = automation
        .tracker()
        .wait_finished(Duration::from_secs(5))
        .await
        .expect("run should finish");
    assert!(matches!(state, RunState::Succeeded { .. }), "{state:?}");
    assert!(config.results.csv_path.exists());
}

#[tokio::test]
async fn test_health() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config_in(dir.path());

    let (status, _, body) = send(app(&config), "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "stresslab-test");
    assert_eq!(body["engine"], "mock");
    assert_eq!(body["results_available"], false);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config_in(dir.path());

    let (status, _, _) = send(app(&config), "GET", "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
