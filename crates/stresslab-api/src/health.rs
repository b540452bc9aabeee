//! Health endpoint.
//!
//! Reports service identity, the state of the last simulation run, and
//! whether a results file is currently available.

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use stresslab_automation::RunState;

use crate::state::AppState;

/// Health check response.
#[derive(Clone, Debug, Serialize)]
pub struct HealthResponse {
    /// Server status ("healthy").
    pub status: String,
    /// Service name.
    pub service: String,
    /// Crate version.
    pub version: String,
    /// Name of the simulation engine in use.
    pub engine: String,
    /// Last or current simulation run.
    pub simulation: RunState,
    /// Whether the results CSV exists.
    pub results_available: bool,
}

/// Build the health report for `state`.
pub fn health_report(state: &AppState) -> HealthResponse {
    HealthResponse {
        status: "healthy".to_string(),
        service: state.service_name().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine: state.automation().engine_name().to_string(),
        simulation: state.automation().tracker().state(),
        results_available: state.results_path().exists(),
    }
}

/// `GET /health`
pub async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health_report(&state))
}

// ============================================================================
// Tests
// ============================================================================
