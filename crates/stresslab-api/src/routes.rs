//! HTTP routes.
//!
//! | Method | Path                        | Response                              |
//! |--------|-----------------------------|---------------------------------------|
//! | GET    | `/api/simulation`, `/results` | results as a JSON array of row objects |
//! | GET    | `/plot`, `/`                | HTML page with an interactive chart   |
//! | POST   | `/simulate`                 | runs the pipeline, returns its report |
//! | GET    | `/api/simulation/status`    | state of the last or current run      |
//! | GET    | `/health`                   | service health                        |

use std::path::PathBuf;

use axum::extract::State;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use stresslab_automation::{RunState, SimulationReport};
use stresslab_results::{Chart, Record, ResultsTable};
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, PageError};
use crate::health::handle_health;
use crate::state::AppState;

/// Body of a successful `POST /simulate`.
#[derive(Debug, Serialize)]
pub struct SimulateResponse {
    /// Always `"ok"`.
    pub status: &'static str,
    /// What the run produced.
    pub report: SimulationReport,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/simulation", get(get_simulation_data))
        .route("/results", get(get_simulation_data))
        .route("/api/simulation/status", get(get_simulation_status))
        .route("/plot", get(get_simulation_plot))
        .route("/", get(get_simulation_plot))
        .route("/simulate", post(run_simulation))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Read the results file off the async runtime.
async fn load_table(path: PathBuf) -> stresslab_results::Result<ResultsTable> {
    let shown = path.clone();
    match tokio::task::spawn_blocking(move || ResultsTable::read(path)).await {
        Ok(result) => result,
        Err(join_err) => {
            tracing::error!(path = %shown.display(), error = %join_err, "Results reader task failed");
            Err(stresslab_results::Error::Io {
                path: shown,
                source: std::io::Error::other(join_err.to_string()),
            })
        }
    }
}

/// `GET /api/simulation`, `GET /results`
async fn get_simulation_data(
    State(state): State<AppState>,
) -> Result<Json<Vec<Record>>, ApiError> {
    let path = state.results_path().to_path_buf();
    match load_table(path.clone()).await {
        Ok(table) => {
            tracing::info!(rows = table.len(), "Simulation data loaded successfully");
            Ok(Json(table.to_records()))
        }
        Err(e) if e.is_not_found() => {
            tracing::error!(path = %path.display(), "CSV file not found");
            Err(ApiError::ResultsUnavailable)
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Error reading CSV file");
            Err(ApiError::ResultsUnreadable)
        }
    }
}

/// `GET /plot`, `GET /`
async fn get_simulation_plot(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    let path = state.results_path().to_path_buf();
    let table = match load_table(path.clone()).await {
        Ok(table) => table,
        Err(e) if e.is_not_found() => {
            tracing::error!(path = %path.display(), "CSV file not found");
            return Err(PageError::ResultsUnavailable);
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Error generating plot");
            return Err(PageError::PlotFailed);
        }
    };

    let chart = Chart::from_table(&table);
    match chart.to_html() {
        Ok(html) => {
            tracing::info!(kind = ?chart.kind, traces = chart.traces.len(), "Plot generated successfully");
            Ok(Html(html))
        }
        Err(e) => {
            tracing::error!(error = %e, "Error generating plot");
            Err(PageError::PlotFailed)
        }
    }
}

/// `POST /simulate`
///
/// The run is detached from the request: if the client goes away, the
/// solve still finishes and writes its results.
async fn run_simulation(
    State(state): State<AppState>,
) -> Result<Json<SimulateResponse>, ApiError> {
    let automation = state.automation().clone();
    let run = tokio::spawn(async move { automation.run().await });

    match run.await {
        Ok(Ok(report)) => Ok(Json(SimulateResponse {
            status: "ok",
            report,
        })),
        Ok(Err(e)) if e.is_busy() => {
            tracing::warn!("Simulation requested while another is running");
            Err(ApiError::SimulationBusy)
        }
        Ok(Err(e)) => Err(ApiError::SimulationFailed {
            detail: e.to_string(),
            log_tail: e.log_tail().map(str::to_string),
        }),
        Err(join_err) => {
            tracing::error!(error = %join_err, "Simulation task panicked");
            Err(ApiError::SimulationFailed {
                detail: join_err.to_string(),
                log_tail: None,
            })
        }
    }
}

/// `GET /api/simulation/status`
async fn get_simulation_status(State(state): State<AppState>) -> Json<RunState> {
    Json(state.automation().tracker().state())
}
