//! Error types for stresslab-api

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Result type alias for stresslab-api operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while starting or running the server
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from stresslab-core
    #[error("Core error: {0}")]
    Core(#[from] stresslab_core::Error),

    /// Error from stresslab-automation
    #[error("Automation error: {0}")]
    Automation(#[from] stresslab_automation::Error),

    /// Listener could not be bound or the server loop failed
    #[error("Server I/O error on {addr}: {source}")]
    Io {
        /// Address being served
        addr: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Failure of a JSON endpoint.
///
/// Bodies are `{"error": "..."}`; messages are generic, details are logged.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// No results file yet.
    ResultsUnavailable,
    /// Results file present but unreadable.
    ResultsUnreadable,
    /// A simulation run failed.
    SimulationFailed {
        /// Error message from the pipeline
        detail: String,
        /// Last lines of the solver log, when the solver itself failed
        log_tail: Option<String>,
    },
    /// A simulation run is already in progress.
    SimulationBusy,
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ResultsUnavailable => StatusCode::NOT_FOUND,
            ApiError::ResultsUnreadable | ApiError::SimulationFailed { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::SimulationBusy => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::ResultsUnavailable => json!({ "error": "Simulation results not available" }),
            ApiError::ResultsUnreadable => {
                json!({ "error": "Failed to process simulation results" })
            }
            ApiError::SimulationFailed { detail, log_tail } => {
                let mut body = json!({ "error": "Simulation failed", "detail": detail });
                if let Some(log_tail) = log_tail {
                    body["log_tail"] = json!(log_tail);
                }
                body
            }
            ApiError::SimulationBusy => json!({ "error": "A simulation is already running" }),
        };
        (status, axum::Json(body)).into_response()
    }
}

/// Failure of an HTML endpoint. Bodies are plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageError {
    /// No results file yet.
    ResultsUnavailable,
    /// Results could not be charted.
    PlotFailed,
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            PageError::ResultsUnavailable => {
                (StatusCode::NOT_FOUND, "Simulation results not available").into_response()
            }
            PageError::PlotFailed => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate plot").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_status() {
        assert_eq!(ApiError::ResultsUnavailable.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::ResultsUnreadable.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::SimulationBusy.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_page_error_status() {
        assert_eq!(
            PageError::ResultsUnavailable.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            PageError::PlotFailed.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_server_io_display() {
        let err = Error::Io {
            addr: "0.0.0.0:5000".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
        };
        assert_eq!(err.to_string(), "Server I/O error on 0.0.0.0:5000: in use");
    }
}
