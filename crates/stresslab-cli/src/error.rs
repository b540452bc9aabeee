//! Error types for stresslab-cli

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for stresslab-cli operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in stresslab-cli
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from stresslab-core
    #[error("Core error: {0}")]
    Core(#[from] stresslab_core::Error),

    /// Error from stresslab-results
    #[error("Results error: {0}")]
    Results(#[from] stresslab_results::Error),

    /// Error from stresslab-automation
    #[error("Simulation error: {0}")]
    Automation(#[from] stresslab_automation::Error),

    /// Error from stresslab-api
    #[error("Server error: {0}")]
    Api(#[from] stresslab_api::Error),

    /// JSON output could not be produced
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Output file could not be written
    #[error("I/O error at {path}: {source}")]
    Io {
        /// File being written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
