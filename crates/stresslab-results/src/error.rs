//! Error types for stresslab-results

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for stresslab-results operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading, writing, or charting results
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The results file does not exist (no simulation has produced it yet)
    #[error("Results file not found: {}", .path.display())]
    NotFound {
        /// Path that was checked
        path: PathBuf,
    },

    /// The results file exists but is not valid CSV
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error while writing or renaming the results file
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Chart figure could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The results file is empty or its header row is blank
    #[error("Results file has no header row")]
    NoHeader,

    /// A table was built with rows that do not match its header
    #[error("Row {row} has {found} cells, expected {expected}")]
    Shape {
        /// Zero-based row index
        row: usize,
        /// Number of header columns
        expected: usize,
        /// Number of cells in the offending row
        found: usize,
    },
}

impl Error {
    /// Whether this error means "no results yet" rather than "broken results".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
