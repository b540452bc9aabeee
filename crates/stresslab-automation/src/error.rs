//! Error types for the simulation pipeline.

use std::path::PathBuf;

/// Errors that can occur while preparing, running, or post-processing a
/// simulation.
///
/// All error variants are marked with `#[non_exhaustive]` to allow
/// adding new error types without breaking changes.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration or core error
    #[error("Core error: {0}")]
    Core(#[from] stresslab_core::Error),

    /// Results could not be written
    #[error("Results error: {0}")]
    Results(#[from] stresslab_results::Error),

    /// The CAD model to import is missing
    #[error("CAD file not found at {}", .path.display())]
    CadFileNotFound {
        /// Path that was checked
        path: PathBuf,
    },

    /// A path cannot be passed to the solver command language
    #[error("Path {} cannot be used in a solver deck: {reason}", .path.display())]
    InvalidPath {
        /// Offending path
        path: PathBuf,
        /// Why it was rejected
        reason: String,
    },

    /// The solver executable could not be started
    #[error("Failed to launch '{executable}': {source}")]
    Spawn {
        /// Executable that was launched
        executable: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// The solver ran but reported failure
    #[error("Simulation engine failed: {message}")]
    Engine {
        /// Human-readable error message
        message: String,
        /// Last lines of the solver log, if any
        log_tail: String,
    },

    /// The solver exceeded its time budget and was killed
    #[error("Simulation engine timed out after {seconds}s")]
    Timeout {
        /// Timeout duration in seconds
        seconds: u64,
    },

    /// The solver finished without writing the nodal stress file
    #[error("Solver produced no nodal stress output at {}", .path.display())]
    MissingOutput {
        /// Expected output path
        path: PathBuf,
    },

    /// The nodal stress output could not be parsed
    #[error("Invalid solver output on line {line}: {message}")]
    InvalidOutput {
        /// One-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// Another simulation is already running
    #[error("A simulation is already running")]
    Busy,

    /// I/O error in the solver workspace
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Convenience `Result` type alias for automation operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates an I/O error tied to a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Solver log excerpt attached to an engine failure, if any.
    pub fn log_tail(&self) -> Option<&str> {
        match self {
            Error::Engine { log_tail, .. } if !log_tail.trim().is_empty() => Some(log_tail.as_str()),
            _ => None,
        }
    }

    /// Returns `true` if the run was rejected because one is in progress.
    pub fn is_busy(&self) -> bool {
        matches!(self, Error::Busy)
    }
}
