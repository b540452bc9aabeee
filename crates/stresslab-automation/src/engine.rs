//! The seam between the pipeline and the external solver.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::Result;
use crate::deck::ApdlDeck;

/// Scratch directory and file names for one solver job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Workspace {
    dir: PathBuf,
    jobname: String,
}

impl Workspace {
    /// Workspace rooted at `dir` for job `jobname`.
    pub fn new(dir: impl Into<PathBuf>, jobname: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            jobname: jobname.into(),
        }
    }

    /// Working directory the solver runs in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Solver job name.
    pub fn jobname(&self) -> &str {
        &self.jobname
    }

    /// Input deck file name, relative to [`dir`](Self::dir).
    pub fn input_file_name(&self) -> String {
        format!("{}.inp", self.jobname)
    }

    /// Solver log file name, relative to [`dir`](Self::dir).
    pub fn log_file_name(&self) -> String {
        format!("{}.out", self.jobname)
    }

    /// Input deck path.
    pub fn input_path(&self) -> PathBuf {
        self.dir.join(self.input_file_name())
    }

    /// Solver log path.
    pub fn log_path(&self) -> PathBuf {
        self.dir.join(self.log_file_name())
    }

    /// Base name (no extension) of the nodal stress file the deck writes.
    pub fn stress_file_stem(&self) -> String {
        format!("{}_stress", self.jobname)
    }

    /// Full path of the nodal stress file the deck writes.
    pub fn stress_path(&self) -> PathBuf {
        self.dir.join(format!("{}.csv", self.stress_file_stem()))
    }
}

/// What a finished solver run hands back.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EngineOutput {
    /// Raw nodal stress text as written by the deck.
    pub raw_stress: String,
    /// Tail of the solver log, for diagnostics.
    pub log_tail: String,
    /// Wall-clock time spent in the solver.
    pub elapsed: Duration,
}

/// An external FEA solver that executes command decks.
///
/// Implement this for each way of reaching a solver (local batch process,
/// remote service, test double). `execute` runs the whole deck to
/// completion and returns once the nodal stress file is available.
#[async_trait]
pub trait SimulationEngine: Send + Sync {
    /// Short name for logs and reports.
    fn name(&self) -> &str;

    /// Run `deck` inside `workspace`.
    async fn execute(&self, deck: &ApdlDeck, workspace: &Workspace) -> Result<EngineOutput>;
}
