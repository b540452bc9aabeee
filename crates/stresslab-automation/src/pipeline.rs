//! The simulation pipeline: job → deck → solver → results CSV.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use stresslab_core::{SimulationSettings, StresslabConfig};
use uuid::Uuid;

use crate::Result;
use crate::engine::{SimulationEngine, Workspace};
use crate::job::SimulationJob;
use crate::stress::{parse_nodal_stress, peak_magnitudes};
use crate::tracker::RunTracker;

/// Summary of a completed run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimulationReport {
    /// Run identifier.
    pub run_id: Uuid,
    /// Engine that ran the deck.
    pub engine: String,
    /// Number of nodes written.
    pub nodes: usize,
    /// Result columns, after `node`.
    pub columns: Vec<String>,
    /// Largest absolute value per column.
    pub peaks: Vec<PeakValue>,
    /// Where the CSV was written.
    pub output_path: PathBuf,
    /// Wall-clock time for the whole run.
    pub elapsed_ms: u64,
    /// Time spent inside the solver.
    pub solver_ms: u64,
    /// Completion time.
    pub finished_at: DateTime<Utc>,
}

/// Largest absolute value of one column.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PeakValue {
    /// Column name.
    pub column: String,
    /// Magnitude.
    pub value: f64,
}

/// Drives one engine through the fixed analysis sequence.
///
/// Cheap to clone; clones share the engine and the run tracker, so the
/// single-run rule holds across all of them.
#[derive(Clone)]
pub struct Automation {
    engine: Arc<dyn SimulationEngine>,
    settings: SimulationSettings,
    workspace: Workspace,
    results_path: PathBuf,
    tracker: RunTracker,
}

impl Automation {
    /// Validate `config` and bind it to `engine`.
    pub fn new(config: &StresslabConfig, engine: Arc<dyn SimulationEngine>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            engine,
            settings: config.simulation.clone(),
            workspace: Workspace::new(&config.engine.work_dir, &config.engine.jobname),
            results_path: config.results.csv_path.clone(),
            tracker: RunTracker::new(),
        })
    }

    /// Run state shared with observers.
    pub fn tracker(&self) -> &RunTracker {
        &self.tracker
    }

    /// CSV the pipeline writes.
    pub fn results_path(&self) -> &Path {
        &self.results_path
    }

    /// Name of the bound engine.
    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Run the full analysis and overwrite the results CSV.
    ///
    /// Returns [`Error::Busy`](crate::Error::Busy) without touching anything
    /// if another run is in progress.
    pub async fn run(&self) -> Result<SimulationReport> {
        let run_id = Uuid::new_v4();
        let guard = self.tracker.try_begin(run_id)?;

        match self.run_inner(run_id).await {
            Ok(report) => {
                guard.succeed();
                Ok(report)
            }
            Err(e) => {
                match e.log_tail() {
                    Some(log_tail) => tracing::error!(
                        run_id = %run_id,
                        error = %e,
                        log_tail,
                        "Simulation failed"
                    ),
                    None => tracing::error!(run_id = %run_id, error = %e, "Simulation failed"),
                }
                guard.fail(e.to_string());
                Err(e)
            }
        }
    }

    async fn run_inner(&self, run_id: Uuid) -> Result<SimulationReport> {
        let started = Instant::now();
        tracing::info!(run_id = %run_id, engine = self.engine.name(), "Starting simulation");

        let job = SimulationJob::new(self.settings.clone())?;
        tracing::info!(cad_file = %job.cad_file.display(), "Importing CAD model");

        let deck = job.build_deck(&self.workspace)?;
        tracing::debug!(commands = deck.lines().len(), "Deck assembled");

        tracing::info!("Solving");
        let output = self.engine.execute(&deck, &self.workspace).await?;
        tracing::debug!(
            solver_ms = output.elapsed.as_millis() as u64,
            log_tail = %output.log_tail,
            "Solver finished"
        );

        tracing::info!("Extracting nodal stress data");
        let table = parse_nodal_stress(&output.raw_stress, job.components())?;
        table.write(&self.results_path)?;

        let peaks = peak_magnitudes(&table)
            .into_iter()
            .map(|(column, value)| PeakValue { column, value })
            .collect();
        let report = SimulationReport {
            run_id,
            engine: self.engine.name().to_string(),
            nodes: table.len(),
            columns: table.headers().iter().skip(1).cloned().collect(),
            peaks,
            output_path: self.results_path.clone(),
            elapsed_ms: started.elapsed().as_millis() as u64,
            solver_ms: output.elapsed.as_millis() as u64,
            finished_at: Utc::now(),
        };

        tracing::info!(
            run_id = %run_id,
            nodes = report.nodes,
            path = %report.output_path.display(),
            "Simulation complete"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for Automation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Automation")
            .field("engine", &self.engine.name())
            .field("workspace", &self.workspace)
            .field("results_path", &self.results_path)
            .field("tracker", &self.tracker)
            .finish()
    }
}
