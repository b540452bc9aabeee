//! # stresslab-automation
//!
//! Static stress simulation pipeline.
//!
//! A run imports a CAD model, meshes it, assigns a linear elastic material,
//! fixes one face, loads another, solves, and extracts nodal stress. All of
//! that happens inside an external solver; this crate writes the command
//! deck, runs the solver through a [`SimulationEngine`], and turns the
//! solver's output into the results CSV.
//!
//! - [`deck`]: APDL deck builder
//! - [`job`]: settings → deck
//! - [`engine`]: the engine trait and workspace layout
//! - [`mapdl`]: batch-mode MAPDL engine
//! - [`mock`]: canned-result engine
//! - [`stress`]: nodal stress output parsing
//! - [`tracker`]: run state and the single-run rule
//! - [`pipeline`]: [`Automation`], the whole sequence

pub mod deck;
pub mod engine;
pub mod error;
pub mod job;
pub mod mapdl;
pub mod mock;
pub mod pipeline;
pub mod stress;
pub mod tracker;

pub use deck::ApdlDeck;
pub use engine::{EngineOutput, SimulationEngine, Workspace};
pub use error::{Error, Result};
pub use job::SimulationJob;
pub use mapdl::MapdlBatchEngine;
pub use mock::MockEngine;
pub use pipeline::{Automation, PeakValue, SimulationReport};
pub use tracker::{RunGuard, RunState, RunTracker};
