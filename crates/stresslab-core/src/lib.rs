//! Stresslab Core — shared configuration, traits, and errors.
//!
//! This crate has no internal Stresslab dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`config`]: [`StresslabConfig`] and its sections
//! - [`error`]: Error types and Result alias
//! - [`traits`]: [`ConfigManager`]

pub mod config;
pub mod error;
pub mod traits;

pub use config::{
    EngineConfig, ResultsConfig, ServerConfig, SimulationSettings, StressComponent,
    StresslabConfig,
};
pub use error::{Error, Result};
pub use traits::ConfigManager;
