//! # stresslab-results
//!
//! Simulation results storage and presentation.
//!
//! This crate provides:
//! - [`ResultsTable`]: a typed view of the results CSV
//! - [`read_records`]: CSV file → JSON row objects
//! - [`Chart`]: line/scatter figure construction and HTML rendering

#![warn(clippy::all)]

pub mod cell;
pub mod chart;
pub mod error;
pub mod table;

pub use chart::{Chart, ChartKind, Trace};
pub use error::{Error, Result};
pub use table::{Record, ResultsTable, read_records};
