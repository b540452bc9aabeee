//! # stresslab-cli
//!
//! Command-line front end for Stresslab.
//!
//! - `serve`: run the HTTP server
//! - `simulate`: run one simulation
//! - `results` / `plot`: inspect the results file
//! - `config`: locate, read, edit, and export configuration

#![warn(clippy::all)]

pub mod cli;
pub mod commands;
pub mod config_handlers;
pub mod error;

pub use cli::{Cli, Command, ConfigAction};
pub use error::{Error, Result};
