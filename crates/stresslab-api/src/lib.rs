//! # stresslab-api
//!
//! HTTP API server for Stresslab.
//!
//! This crate provides:
//! - JSON access to the results CSV
//! - An HTML page charting the results
//! - A trigger for a new simulation run, with run status
//! - A health endpoint
//!
//! See [`routes`] for the endpoint table.

#![warn(clippy::all)]

pub mod error;
pub mod health;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, Error, PageError, Result};
pub use health::{HealthResponse, health_report};
pub use routes::router;
pub use server::Server;
pub use state::AppState;
