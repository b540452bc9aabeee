//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use stresslab_core::StressComponent;

/// Stresslab - CAE stress simulation front end
#[derive(Parser, Debug)]
#[command(name = "stresslab")]
#[command(author, version, about = "Stress simulation automation and results server", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "STRESSLAB_CONFIG")]
    pub config: Option<String>,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server
    Serve {
        /// Use the built-in mock engine instead of MAPDL
        #[arg(long)]
        mock: bool,
    },
    /// Run one simulation and write the results CSV
    Simulate {
        /// Use the built-in mock engine instead of MAPDL
        #[arg(long)]
        mock: bool,
        /// Stress component to extract (X, Y, Z, XY, YZ, XZ, EQV); repeatable
        #[arg(long = "component", value_name = "COMPONENT")]
        components: Vec<StressComponent>,
    },
    /// Print the results CSV as JSON records
    Results,
    /// Render the results chart as an HTML page
    Plot {
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Configuration management
    Config {
        /// Config action
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// `config` subcommands.
#[derive(Subcommand, Debug, PartialEq)]
pub enum ConfigAction {
    /// Show the resolved config file path
    Path,
    /// Get a value by dotted key (e.g. `server.port`)
    Get {
        /// Dotted key
        key: String,
    },
    /// Set a value by dotted key in the config file
    Set {
        /// Dotted key
        key: String,
        /// New value
        value: String,
    },
    /// Write a default config file
    Init {
        /// Target file; the platform default when omitted
        #[arg(short, long)]
        file: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the configuration as environment variables
    Export {
        /// Format as `--env KEY=VALUE` for docker
        #[arg(long)]
        docker_env: bool,
    },
}
