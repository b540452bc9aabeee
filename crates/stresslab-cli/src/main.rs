//! Stresslab CLI
//!
//! Stress simulation automation and results server.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use stresslab_cli::commands::{
    cmd_serve, cmd_simulate, emit, load_config, plot_html, results_json, with_components,
};
use stresslab_cli::config_handlers::handle_config_command;
use stresslab_cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries command output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,stresslab=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Serve { mock } => cmd_serve(load_config(config_path)?, mock).await?,
        Command::Simulate { mock, components } => {
            let config = with_components(load_config(config_path)?, components);
            cmd_simulate(config, mock).await?
        }
        Command::Results => emit(&results_json(&load_config(config_path)?)?, None)?,
        Command::Plot { output } => {
            emit(&plot_html(&load_config(config_path)?)?, output.as_deref())?
        }
        Command::Config { action } => handle_config_command(config_path, action)?,
    }

    Ok(())
}
