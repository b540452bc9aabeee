//! Command implementations.

use std::path::Path;
use std::sync::Arc;

use stresslab_api::Server;
use stresslab_automation::{Automation, MapdlBatchEngine, MockEngine, SimulationEngine};
use stresslab_core::{ConfigManager, StressComponent, StresslabConfig};
use stresslab_results::{Chart, ResultsTable, read_records};

use crate::{Error, Result};

/// Load the effective configuration and check it.
pub fn load_config(config_path: Option<&str>) -> Result<StresslabConfig> {
    let config = StresslabConfig::load(config_path)?;
    config.validate()?;
    Ok(config)
}

/// Replace the configured stress components when any were given.
pub fn with_components(
    mut config: StresslabConfig,
    components: Vec<StressComponent>,
) -> StresslabConfig {
    if !components.is_empty() {
        config.simulation.stress_components = components;
    }
    config
}

/// The engine a command should drive.
pub fn build_engine(config: &StresslabConfig, mock: bool) -> Arc<dyn SimulationEngine> {
    if mock {
        tracing::info!("Using mock simulation engine");
        Arc::new(MockEngine::sample())
    } else {
        tracing::info!(executable = %config.engine.executable, "Using MAPDL batch engine");
        Arc::new(MapdlBatchEngine::from_config(&config.engine))
    }
}

/// `stresslab serve`
pub async fn cmd_serve(config: StresslabConfig, mock: bool) -> Result<()> {
    let automation = Automation::new(&config, build_engine(&config, mock))?;
    Server::new(config.server, automation).serve().await?;
    Ok(())
}

/// `stresslab simulate`: run once and print the report as JSON.
pub async fn cmd_simulate(config: StresslabConfig, mock: bool) -> Result<()> {
    let automation = Automation::new(&config, build_engine(&config, mock))?;
    let report = automation.run().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// `stresslab results`: the results CSV as JSON records.
pub fn results_json(config: &StresslabConfig) -> Result<String> {
    let records = read_records(&config.results.csv_path)?;
    Ok(serde_json::to_string_pretty(&records)?)
}

/// `stresslab plot`: the results chart as a standalone HTML page.
pub fn plot_html(config: &StresslabConfig) -> Result<String> {
    let table = ResultsTable::read(&config.results.csv_path)?;
    Ok(Chart::from_table(&table).to_html()?)
}

/// Write `contents` to `output`, or stdout when `None`.
pub fn emit(contents: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, contents).map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })?;
            tracing::info!(path = %path.display(), "Wrote output");
        }
        None => println!("{contents}"),
    }
    Ok(())
}
