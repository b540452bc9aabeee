//! Stresslab configuration.
//!
//! Loaded from a TOML file (see [`ConfigManager`]) with a handful of
//! environment overrides applied on top. Every section has defaults, so an
//! absent file or a partial file are both valid.
//!
//! ```toml
//! [server]
//! port = 8080
//!
//! [simulation]
//! mesh_size = 0.01
//! stress_components = ["X", "EQV"]
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::traits::ConfigManager;
use crate::{Error, Result};

// ============================================================================
// StresslabConfig
// ============================================================================

/// Top-level configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StresslabConfig {
    /// Project name, shown in the health report.
    pub project_name: String,
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Where simulation results live.
    pub results: ResultsConfig,
    /// External solver invocation.
    pub engine: EngineConfig,
    /// Model, material, and load case.
    pub simulation: SimulationSettings,
}

impl Default for StresslabConfig {
    fn default() -> Self {
        Self {
            project_name: "stresslab".to_string(),
            server: ServerConfig::default(),
            results: ResultsConfig::default(),
            engine: EngineConfig::default(),
            simulation: SimulationSettings::default(),
        }
    }
}

/// HTTP server settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for binding a listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Results file location.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultsConfig {
    /// CSV written by the simulation and served by the API.
    pub csv_path: PathBuf,
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("data").join("stress_results.csv"),
        }
    }
}

/// How the external solver is launched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Solver executable (looked up on `PATH` when not absolute).
    pub executable: String,
    /// Extra arguments appended after the batch-mode flags.
    pub args: Vec<String>,
    /// Scratch directory for input decks, logs, and solver files.
    pub work_dir: PathBuf,
    /// Job name passed to the solver.
    pub jobname: String,
    /// Kill the solver after this many seconds.
    pub timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            executable: "mapdl".to_string(),
            args: Vec::new(),
            work_dir: PathBuf::from("data").join("work"),
            jobname: "stresslab".to_string(),
            timeout_secs: 3600,
        }
    }
}

/// Model, mesh, material, and load case for the static run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// IGES geometry to import.
    pub cad_file: PathBuf,
    /// Solver element type number (185 is an 8-node structural solid).
    pub element_type: u32,
    /// Global element edge length, metres.
    pub mesh_size: f64,
    /// Young's modulus, pascals.
    pub youngs_modulus: f64,
    /// Poisson's ratio.
    pub poisson_ratio: f64,
    /// X coordinate of the fixed face.
    pub support_x: f64,
    /// X coordinate of the loaded face.
    pub load_x: f64,
    /// Force applied to each node of the loaded face along X, newtons.
    pub force_fx: f64,
    /// Nodal stress components to extract.
    pub stress_components: Vec<StressComponent>,
    /// Result set to read back.
    pub load_step: u32,
    /// Substep within the load step.
    pub substep: u32,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            cad_file: PathBuf::from("data").join("FirstResolt.IGS"),
            element_type: 185,
            mesh_size: 0.005,
            youngs_modulus: 210e9,
            poisson_ratio: 0.3,
            support_x: 0.0,
            load_x: 0.1,
            force_fx: -1000.0,
            stress_components: vec![StressComponent::X],
            load_step: 1,
            substep: 1,
        }
    }
}

// ============================================================================
// StressComponent
// ============================================================================

/// A nodal stress component the solver can report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StressComponent {
    /// Normal stress along X.
    X,
    /// Normal stress along Y.
    Y,
    /// Normal stress along Z.
    Z,
    /// Shear XY.
    XY,
    /// Shear YZ.
    YZ,
    /// Shear XZ.
    XZ,
    /// Von Mises equivalent.
    EQV,
}

impl StressComponent {
    /// Component label as the solver spells it (`X`, `EQV`, ...).
    pub fn label(&self) -> &'static str {
        match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Z => "Z",
            Self::XY => "XY",
            Self::YZ => "YZ",
            Self::XZ => "XZ",
            Self::EQV => "EQV",
        }
    }

    /// CSV column name (`SX`, `SEQV`, ...).
    pub fn column_name(&self) -> String {
        format!("S{}", self.label())
    }
}

impl fmt::Display for StressComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StressComponent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_uppercase();
        match upper.strip_prefix('S').unwrap_or(&upper) {
            "X" => Ok(Self::X),
            "Y" => Ok(Self::Y),
            "Z" => Ok(Self::Z),
            "XY" => Ok(Self::XY),
            "YZ" => Ok(Self::YZ),
            "XZ" => Ok(Self::XZ),
            "EQV" => Ok(Self::EQV),
            other => Err(Error::config(format!("unknown stress component '{other}'"))),
        }
    }
}

// ============================================================================
// Loading and validation
// ============================================================================

impl StresslabConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("invalid config: {e}")))
    }

    /// Apply `STRESSLAB_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides using an arbitrary lookup function.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("STRESSLAB_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("STRESSLAB_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| Error::config(format!("STRESSLAB_PORT is not a port: '{port}'")))?;
        }
        if let Some(path) = lookup("STRESSLAB_CSV_PATH") {
            self.results.csv_path = PathBuf::from(path);
        }
        if let Some(exe) = lookup("STRESSLAB_ENGINE") {
            self.engine.executable = exe;
        }
        if let Some(cad) = lookup("STRESSLAB_CAD_FILE") {
            self.simulation.cad_file = PathBuf::from(cad);
        }
        if let Some(list) = lookup("STRESSLAB_COMPONENTS") {
            self.simulation.stress_components = list
                .split(',')
                .filter(|item| !item.trim().is_empty())
                .map(str::parse)
                .collect::<Result<Vec<StressComponent>>>()?;
        }
        Ok(())
    }

    /// Reject settings the solver would choke on.
    pub fn validate(&self) -> Result<()> {
        let sim = &self.simulation;
        if !(sim.mesh_size.is_finite() && sim.mesh_size > 0.0) {
            return Err(Error::config("simulation.mesh_size must be positive"));
        }
        if !(sim.youngs_modulus.is_finite() && sim.youngs_modulus > 0.0) {
            return Err(Error::config("simulation.youngs_modulus must be positive"));
        }
        if !(0.0..0.5).contains(&sim.poisson_ratio) {
            return Err(Error::config(
                "simulation.poisson_ratio must be in [0, 0.5)",
            ));
        }
        if sim.support_x == sim.load_x {
            return Err(Error::config(
                "simulation.support_x and simulation.load_x must differ",
            ));
        }
        if sim.stress_components.is_empty() {
            return Err(Error::config(
                "simulation.stress_components must not be empty",
            ));
        }
        if self.engine.timeout_secs == 0 {
            return Err(Error::config("engine.timeout_secs must be positive"));
        }
        if self.engine.executable.trim().is_empty() {
            return Err(Error::config("engine.executable must not be empty"));
        }
        validate_jobname(&self.engine.jobname)?;
        Ok(())
    }
}

/// Longest job name the solver accepts.
pub const MAX_JOBNAME_LEN: usize = 32;

/// A job name ends up in solver file names and in APDL arguments, so it is
/// limited to ASCII letters, digits, `_` and `-`, starting with a letter.
fn validate_jobname(jobname: &str) -> Result<()> {
    let mut chars = jobname.chars();
    let Some(first) = chars.next() else {
        return Err(Error::config("engine.jobname must not be empty"));
    };
    if jobname.len() > MAX_JOBNAME_LEN {
        return Err(Error::config(format!(
            "engine.jobname must be at most {MAX_JOBNAME_LEN} characters"
        )));
    }
    if !first.is_ascii_alphabetic()
        || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(Error::config(format!(
            "engine.jobname '{jobname}' may only contain letters, digits, '_' and '-', starting with a letter"
        )));
    }
    Ok(())
}

impl ConfigManager for StresslabConfig {
    fn project_name() -> &'static str {
        "stresslab"
    }

    fn load(explicit: Option<&str>) -> Result<Self> {
        let mut config = match Self::resolve_config_path(explicit) {
            Some(path) if path.exists() => {
                tracing::debug!(path = %path.display(), "Loading config file");
                let content =
                    std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
                Self::from_toml_str(&content)?
            }
            Some(path) => {
                tracing::debug!(path = %path.display(), "Config file absent, using defaults");
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }
}

// ============================================================================
// Tests
// ============================================================================
