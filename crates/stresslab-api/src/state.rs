//! Shared handler state.

use std::path::{Path, PathBuf};

use stresslab_automation::Automation;

/// State handed to every handler.
///
/// Cheap to clone; the pipeline and its run tracker are shared.
#[derive(Clone, Debug)]
pub struct AppState {
    automation: Automation,
    results_path: PathBuf,
    service_name: String,
}

impl AppState {
    /// State serving the results written by `automation`.
    pub fn new(automation: Automation, service_name: impl Into<String>) -> Self {
        let results_path = automation.results_path().to_path_buf();
        Self {
            automation,
            results_path,
            service_name: service_name.into(),
        }
    }

    /// The simulation pipeline.
    pub fn automation(&self) -> &Automation {
        &self.automation
    }

    /// Results CSV served by the read endpoints.
    pub fn results_path(&self) -> &Path {
        &self.results_path
    }

    /// Name reported by `/health`.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}
