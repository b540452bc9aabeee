//! MAPDL batch-mode engine.
//!
//! Writes the deck to `<jobname>.inp` and launches
//! `<executable> -b -i <jobname>.inp -o <jobname>.out -j <jobname>` inside
//! the workspace directory. File arguments are relative to that directory.
//! The child is killed if it outlives the timeout.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use stresslab_core::EngineConfig;
use tokio::process::Command;

use crate::deck::ApdlDeck;
use crate::engine::{EngineOutput, SimulationEngine, Workspace};
use crate::{Error, Result};

/// Lines of solver log kept for error reports.
const LOG_TAIL_LINES: usize = 40;

/// Runs decks through a locally installed MAPDL in batch mode.
#[derive(Clone, Debug)]
pub struct MapdlBatchEngine {
    executable: String,
    args: Vec<String>,
    timeout: Duration,
}

impl MapdlBatchEngine {
    /// Engine for `executable` with the given extra args and timeout.
    pub fn new(executable: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            executable: executable.into(),
            args,
            timeout,
        }
    }

    /// Engine configured from the `[engine]` section.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.executable.clone(),
            config.args.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn command(&self, workspace: &Workspace) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.arg("-b")
            .arg("-i")
            .arg(workspace.input_file_name())
            .arg("-o")
            .arg(workspace.log_file_name())
            .arg("-j")
            .arg(workspace.jobname())
            .args(&self.args)
            .current_dir(workspace.dir())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl SimulationEngine for MapdlBatchEngine {
    fn name(&self) -> &str {
        "mapdl-batch"
    }

    async fn execute(&self, deck: &ApdlDeck, workspace: &Workspace) -> Result<EngineOutput> {
        let dir = workspace.dir();
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| Error::io(dir, e))?;

        let input = workspace.input_path();
        tokio::fs::write(&input, deck.render())
            .await
            .map_err(|e| Error::io(&input, e))?;

        let stress_path = workspace.stress_path();
        match tokio::fs::remove_file(&stress_path).await {
            Ok(()) => tracing::debug!(path = %stress_path.display(), "Removed stale stress output"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::io(&stress_path, e)),
        }

        tracing::info!(
            executable = %self.executable,
            input = %input.display(),
            timeout_secs = self.timeout.as_secs(),
            "Launching MAPDL in batch mode"
        );

        let started = Instant::now();
        let child = self.command(workspace).spawn().map_err(|source| Error::Spawn {
            executable: self.executable.clone(),
            source,
        })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| Error::io(&input, e))?,
            Err(_) => {
                tracing::error!(timeout_secs = self.timeout.as_secs(), "MAPDL timed out");
                return Err(Error::Timeout {
                    seconds: self.timeout.as_secs(),
                });
            }
        };
        let elapsed = started.elapsed();

        let log_tail = match tokio::fs::read_to_string(workspace.log_path()).await {
            Ok(log) => tail(&log, LOG_TAIL_LINES),
            Err(_) => tail(&String::from_utf8_lossy(&output.stderr), LOG_TAIL_LINES),
        };

        if !output.status.success() {
            tracing::error!(status = %output.status, "MAPDL exited with failure");
            return Err(Error::Engine {
                message: format!("MAPDL exited with {}", output.status),
                log_tail,
            });
        }

        let raw_stress = match tokio::fs::read_to_string(&stress_path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::MissingOutput { path: stress_path });
            }
            Err(e) => return Err(Error::io(&stress_path, e)),
        };

        tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "MAPDL finished");
        Ok(EngineOutput {
            raw_stress,
            log_tail,
            elapsed,
        })
    }
}

/// Last `n` lines of `text`.
fn tail(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tail() {
        assert_eq!(tail("a\nb\nc\n", 2), "b\nc");
        assert_eq!(tail("a", 5), "a");
        assert_eq!(tail("", 5), "");
    }

    #[test]
    fn test_from_config() {
        let config = EngineConfig {
            executable: "/opt/ansys/bin/mapdl".to_string(),
            args: vec!["-np".to_string(), "4".to_string()],
            timeout_secs: 90,
            ..Default::default()
        };
        let engine = MapdlBatchEngine::from_config(&config);
        assert_eq!(engine.executable, "/opt/ansys/bin/mapdl");
        assert_eq!(engine.args, vec!["-np", "4"]);
        assert_eq!(engine.timeout, Duration::from_secs(90));
        assert_eq!(engine.name(), "mapdl-batch");
    }

    #[tokio::test]
    async fn test_missing_executable_is_spawn_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let engine = MapdlBatchEngine::new(
            "stresslab-no-such-solver-binary",
            Vec::new(),
            Duration::from_secs(5),
        );
        let ws = Workspace::new(dir.path(), "job");
        let mut deck = ApdlDeck::new();
        deck.prep7().finish();

        let err = engine.execute(&deck, &ws).await.unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
        assert!(ws.input_path().exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_solver_reports_engine_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let engine = MapdlBatchEngine::new("false", Vec::new(), Duration::from_secs(5));
        let ws = Workspace::new(dir.path(), "job");

        let err = engine.execute(&ApdlDeck::new(), &ws).await.unwrap_err();
        assert!(matches!(err, Error::Engine { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hung_solver_is_killed_at_timeout() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("hung-solver.sh");
        std::fs::write(&script, "#!/bin/sh\nexec sleep 30\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let engine = MapdlBatchEngine::new(
            script.to_string_lossy(),
            Vec::new(),
            Duration::from_secs(1),
        );
        let ws = Workspace::new(dir.path().join("work"), "job");

        let started = Instant::now();
        let err = engine.execute(&ApdlDeck::new(), &ws).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { seconds: 1 }));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_solver_without_output_is_missing_output() {
        let dir = tempfile::TempDir::new().unwrap();
        let engine = MapdlBatchEngine::new("true", Vec::new(), Duration::from_secs(5));
        let ws = Workspace::new(dir.path(), "job");

        let err = engine.execute(&ApdlDeck::new(), &ws).await.unwrap_err();
        assert!(matches!(err, Error::MissingOutput { .. }));
    }
}
