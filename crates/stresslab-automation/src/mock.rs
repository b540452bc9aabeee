//! In-process engine double.
//!
//! [`MockEngine`] never launches a solver. It records every deck it is
//! given and answers with canned nodal stress text, or with a canned
//! failure. Used by tests and by `--mock` runs of the CLI.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::deck::ApdlDeck;
use crate::engine::{EngineOutput, SimulationEngine, Workspace};
use crate::{Error, Result};

#[derive(Clone, Debug)]
enum Behavior {
    Succeed(String),
    Fail(String),
}

/// Engine that returns canned results.
#[derive(Clone, Debug)]
pub struct MockEngine {
    behavior: Behavior,
    delay: Duration,
    decks: Arc<Mutex<Vec<String>>>,
}

impl MockEngine {
    /// Succeed with the given raw nodal stress text.
    pub fn with_raw_output(raw: impl Into<String>) -> Self {
        Self {
            behavior: Behavior::Succeed(raw.into()),
            delay: Duration::ZERO,
            decks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Succeed with `(node, values)` rows, formatted the way the solver
    /// writes them.
    pub fn with_nodal_stress(rows: &[(u64, Vec<f64>)]) -> Self {
        let raw = rows
            .iter()
            .map(|(node, values)| {
                let mut line = format!("{node:>9}.,  1.");
                for v in values {
                    line.push_str(&format!(",{v:>16.8E}"));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n");
        Self::with_raw_output(raw)
    }

    /// A small cantilever-like sample: five nodes of SX.
    pub fn sample() -> Self {
        Self::with_nodal_stress(&[
            (1, vec![-1.52e6]),
            (2, vec![-7.41e5]),
            (3, vec![1.3e4]),
            (4, vec![7.77e5]),
            (5, vec![1.49e6]),
        ])
    }

    /// Always fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            behavior: Behavior::Fail(message.into()),
            delay: Duration::ZERO,
            decks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Sleep this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Rendered decks received so far.
    pub fn decks(&self) -> Vec<String> {
        self.decks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl SimulationEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn execute(&self, deck: &ApdlDeck, workspace: &Workspace) -> Result<EngineOutput> {
        tracing::debug!(jobname = workspace.jobname(), "Mock engine received deck");
        self.decks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(deck.render());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.behavior {
            Behavior::Succeed(raw) => Ok(EngineOutput {
                raw_stress: raw.clone(),
                log_tail: "mock run".to_string(),
                elapsed: self.delay,
            }),
            Behavior::Fail(message) => Err(Error::Engine {
                message: message.clone(),
                log_tail: format!(" *** ERROR ***\n {message}"),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::stress::parse_nodal_stress;
    use stresslab_core::StressComponent;

    #[tokio::test]
    async fn test_mock_records_decks() {
        let engine = MockEngine::sample();
        let mut deck = ApdlDeck::new();
        deck.prep7();

        engine
            .execute(&deck, &Workspace::new("/tmp", "job"))
            .await
            .unwrap();
        assert_eq!(engine.decks(), vec!["/PREP7\n".to_string()]);
    }

    #[tokio::test]
    async fn test_nodal_stress_format_parses() {
        let engine = MockEngine::with_nodal_stress(&[(7, vec![-2.5e5, 3.0])]);
        let out = engine
            .execute(&ApdlDeck::new(), &Workspace::new("/tmp", "job"))
            .await
            .unwrap();
        let table =
            parse_nodal_stress(&out.raw_stress, &[StressComponent::X, StressComponent::Y])
                .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0][0], serde_json::json!(7));
        assert_eq!(table.rows()[0][1].as_f64(), Some(-2.5e5));
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let engine = MockEngine::failing("license server unreachable");
        let err = engine
            .execute(&ApdlDeck::new(), &Workspace::new("/tmp", "job"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("license server unreachable"));
    }
}
