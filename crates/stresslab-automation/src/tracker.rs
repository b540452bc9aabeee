//! Simulation run state.
//!
//! [`RunTracker`] records what the pipeline is doing and lets at most one
//! run proceed at a time. Observers (the HTTP status endpoint, the CLI) read
//! the current [`RunState`] or subscribe to changes.
//!
//! # Usage
//!
//! ```rust
//! use stresslab_automation::tracker::{RunState, RunTracker};
//!
//! let tracker = RunTracker::new();
//! let guard = tracker.try_begin(uuid::Uuid::new_v4()).unwrap();
//! assert!(tracker.state().is_running());
//! assert!(tracker.try_begin(uuid::Uuid::new_v4()).is_err());
//!
//! guard.fail("solver crashed");
//! assert!(matches!(tracker.state(), RunState::Failed { .. }));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use uuid::Uuid;

use crate::{Error, Result};

// ============================================================================
// RunState
// ============================================================================

/// Where the most recent simulation run stands.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RunState {
    /// Nothing has run since start-up.
    Idle,
    /// A run is in progress.
    Running {
        /// Run identifier.
        run_id: Uuid,
        /// When the run started.
        started_at: DateTime<Utc>,
    },
    /// The last run wrote fresh results.
    Succeeded {
        /// Run identifier.
        run_id: Uuid,
        /// When the run finished.
        finished_at: DateTime<Utc>,
    },
    /// The last run failed.
    Failed {
        /// Run identifier.
        run_id: Uuid,
        /// When the run finished.
        finished_at: DateTime<Utc>,
        /// Error message.
        reason: String,
    },
}

impl RunState {
    /// Returns `true` while a run is in progress.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    /// Returns `true` once a run has ended, successfully or not.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running { run_id, .. } => write!(f, "running ({run_id})"),
            Self::Succeeded { run_id, .. } => write!(f, "succeeded ({run_id})"),
            Self::Failed { run_id, reason, .. } => write!(f, "failed ({run_id}): {reason}"),
        }
    }
}

// ============================================================================
// RunTracker
// ============================================================================

/// Shared handle on the run state. Clones observe the same state.
#[derive(Clone)]
pub struct RunTracker {
    inner: Arc<TrackerInner>,
}

struct TrackerInner {
    tx: watch::Sender<RunState>,
    running: AtomicBool,
}

impl RunTracker {
    /// New tracker in [`RunState::Idle`].
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(RunState::Idle);
        Self {
            inner: Arc::new(TrackerInner {
                tx,
                running: AtomicBool::new(false),
            }),
        }
    }

    /// Current state.
    pub fn state(&self) -> RunState {
        self.inner.tx.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.inner.tx.subscribe()
    }

    /// Claim the single run slot.
    ///
    /// Returns [`Error::Busy`] if another run holds it.
    pub fn try_begin(&self, run_id: Uuid) -> Result<RunGuard> {
        if self
            .inner
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::Busy);
        }
        self.set_state(RunState::Running {
            run_id,
            started_at: Utc::now(),
        });
        Ok(RunGuard {
            tracker: self.clone(),
            run_id,
            finished: false,
        })
    }

    /// Wait until no run is in progress, or until `timeout` elapses.
    pub async fn wait_finished(&self, timeout: Duration) -> std::result::Result<RunState, String> {
        let mut rx = self.subscribe();
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        {
            let state = rx.borrow_and_update().clone();
            if !state.is_running() {
                return Ok(state);
            }
        }

        loop {
            tokio::select! {
                _ = &mut deadline => {
                    return Err(format!("run still in progress after {timeout:?}"));
                }
                result = rx.changed() => {
                    if result.is_err() {
                        return Err("run tracker closed".to_string());
                    }
                    let state = rx.borrow().clone();
                    if !state.is_running() {
                        return Ok(state);
                    }
                }
            }
        }
    }

    fn set_state(&self, state: RunState) {
        tracing::info!("Simulation run → {state}");
        self.inner.tx.send_replace(state);
    }
}

impl Default for RunTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RunTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunTracker")
            .field("state", &self.state())
            .finish()
    }
}

// ============================================================================
// RunGuard
// ============================================================================

/// Holds the run slot. Released on [`succeed`](Self::succeed),
/// [`fail`](Self::fail), or drop; dropping an unfinished guard records the
/// run as failed.
#[must_use = "dropping the guard immediately ends the run"]
pub struct RunGuard {
    tracker: RunTracker,
    run_id: Uuid,
    finished: bool,
}

impl RunGuard {
    /// Identifier of the claimed run.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Record success and release the slot.
    pub fn succeed(mut self) {
        self.finish(RunState::Succeeded {
            run_id: self.run_id,
            finished_at: Utc::now(),
        });
    }

    /// Record failure and release the slot.
    pub fn fail(mut self, reason: impl Into<String>) {
        self.finish(RunState::Failed {
            run_id: self.run_id,
            finished_at: Utc::now(),
            reason: reason.into(),
        });
    }

    fn finish(&mut self, state: RunState) {
        self.finished = true;
        self.tracker.set_state(state);
        self.tracker.inner.running.store(false, Ordering::Release);
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if !self.finished {
            let state = RunState::Failed {
                run_id: self.run_id,
                finished_at: Utc::now(),
                reason: "run aborted".to_string(),
            };
            self.finish(state);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_idle() {
        let tracker = RunTracker::new();
        assert_eq!(tracker.state(), RunState::Idle);
        assert_eq!(tracker.state().to_string(), "idle");
    }

    #[test]
    fn test_begin_and_succeed() {
        let tracker = RunTracker::new();
        let id = Uuid::new_v4();
        let guard = tracker.try_begin(id).unwrap();
        assert_eq!(guard.run_id(), id);
        assert!(tracker.state().is_running());

        guard.succeed();
        let state = tracker.state();
        assert!(state.is_finished());
        assert!(matches!(state, RunState::Succeeded { run_id, .. } if run_id == id));
    }

    #[test]
    fn test_second_run_is_busy() {
        let tracker = RunTracker::new();
        let _guard = tracker.try_begin(Uuid::new_v4()).unwrap();
        let err = tracker.try_begin(Uuid::new_v4()).err().unwrap();
        assert!(err.is_busy());
    }

    #[test]
    fn test_slot_released_after_fail() {
        let tracker = RunTracker::new();
        tracker.try_begin(Uuid::new_v4()).unwrap().fail("boom");
        assert!(matches!(tracker.state(), RunState::Failed { ref reason, .. } if reason == "boom"));
        assert!(tracker.try_begin(Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_dropped_guard_marks_aborted() {
        let tracker = RunTracker::new();
        {
            let _guard = tracker.try_begin(Uuid::new_v4()).unwrap();
        }
        assert!(
            matches!(tracker.state(), RunState::Failed { ref reason, .. } if reason == "run aborted")
        );
        assert!(tracker.try_begin(Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_clone_shares_state() {
        let t1 = RunTracker::new();
        let t2 = t1.clone();
        let _guard = t1.try_begin(Uuid::new_v4()).unwrap();
        assert!(t2.state().is_running());
        assert!(t2.try_begin(Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_state_serializes_with_tag() {
        let json = serde_json::to_value(RunState::Idle).unwrap();
        assert_eq!(json["state"], "idle");

        let id = Uuid::new_v4();
        let json = serde_json::to_value(RunState::Failed {
            run_id: id,
            finished_at: Utc::now(),
            reason: "x".into(),
        })
        .unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["reason"], "x");
        assert_eq!(json["run_id"], id.to_string());
    }

    #[tokio::test]
    async fn test_wait_finished_when_idle() {
        let tracker = RunTracker::new();
        let state = tracker.wait_finished(Duration::from_millis(50)).await.unwrap();
        assert_eq!(state, RunState::Idle);
    }

    #[tokio::test]
    async fn test_wait_finished_after_run() {
        let tracker = RunTracker::new();
        let guard = tracker.try_begin(Uuid::new_v4()).unwrap();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            guard.succeed();
        });

        let state = tracker.wait_finished(Duration::from_secs(1)).await.unwrap();
        assert!(matches!(state, RunState::Succeeded { .. }));
    }

    #[tokio::test]
    async fn test_wait_finished_timeout() {
        let tracker = RunTracker::new();
        let _guard = tracker.try_begin(Uuid::new_v4()).unwrap();
        let err = tracker
            .wait_finished(Duration::from_millis(30))
            .await
            .unwrap_err();
        assert!(err.contains("still in progress"));
    }

    fn _assert_send_sync<T: Send + Sync>() {}
    #[test]
    fn test_tracker_send_sync() {
        _assert_send_sync::<RunTracker>();
        _assert_send_sync::<RunState>();
        _assert_send_sync::<RunGuard>();
    }
}
