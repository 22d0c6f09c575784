//! UnitHandle - await-handle of one submitted unit

use std::time::Instant;

use contracts::{FailureKind, UnitOutcome, UnitSpec};
use tokio::task::{AbortHandle, JoinError, JoinHandle};
use tracing::{debug, error};

/// Handle to a unit running on the executor
#[derive(Debug)]
pub struct UnitHandle {
    spec: UnitSpec,
    task: JoinHandle<UnitOutcome>,
    started: Instant,
}

impl UnitHandle {
    pub fn new(spec: UnitSpec, task: JoinHandle<UnitOutcome>) -> Self {
        Self {
            spec,
            task,
            started: Instant::now(),
        }
    }

    pub fn spec(&self) -> &UnitSpec {
        &self.spec
    }

    /// Abort the unit without consuming the handle.
    pub fn abort_handle(&self) -> AbortHandle {
        self.task.abort_handle()
    }

    /// Wait for the unit's terminal state.
    ///
    /// Panics and aborts become `Failed(Panicked)` and `Canceled` outcomes;
    /// the returned duration is measured from submission.
    pub async fn join(self) -> (UnitOutcome, f64) {
        let outcome = match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => outcome_from_join_error(&self.spec, e),
        };
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        debug!(unit = %self.spec, status = ?outcome.status(), elapsed_ms, "Unit terminal");
        (outcome, elapsed_ms)
    }
}

fn outcome_from_join_error(spec: &UnitSpec, e: JoinError) -> UnitOutcome {
    if e.is_cancelled() {
        return UnitOutcome::canceled("unit aborted");
    }
    error!(unit = %spec, error = %e, "Unit task panicked");
    let message = match e.try_into_panic() {
        Ok(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string()),
        Err(e) => e.to_string(),
    };
    UnitOutcome::failed(FailureKind::Panicked, message)
}
