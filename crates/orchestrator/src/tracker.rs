//! Bounded progress tracker
//!
//! Owns the unit handles of a run, keeps one label per unit and publishes a
//! full snapshot each time a unit reaches a terminal state. Completions are
//! consumed through `FuturesUnordered`, so each one costs O(1) to observe.

use contracts::{ProgressSnapshot, StatusPublisher, UnitOutcome, UnitSpec, UnitStatus};
use futures::stream::{FuturesUnordered, StreamExt};
use observability::{RunMetricsAggregator, RunSummary};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::handle::UnitHandle;
use crate::ledger::{LedgerStore, RunRecord};

/// A unit as seen by the tracker.
#[derive(Debug)]
pub enum TrackedUnit {
    /// Running on the executor
    Submitted(UnitHandle),
    /// Terminal before this process started; restored from the ledger
    Replayed { spec: UnitSpec, outcome: UnitOutcome },
}

impl TrackedUnit {
    pub fn spec(&self) -> &UnitSpec {
        match self {
            Self::Submitted(handle) => handle.spec(),
            Self::Replayed { spec, .. } => spec,
        }
    }
}

/// Result of tracking a run to completion.
#[derive(Debug)]
pub struct TrackReport {
    /// Terminal outcome per unit, in submission order
    pub outcomes: Vec<UnitOutcome>,
    pub summary: RunSummary,
    pub degraded: bool,
}

/// Single writer over the progress state of one run.
pub struct ProgressTracker<'a, P, L> {
    publisher: &'a P,
    ledger: &'a L,
    status_ceiling_kib: usize,
    cancel: &'a CancellationToken,
}

impl<'a, P, L> ProgressTracker<'a, P, L>
where
    P: StatusPublisher + Sync,
    L: LedgerStore + Sync,
{
    pub fn new(
        publisher: &'a P,
        ledger: &'a L,
        status_ceiling_kib: usize,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            publisher,
            ledger,
            status_ceiling_kib,
            cancel,
        }
    }

    /// Drive every unit to a terminal state.
    ///
    /// Terminal outcomes are written to `record` and persisted as they
    /// arrive, except cancellations, which stay resumable. When the host
    /// cancels, all pending units are aborted and drained.
    #[instrument(name = "track_run", skip_all, fields(run_id = %record.run_id, units = units.len()))]
    pub async fn track(&self, record: &mut RunRecord, units: Vec<TrackedUnit>) -> TrackReport {
        let total = units.len();
        let mut specs = Vec::with_capacity(total);
        let mut statuses = Vec::with_capacity(total);
        let mut outcomes: Vec<Option<UnitOutcome>> = vec![None; total];
        let mut aggregator = RunMetricsAggregator::new();
        let mut pending = FuturesUnordered::new();
        let mut aborts = Vec::new();

        for (idx, unit) in units.into_iter().enumerate() {
            specs.push(unit.spec().clone());
            match unit {
                TrackedUnit::Submitted(handle) => {
                    statuses.push(UnitStatus::Running);
                    aborts.push(handle.abort_handle());
                    pending.push(async move { (idx, handle.join().await) });
                }
                TrackedUnit::Replayed { outcome, .. } => {
                    let status = outcome.status();
                    aggregator.update_replayed(status, outcome.failure().map(|f| f.kind));
                    statuses.push(status);
                    outcomes[idx] = Some(outcome);
                }
            }
        }

        let mut labels: Vec<String> = specs
            .iter()
            .zip(&statuses)
            .map(|(spec, status)| render_label(spec, *status))
            .collect();

        let mut degraded = false;
        self.publish_progress(record, &labels, &mut degraded).await;
        self.persist(record).await;

        let mut aborted = false;
        loop {
            let next = if aborted {
                pending.next().await
            } else {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => {
                        warn!(pending = pending.len(), "Run canceled, abandoning pending units");
                        for handle in &aborts {
                            handle.abort();
                        }
                        aborted = true;
                        continue;
                    }
                    next = pending.next() => next,
                }
            };
            let Some((idx, (outcome, elapsed_ms))) = next else {
                break;
            };

            let status = outcome.status();
            if !statuses[idx].can_advance_to(status) {
                debug!(unit = %specs[idx], from = ?statuses[idx], to = ?status, "Ignoring stale transition");
                continue;
            }
            statuses[idx] = status;
            labels[idx] = render_label(&specs[idx], status);

            let failure = outcome.failure().map(|f| f.kind);
            observability::record_unit_completed(status, elapsed_ms);
            if let Some(kind) = failure {
                observability::record_unit_failure(kind);
            }
            aggregator.update(status, failure, elapsed_ms);

            if status != UnitStatus::Canceled {
                record.record_outcome(&specs[idx], outcome.clone());
            }
            outcomes[idx] = Some(outcome);

            self.publish_progress(record, &labels, &mut degraded).await;
            self.persist(record).await;
        }

        let outcomes = outcomes
            .into_iter()
            .map(|o| o.unwrap_or_else(|| UnitOutcome::canceled("unit never reported")))
            .collect();

        TrackReport {
            outcomes,
            summary: aggregator.summary(),
            degraded,
        }
    }

    /// Publish the full label list, or switch the run to degraded mode the
    /// first time the rendering no longer fits under the status ceiling.
    ///
    /// Once degraded, the count-only notice is published exactly once and
    /// nothing else follows for the rest of the run.
    async fn publish_progress(&self, record: &mut RunRecord, labels: &[String], degraded: &mut bool) {
        if *degraded {
            return;
        }

        let snapshot = ProgressSnapshot::Detailed(labels.to_vec());
        let kib = snapshot.payload_kib();
        if kib > self.status_ceiling_kib {
            info!(
                kib,
                ceiling_kib = self.status_ceiling_kib,
                finished = snapshot.finished_count(),
                "Progress too large for detail, publishing unit count only"
            );
            *degraded = true;
            observability::record_degraded_run(labels.len());
            self.publish(record, ProgressSnapshot::too_large(labels.len())).await;
        } else {
            self.publish(record, snapshot).await;
        }
    }

    /// Publish unless `snapshot` was already published for this run.
    ///
    /// Publisher failures are logged and do not affect unit outcomes.
    async fn publish(&self, record: &mut RunRecord, snapshot: ProgressSnapshot) {
        if record.last_snapshot.as_ref() == Some(&snapshot) {
            debug!("Snapshot already published, suppressing");
            observability::record_snapshot_suppressed();
            return;
        }

        match self.publisher.publish(&record.run_id, &snapshot).await {
            Ok(()) => {
                observability::record_snapshot_published(snapshot.payload_bytes());
                record.record_snapshot(snapshot);
            }
            Err(e) => warn!(error = %e, "Failed to publish progress"),
        }
    }

    async fn persist(&self, record: &RunRecord) {
        if let Err(e) = self.ledger.save(record).await {
            warn!(error = %e, "Failed to persist run record");
        }
    }
}

fn render_label(spec: &UnitSpec, status: UnitStatus) -> String {
    format!("{}{}", spec.label(), status.marker())
}
