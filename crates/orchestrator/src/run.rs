//! Orchestrator - entry operations of the feeder
//!
//! A run goes through: plan -> consult ledger -> submit -> track -> aggregate.
//! Validation is the only fail-fast path; everything after submission is
//! collected and reported as one result.

use contracts::{StatusPublisher, TrackerConfig};
use observability::RunSummary;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::aggregator::aggregate;
use crate::error::{OrchestratorError, Result};
use crate::executor::JobExecutor;
use crate::expander::{FeederRequest, UnitPlanner};
use crate::ledger::{LedgerStore, RunOutput, RunRecord, RuntimeStatus};
use crate::tracker::{ProgressTracker, TrackedUnit};

/// Successful end of a run.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: String,
    /// One summary per unit, in submission order
    pub results: Vec<String>,
    pub summary: RunSummary,
}

/// Drives runs against an executor, a status publisher and a ledger.
pub struct Orchestrator<E, P, L> {
    planner: UnitPlanner,
    executor: E,
    publisher: P,
    ledger: L,
    tracker: TrackerConfig,
    cancel: CancellationToken,
}

impl<E, P, L> Orchestrator<E, P, L>
where
    E: JobExecutor + Sync,
    P: StatusPublisher + Sync,
    L: LedgerStore + Sync,
{
    /// `cancel` should be the token the executor observes.
    pub fn new(
        planner: UnitPlanner,
        executor: E,
        publisher: P,
        ledger: L,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            planner,
            executor,
            publisher,
            ledger,
            tracker: TrackerConfig::default(),
            cancel,
        }
    }

    pub fn with_tracker_config(mut self, tracker: TrackerConfig) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn new_run_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Start a run under a fresh id.
    pub async fn start(&self, request: FeederRequest) -> Result<RunReport> {
        self.start_with_id(&Self::new_run_id(), request).await
    }

    /// Start a run under `run_id`, which must not be known yet.
    pub async fn start_with_id(&self, run_id: &str, request: FeederRequest) -> Result<RunReport> {
        if self.ledger.load(run_id).await?.is_some() {
            return Err(OrchestratorError::RunExists(run_id.to_string()));
        }
        let record = RunRecord::new(run_id, request);
        self.ledger.save(&record).await?;
        info!(run_id, "Run started");
        self.drive(record).await
    }

    /// Continue an interrupted or canceled run.
    ///
    /// Units with a recorded terminal outcome are replayed, not re-submitted.
    pub async fn resume(&self, run_id: &str) -> Result<RunReport> {
        let record = self.status(run_id).await?;
        if matches!(record.status, RuntimeStatus::Completed | RuntimeStatus::Failed) {
            return Err(OrchestratorError::RunFinished(run_id.to_string()));
        }
        info!(run_id, recorded = record.units.len(), "Resuming run");
        self.drive(record).await
    }

    /// Current record of a run.
    pub async fn status(&self, run_id: &str) -> Result<RunRecord> {
        self.ledger
            .load(run_id)
            .await?
            .ok_or_else(|| OrchestratorError::RunNotFound(run_id.to_string()))
    }

    pub async fn list(&self) -> Result<Vec<RunRecord>> {
        Ok(self.ledger.list().await?)
    }

    /// Delete the history of a run.
    pub async fn purge(&self, run_id: &str) -> Result<()> {
        if self.ledger.delete(run_id).await? {
            info!(run_id, "Run purged");
            Ok(())
        } else {
            Err(OrchestratorError::RunNotFound(run_id.to_string()))
        }
    }

    /// Abort the units accepted so far and drain them, leaving the run
    /// `Canceled` and resumable.
    ///
    /// Only this run's handles are aborted; the shared token stays live for
    /// later runs.
    async fn abandon(&self, record: &mut RunRecord, units: Vec<TrackedUnit>) -> Result<()> {
        let abandoned = CancellationToken::new();
        abandoned.cancel();
        ProgressTracker::new(
            &self.publisher,
            &self.ledger,
            self.tracker.status_ceiling_kib,
            &abandoned,
        )
        .track(record, units)
        .await;
        record.status = RuntimeStatus::Canceled;
        self.ledger.save(record).await?;
        Ok(())
    }

    #[instrument(name = "run", skip_all, fields(run_id = %record.run_id))]
    async fn drive(&self, mut record: RunRecord) -> Result<RunReport> {
        let specs = match self.planner.plan(&record.request) {
            Ok(specs) => specs,
            Err(e) => {
                warn!(error = %e, "Request rejected");
                record.finish(
                    RuntimeStatus::Failed,
                    RunOutput::Rejected {
                        message: e.to_string(),
                    },
                );
                self.ledger.save(&record).await?;
                return Err(e.into());
            }
        };

        record.status = RuntimeStatus::Running;
        let mut units = Vec::with_capacity(specs.len());
        let mut submitted = 0;
        for spec in &specs {
            if let Some(outcome) = record.outcome_of(spec) {
                units.push(TrackedUnit::Replayed {
                    spec: spec.clone(),
                    outcome: outcome.clone(),
                });
                continue;
            }
            match self.executor.submit(spec.clone()).await {
                Ok(handle) => {
                    units.push(TrackedUnit::Submitted(handle));
                    submitted += 1;
                }
                Err(e) => {
                    error!(unit = %spec, error = %e, "Submission failed, abandoning run");
                    self.abandon(&mut record, units).await?;
                    return Err(e.into());
                }
            }
        }
        observability::record_units_submitted(submitted);
        info!(
            units = specs.len(),
            submitted,
            replayed = specs.len() - submitted,
            "Units submitted"
        );

        let tracker = ProgressTracker::new(
            &self.publisher,
            &self.ledger,
            self.tracker.status_ceiling_kib,
            &self.cancel,
        );
        let report = tracker.track(&mut record, units).await;
        info!("\n{}", report.summary);

        let result = aggregate(&specs, &report.outcomes);
        let (status, output) = match &result {
            Ok(results) => (
                RuntimeStatus::Completed,
                RunOutput::Results {
                    results: results.clone(),
                },
            ),
            Err(failure) => {
                let status = if self.cancel.is_cancelled() {
                    RuntimeStatus::Canceled
                } else {
                    RuntimeStatus::Failed
                };
                (
                    status,
                    RunOutput::Failures {
                        total: failure.total,
                        failures: failure.failures.clone(),
                    },
                )
            }
        };
        record.finish(status, output);
        self.ledger.save(&record).await?;
        info!(status = ?status, "Run finished");

        let results = result?;
        Ok(RunReport {
            run_id: record.run_id,
            results,
            summary: report.summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Orchestrator;
    use crate::error::OrchestratorError;
    use crate::executor::JobExecutor;
    use crate::expander::{FeederRequest, UnitPlanner};
    use crate::handle::UnitHandle;
    use crate::ledger::{LedgerStore, MemoryLedgerStore, RunOutput, RuntimeStatus};
    use crate::publisher::WatchPublisher;
    use contracts::{
        CatalogConfig, ContractError, FailureKind, UnitOutcome, UnitSpec, UnitStatus,
    };
    use registry::{Registry, StaticCatalog};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    /// Fails units of `SiteB`, refuses to accept `SiteC`, succeeds all others.
    #[derive(Default)]
    struct ScriptedExecutor {
        submitted: AtomicUsize,
    }

    impl JobExecutor for ScriptedExecutor {
        async fn submit(&self, spec: UnitSpec) -> Result<UnitHandle, ContractError> {
            self.submitted.fetch_add(1, Ordering::SeqCst);
            if spec.dimension == "SiteC" {
                return Err(ContractError::Other("executor queue full".into()));
            }
            let outcome = if spec.dimension == "SiteB" {
                UnitOutcome::failed(FailureKind::SinkTransport, "connection reset")
            } else {
                UnitOutcome::finished(format!("sent for {spec}"))
            };
            Ok(UnitHandle::new(spec, tokio::spawn(async move { outcome })))
        }
    }

    fn orchestrator() -> Orchestrator<ScriptedExecutor, WatchPublisher, MemoryLedgerStore> {
        let config = CatalogConfig {
            dimensions: vec!["SiteA".into(), "SiteB".into(), "SiteC".into()],
            subjects: vec!["Tag".into()],
            cutoff_subject: None,
            aliases: BTreeMap::new(),
        };
        let registry = Registry::new(Arc::new(StaticCatalog::from_config(&config)));
        Orchestrator::new(
            UnitPlanner::new(Arc::new(registry)),
            ScriptedExecutor::default(),
            WatchPublisher::new(16),
            MemoryLedgerStore::new(),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn test_completed_run_is_recorded() {
        let orchestrator = orchestrator();
        let report = orchestrator
            .start_with_id("ok", FeederRequest::parse("SiteA", "Tag"))
            .await
            .unwrap();
        assert_eq!(report.results, vec!["sent for SiteA(Tag)"]);

        let record = orchestrator.status("ok").await.unwrap();
        assert_eq!(record.status, RuntimeStatus::Completed);
        assert!(matches!(record.output, Some(RunOutput::Results { .. })));
        assert!(orchestrator.publisher().latest().is_some());
    }

    #[tokio::test]
    async fn test_failures_are_aggregated() {
        let orchestrator = orchestrator();
        let err = orchestrator
            .start_with_id("mixed", FeederRequest::parse("SiteA,SiteB", "Tag"))
            .await
            .unwrap_err();
        let OrchestratorError::Aggregate(failure) = err else {
            panic!("expected aggregate failure, got {err}");
        };
        assert_eq!(failure.total, 2);
        assert_eq!(failure.failures.len(), 1);
        assert_eq!(failure.failures[0].unit, "SiteB(Tag)");

        let record = orchestrator.status("mixed").await.unwrap();
        assert_eq!(record.status, RuntimeStatus::Failed);
        assert!(matches!(
            orchestrator.resume("mixed").await,
            Err(OrchestratorError::RunFinished(_))
        ));
    }

    #[tokio::test]
    async fn test_validation_submits_nothing() {
        let orchestrator = orchestrator();
        let err = orchestrator
            .start_with_id("bad", FeederRequest::parse("Atlantis", "Tag"))
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Validation(_)));
        assert_eq!(orchestrator.executor.submitted.load(Ordering::SeqCst), 0);

        let record = orchestrator.status("bad").await.unwrap();
        assert!(matches!(record.output, Some(RunOutput::Rejected { .. })));
    }

    #[tokio::test]
    async fn test_resume_skips_recorded_units() {
        let orchestrator = orchestrator();
        let mut record = crate::ledger::RunRecord::new("resumed", FeederRequest::parse("SiteA", "Tag"));
        record.status = RuntimeStatus::Canceled;
        record.record_outcome(
            &UnitSpec::new("SiteA".into(), "Tag".into()),
            UnitOutcome::finished("from before"),
        );
        orchestrator.ledger().save(&record).await.unwrap();

        let report = orchestrator.resume("resumed").await.unwrap();
        assert_eq!(report.results, vec!["from before"]);
        assert_eq!(report.summary.replayed, 1);
        assert_eq!(orchestrator.executor.submitted.load(Ordering::SeqCst), 0);
        let record = orchestrator.status("resumed").await.unwrap();
        let unit = UnitSpec::new("SiteA".into(), "Tag".into());
        assert_eq!(record.outcome_of(&unit).unwrap().status(), UnitStatus::Finished);
        assert_eq!(record.status, RuntimeStatus::Completed);
    }

    #[tokio::test]
    async fn test_duplicate_id_and_purge() {
        let orchestrator = orchestrator();
        orchestrator
            .start_with_id("dup", FeederRequest::parse("SiteA", "Tag"))
            .await
            .unwrap();
        assert!(matches!(
            orchestrator
                .start_with_id("dup", FeederRequest::parse("SiteA", "Tag"))
                .await,
            Err(OrchestratorError::RunExists(_))
        ));

        orchestrator.purge("dup").await.unwrap();
        assert!(matches!(
            orchestrator.purge("dup").await,
            Err(OrchestratorError::RunNotFound(_))
        ));
        assert!(orchestrator.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_failure_leaves_orchestrator_usable() {
        let orchestrator = orchestrator();
        let err = orchestrator
            .start_with_id("refused", FeederRequest::parse("SiteA,SiteC", "Tag"))
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Contract(_)));

        let record = orchestrator.status("refused").await.unwrap();
        assert_eq!(record.status, RuntimeStatus::Canceled);
        assert!(record.output.is_none());
        assert!(!orchestrator.cancel.is_cancelled());

        // a later run on the same instance is not born canceled
        let report = orchestrator
            .start_with_id("after", FeederRequest::parse("SiteA", "Tag"))
            .await
            .unwrap();
        assert_eq!(report.results, vec!["sent for SiteA(Tag)"]);
    }
}
