//! # Integration Tests
//!
//! End-to-end tests across the feeder crates.
//!
//! Covers:
//! - blueprint -> JSON-lines source -> file sink
//! - aggregate failure, validation failure, cutoff expansion
//! - degraded progress reporting
//! - resume from the ledger, cancellation

#[cfg(test)]
mod e2e_tests {
    use std::collections::{BTreeMap, HashSet};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use contracts::{
        check_transport_ceiling, BatchSink, CatalogConfig, ContractError, EventStream,
        FailureKind, OutboundMessage, ProgressSnapshot, QuerySource, SinkError, StatusPublisher,
        TrackerConfig, UnitSpec, DEFAULT_TRANSPORT_CEILING_KIB,
    };
    use dispatcher::UnitPipeline;
    use ingestion::{EnvelopeMapper, MemorySource};
    use orchestrator::{
        FeederRequest, FileLedgerStore, LedgerStore, MemoryLedgerStore, Orchestrator,
        OrchestratorError, RunOutput, RunRecord, RuntimeStatus, TaskExecutor, UnitPlanner,
    };
    use registry::{Registry, StaticCatalog};
    use tokio_util::sync::CancellationToken;

    /// Records every delivered batch; fails batches of listed dimensions.
    #[derive(Clone, Default)]
    struct RecordingSink {
        delivered: Arc<Mutex<Vec<(String, usize)>>>,
        failing: HashSet<String>,
    }

    impl RecordingSink {
        fn failing(dimensions: &[&str]) -> Self {
            Self {
                failing: dimensions.iter().map(|d| d.to_string()).collect(),
                ..Self::default()
            }
        }

        fn delivered(&self) -> Vec<(String, usize)> {
            self.delivered.lock().unwrap().clone()
        }
    }

    impl BatchSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send_batch(&self, batch: &[OutboundMessage]) -> Result<(), SinkError> {
            let dimension = batch[0].dimension.to_string();
            if self.failing.contains(&dimension) {
                return Err(SinkError::transport("recording", "connection reset by peer"));
            }
            self.delivered.lock().unwrap().push((dimension, batch.len()));
            Ok(())
        }
    }

    /// Keeps every published snapshot, enforcing the transport ceiling.
    #[derive(Default)]
    struct HistoryPublisher {
        history: Mutex<Vec<ProgressSnapshot>>,
    }

    impl HistoryPublisher {
        fn history(&self) -> Vec<ProgressSnapshot> {
            self.history.lock().unwrap().clone()
        }
    }

    impl StatusPublisher for HistoryPublisher {
        async fn publish(&self, _run_id: &str, snapshot: &ProgressSnapshot) -> Result<(), ContractError> {
            check_transport_ceiling(snapshot, DEFAULT_TRANSPORT_CEILING_KIB)?;
            self.history.lock().unwrap().push(snapshot.clone());
            Ok(())
        }
    }

    /// Never answers before the run is canceled.
    struct StalledSource;

    impl QuerySource for StalledSource {
        async fn fetch(&self, _unit: &UnitSpec) -> Result<EventStream, ContractError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(ContractError::query("stalled", "timed out"))
        }
    }

    type Feeder<Q, L> =
        Orchestrator<TaskExecutor<Q, EnvelopeMapper, RecordingSink>, HistoryPublisher, L>;

    fn planner(dimensions: Vec<String>, subjects: &[&str], cutoff: Option<&str>) -> UnitPlanner {
        let config = CatalogConfig {
            dimensions,
            subjects: subjects.iter().map(|s| s.to_string()).collect(),
            cutoff_subject: cutoff.map(str::to_string),
            aliases: BTreeMap::from([(
                "ALL_SITES".to_string(),
                vec!["SiteA".to_string(), "SiteB".to_string(), "SiteC".to_string()],
            )]),
        };
        let registry = Registry::new(Arc::new(StaticCatalog::from_config(&config)));
        UnitPlanner::new(Arc::new(registry))
    }

    fn sites() -> UnitPlanner {
        planner(
            vec!["SiteA".into(), "SiteB".into(), "SiteC".into()],
            &["Tag", "Project", "WorkOrderCutoff"],
            Some("WorkOrderCutoff"),
        )
    }

    fn feeder<Q, L>(planner: UnitPlanner, source: Q, sink: RecordingSink, ledger: L) -> Feeder<Q, L>
    where
        Q: QuerySource + Send + Sync + 'static,
        L: LedgerStore + Sync,
    {
        feeder_with_cancel(planner, source, sink, ledger, CancellationToken::new())
    }

    fn feeder_with_cancel<Q, L>(
        planner: UnitPlanner,
        source: Q,
        sink: RecordingSink,
        ledger: L,
        cancel: CancellationToken,
    ) -> Feeder<Q, L>
    where
        Q: QuerySource + Send + Sync + 'static,
        L: LedgerStore + Sync,
    {
        let pipeline = Arc::new(UnitPipeline::new(source, EnvelopeMapper, sink));
        let executor = TaskExecutor::new(pipeline, 8, cancel.clone());
        Orchestrator::new(planner, executor, HistoryPublisher::default(), ledger, cancel)
    }

    fn unit(dimension: &str, subject: &str) -> UnitSpec {
        UnitSpec::new(dimension.into(), subject.into())
    }

    fn detailed(snapshot: &ProgressSnapshot) -> Vec<String> {
        match snapshot {
            ProgressSnapshot::Detailed(labels) => labels.clone(),
            ProgressSnapshot::Summary(s) => panic!("unexpected summary {s}"),
        }
    }

    /// SiteA sends 40 messages in one batch, SiteB hits a transport error.
    #[tokio::test]
    async fn test_one_failed_unit_gives_aggregate_failure() {
        let source = MemorySource::new()
            .with_generated(&unit("SiteA", "Tag"), 40)
            .with_generated(&unit("SiteB", "Tag"), 40);
        let sink = RecordingSink::failing(&["SiteB"]);
        let feeder = feeder(sites(), source, sink.clone(), MemoryLedgerStore::new());

        let err = feeder
            .start_with_id("mixed", FeederRequest::parse("SiteA,SiteB", "Tag"))
            .await
            .unwrap_err();

        let OrchestratorError::Aggregate(failure) = err else {
            panic!("expected aggregate failure, got {err}");
        };
        assert_eq!(failure.total, 2);
        assert_eq!(failure.failures.len(), 1);
        assert_eq!(failure.failures[0].unit, "SiteB(Tag)");
        assert_eq!(failure.failures[0].failure.kind, FailureKind::SinkTransport);

        assert_eq!(sink.delivered(), vec![("SiteA".to_string(), 40)]);

        let record = feeder.status("mixed").await.unwrap();
        assert_eq!(record.status, RuntimeStatus::Failed);
        let last = detailed(record.last_snapshot.as_ref().unwrap());
        assert_eq!(last, vec!["SiteA(Tag): Finished", "SiteB(Tag): Failed"]);
    }

    #[tokio::test]
    async fn test_successful_run_orders_results_and_batches() {
        let source = MemorySource::new()
            .with_generated(&unit("SiteB", "Tag"), 600)
            .with_generated(&unit("SiteC", "Tag"), 3);
        let sink = RecordingSink::default();
        let feeder = feeder(sites(), source, sink.clone(), MemoryLedgerStore::new());

        let report = feeder
            .start(FeederRequest::parse("all_sites", "Tag"))
            .await
            .unwrap();

        assert_eq!(
            report.results,
            vec![
                "found no events for SiteA(Tag)",
                "finished successfully sending 600 messages to recording for SiteB(Tag)",
                "finished successfully sending 3 messages to recording for SiteC(Tag)",
            ]
        );

        let site_b: Vec<usize> = sink
            .delivered()
            .into_iter()
            .filter(|(d, _)| d == "SiteB")
            .map(|(_, n)| n)
            .collect();
        assert_eq!(site_b, vec![250, 250, 100]);

        // initial snapshot plus one per unit
        assert_eq!(feeder.publisher().history().len(), 4);
    }

    #[tokio::test]
    async fn test_unknown_dimension_submits_nothing() {
        let sink = RecordingSink::default();
        let feeder = feeder(sites(), MemorySource::new(), sink.clone(), MemoryLedgerStore::new());

        for subjects in ["Tag", "all", "WorkOrderCutoff"] {
            let run_id = format!("rejected-{}", subjects.to_lowercase());
            let err = feeder
                .start_with_id(&run_id, FeederRequest::parse("Atlantis", subjects))
                .await
                .unwrap_err();
            assert!(matches!(err, OrchestratorError::Validation(_)));

            let record = feeder.status(&run_id).await.unwrap();
            assert!(record.units.is_empty());
            let Some(RunOutput::Rejected { message }) = record.output else {
                panic!("expected rejection");
            };
            assert!(message.starts_with("Please provide a valid dimension"));
        }
        assert!(feeder.publisher().history().is_empty());
        assert!(sink.delivered().is_empty());
    }

    #[tokio::test]
    async fn test_cutoff_subject_runs_twelve_monthly_units() {
        let march = UnitSpec::with_sub_key("SiteC".into(), "WorkOrderCutoff".into(), "03");
        let source = MemorySource::new().with_generated(&march, 5);
        let feeder = feeder(sites(), source, RecordingSink::default(), MemoryLedgerStore::new());

        let report = feeder
            .start(FeederRequest::parse("SiteC", "WorkOrderCutoff"))
            .await
            .unwrap();

        assert_eq!(report.results.len(), 12);
        assert_eq!(
            report.results[2],
            "finished successfully sending 5 messages to recording for SiteC(WorkOrderCutoff 03)"
        );
        assert_eq!(report.results[11], "found no events for SiteC(WorkOrderCutoff 12)");

        let history = feeder.publisher().history();
        let labels = detailed(&history[0]);
        for (label, month) in labels.iter().zip(contracts::CUTOFF_MONTHS) {
            assert!(label.contains(month), "{label} lacks {month}");
        }
    }

    #[tokio::test]
    async fn test_large_run_publishes_count_only() {
        let dimensions: Vec<String> = (0..1000).map(|i| format!("D{i:04}")).collect();
        let planner = planner(dimensions.clone(), &["Tag"], None);
        let feeder = feeder(planner, MemorySource::new(), RecordingSink::default(), MemoryLedgerStore::new());

        let report = feeder
            .start(FeederRequest::new(dimensions, ["Tag"]))
            .await
            .unwrap();

        assert_eq!(report.results.len(), 1000);
        assert_eq!(
            feeder.publisher().history(),
            vec![ProgressSnapshot::too_large(1000)]
        );
    }

    #[tokio::test]
    async fn test_small_run_publishes_detail() {
        let feeder = feeder(sites(), MemorySource::new(), RecordingSink::default(), MemoryLedgerStore::new());
        feeder.start(FeederRequest::parse("SiteA", "Tag")).await.unwrap();

        let history = feeder.publisher().history();
        assert_eq!(detailed(&history[0]), vec!["SiteA(Tag): "]);
        assert_eq!(detailed(&history[1]), vec!["SiteA(Tag): Finished"]);
    }

    /// A and B finished before a restart; only C runs and is published.
    #[tokio::test]
    async fn test_resume_replays_terminal_units() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FileLedgerStore::new(dir.path());

        let mut record = RunRecord::new("resume-me", FeederRequest::parse("SiteA,SiteB,SiteC", "Tag"));
        record.record_outcome(&unit("SiteA", "Tag"), contracts::UnitOutcome::finished("a done"));
        record.record_outcome(&unit("SiteB", "Tag"), contracts::UnitOutcome::finished("b done"));
        record.record_snapshot(ProgressSnapshot::Detailed(vec![
            "SiteA(Tag): Finished".into(),
            "SiteB(Tag): Finished".into(),
            "SiteC(Tag): ".into(),
        ]));
        ledger.save(&record).await.unwrap();

        let source = MemorySource::new()
            .with_generated(&unit("SiteA", "Tag"), 10)
            .with_generated(&unit("SiteB", "Tag"), 10)
            .with_generated(&unit("SiteC", "Tag"), 7);
        let sink = RecordingSink::default();
        let feeder = feeder(sites(), source, sink.clone(), ledger);

        let report = feeder.resume("resume-me").await.unwrap();
        assert_eq!(report.results[0], "a done");
        assert_eq!(report.results[1], "b done");
        assert!(report.results[2].contains("7 messages"));
        assert_eq!(report.summary.replayed, 2);

        assert_eq!(sink.delivered(), vec![("SiteC".to_string(), 7)]);
        let history = feeder.publisher().history();
        assert_eq!(history.len(), 1);
        assert_eq!(
            detailed(&history[0]),
            vec!["SiteA(Tag): Finished", "SiteB(Tag): Finished", "SiteC(Tag): Finished"]
        );

        let record = feeder.status("resume-me").await.unwrap();
        assert_eq!(record.status, RuntimeStatus::Completed);
        assert!(matches!(
            feeder.resume("resume-me").await,
            Err(OrchestratorError::RunFinished(_))
        ));
    }

    #[tokio::test]
    async fn test_canceled_run_can_be_resumed() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();
        let stalled = feeder_with_cancel(
            sites(),
            StalledSource,
            RecordingSink::default(),
            FileLedgerStore::new(dir.path()),
            cancel.clone(),
        );

        let (result, ()) = tokio::join!(
            stalled.start_with_id("interrupted", FeederRequest::parse("SiteA,SiteB", "Tag")),
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                cancel.cancel();
            }
        );
        let Err(OrchestratorError::Aggregate(failure)) = result else {
            panic!("expected aggregate failure");
        };
        assert_eq!(failure.failures.len(), 2);
        assert!(failure
            .failures
            .iter()
            .all(|f| f.failure.kind == FailureKind::Canceled));

        let record = stalled.status("interrupted").await.unwrap();
        assert_eq!(record.status, RuntimeStatus::Canceled);
        assert!(record.units.is_empty());

        let source = MemorySource::new().with_generated(&unit("SiteA", "Tag"), 2);
        let sink = RecordingSink::default();
        let fresh = feeder(sites(), source, sink.clone(), FileLedgerStore::new(dir.path()));
        let report = fresh.resume("interrupted").await.unwrap();
        assert_eq!(report.results.len(), 2);
        assert_eq!(sink.delivered(), vec![("SiteA".to_string(), 2)]);
    }

    /// Full stack from a TOML blueprint: JSON-lines files in, JSON lines out.
    #[tokio::test]
    async fn test_blueprint_to_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir_all(data.join("SiteA")).unwrap();
        std::fs::write(
            data.join("SiteA/Tag.jsonl"),
            "{\"tag\":\"P-101\",\"note\":null}\n\n[{\"tag\":\"P-102\"},{\"tag\":\"P-103\"}]\n{\"note\":null}\n",
        )
        .unwrap();
        let out = dir.path().join("out/messages.jsonl");

        let toml = format!(
            r#"
[catalog]
dimensions = ["SiteA", "SiteB"]
subjects = ["Tag"]

[source]
root = "{}"

[sink]
name = "archive"
sink_type = "file"
params = {{ path = "{}" }}

[dispatch]
batch_size = 2

[ledger]
dir = "{}"
"#,
            data.display(),
            out.display(),
            dir.path().join("runs").display()
        );
        let blueprint =
            config_loader::ConfigLoader::load_from_str(&toml, config_loader::ConfigFormat::Toml)
                .unwrap();
        std::fs::create_dir_all(out.parent().unwrap()).unwrap();

        let cancel = CancellationToken::new();
        let planner = UnitPlanner::new(Arc::new(Registry::new(Arc::new(
            StaticCatalog::from_config(&blueprint.catalog),
        ))));
        let pipeline = UnitPipeline::new(
            ingestion::JsonLinesSource::new(blueprint.source.root.clone()),
            EnvelopeMapper,
            dispatcher::create_sink(&blueprint.sink),
        )
        .with_batch_size(blueprint.dispatch.batch_size);
        let executor = TaskExecutor::new(
            Arc::new(pipeline),
            blueprint.executor.max_concurrent_units,
            cancel.clone(),
        );
        let orchestrator = Orchestrator::new(
            planner,
            executor,
            orchestrator::WatchPublisher::new(blueprint.tracker.transport_ceiling_kib),
            FileLedgerStore::new(blueprint.ledger.dir.clone()),
            cancel,
        )
        .with_tracker_config(TrackerConfig::default());

        let report = orchestrator
            .start(FeederRequest::parse("SiteA,SiteB", "Tag"))
            .await
            .unwrap();
        assert_eq!(
            report.results,
            vec![
                "finished successfully sending 3 messages to archive for SiteA(Tag)",
                "found no events for SiteB(Tag)",
            ]
        );

        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(written.lines().count(), 3);
        assert!(written.contains("P-103"));
        assert!(!written.contains("note"));

        let runs = orchestrator.list().await.unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, RuntimeStatus::Completed);
    }
}
