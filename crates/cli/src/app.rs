//! Wiring of a blueprint into a ready orchestrator.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use contracts::FeederBlueprint;
use dispatcher::{create_sink, AnySink, UnitPipeline};
use ingestion::{EnvelopeMapper, JsonLinesSource};
use orchestrator::{FileLedgerStore, LogPublisher, Orchestrator, TaskExecutor, UnitPlanner};
use registry::{Registry, StaticCatalog};
use tokio_util::sync::CancellationToken;
use tracing::info;

pub type FeederExecutor = TaskExecutor<JsonLinesSource, EnvelopeMapper, AnySink>;
pub type Feeder = Orchestrator<FeederExecutor, LogPublisher, FileLedgerStore>;

/// Load and validate the blueprint at `path`.
pub fn load_blueprint(path: &Path) -> Result<FeederBlueprint> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", path.display());
    }
    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Build the orchestrator described by `blueprint`.
///
/// `cancel` is shared by the executor and the tracker.
pub fn build(blueprint: &FeederBlueprint, cancel: CancellationToken) -> Feeder {
    let catalog = Arc::new(StaticCatalog::from_config(&blueprint.catalog));
    let planner = UnitPlanner::new(Arc::new(Registry::new(catalog)));

    let pipeline = UnitPipeline::new(
        JsonLinesSource::new(blueprint.source.root.clone()),
        EnvelopeMapper,
        create_sink(&blueprint.sink),
    )
    .with_batch_size(blueprint.dispatch.batch_size);

    let executor = TaskExecutor::new(
        Arc::new(pipeline),
        blueprint.executor.max_concurrent_units,
        cancel.clone(),
    );

    info!(
        source = %blueprint.source.root.display(),
        sink = %blueprint.sink.name,
        batch_size = blueprint.dispatch.batch_size,
        max_concurrent_units = blueprint.executor.max_concurrent_units,
        ledger = %blueprint.ledger.dir.display(),
        "Feeder assembled"
    );

    Orchestrator::new(
        planner,
        executor,
        LogPublisher::new(blueprint.tracker.transport_ceiling_kib),
        FileLedgerStore::new(blueprint.ledger.dir.clone()),
        cancel,
    )
    .with_tracker_config(blueprint.tracker.clone())
}
