//! Job execution - submits units as tokio tasks

use std::sync::Arc;

use contracts::{BatchSink, ContractError, MessageMapper, QuerySource, UnitOutcome, UnitSpec};
use dispatcher::UnitPipeline;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info_span, warn, Instrument};

use crate::handle::UnitHandle;

/// Host interface accepting work units.
///
/// The orchestrator only builds specs and awaits handles; it never runs unit
/// logic itself.
#[trait_variant::make(JobExecutor: Send)]
pub trait LocalJobExecutor {
    /// Submit `spec`, returning once the unit has been accepted.
    async fn submit(&self, spec: UnitSpec) -> Result<UnitHandle, ContractError>;
}

/// Runs each unit's dispatch pipeline on the tokio runtime.
///
/// At most `max_concurrent` units execute at a time; the rest wait for a
/// permit. Every unit observes the run's cancellation token.
pub struct TaskExecutor<Q, M, S> {
    pipeline: Arc<UnitPipeline<Q, M, S>>,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl<Q, M, S> TaskExecutor<Q, M, S>
where
    Q: QuerySource + Send + Sync + 'static,
    M: MessageMapper + 'static,
    S: BatchSink + Send + Sync + 'static,
{
    pub fn new(
        pipeline: Arc<UnitPipeline<Q, M, S>>,
        max_concurrent: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            pipeline,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            cancel,
        }
    }

    pub fn pipeline(&self) -> &Arc<UnitPipeline<Q, M, S>> {
        &self.pipeline
    }
}

impl<Q, M, S> JobExecutor for TaskExecutor<Q, M, S>
where
    Q: QuerySource + Send + Sync + 'static,
    M: MessageMapper + 'static,
    S: BatchSink + Send + Sync + 'static,
{
    async fn submit(&self, spec: UnitSpec) -> Result<UnitHandle, ContractError> {
        let span = info_span!(
            "unit",
            dimension = %spec.dimension,
            subject = %spec.subject,
            sub_key = spec.sub_key.as_deref().unwrap_or(""),
        );
        let task = tokio::spawn(
            execute(
                Arc::clone(&self.pipeline),
                Arc::clone(&self.permits),
                self.cancel.clone(),
                spec.clone(),
            )
            .instrument(span),
        );
        Ok(UnitHandle::new(spec, task))
    }
}

async fn execute<Q, M, S>(
    pipeline: Arc<UnitPipeline<Q, M, S>>,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
    spec: UnitSpec,
) -> UnitOutcome
where
    Q: QuerySource + Sync,
    M: MessageMapper,
    S: BatchSink + Sync,
{
    let _permit = tokio::select! {
        biased;
        _ = cancel.cancelled() => return UnitOutcome::canceled("run canceled before start"),
        permit = permits.acquire_owned() => match permit {
            Ok(permit) => permit,
            Err(_) => return UnitOutcome::canceled("executor closed"),
        },
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => UnitOutcome::canceled("run canceled"),
        result = pipeline.run_unit(&spec) => match result {
            Ok(summary) => UnitOutcome::finished(summary.to_string()),
            Err(e) => {
                warn!(error = %e, "Unit failed");
                UnitOutcome::Failed {
                    failure: e.to_failure(),
                }
            }
        },
    }
}
