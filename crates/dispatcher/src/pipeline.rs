//! UnitPipeline - query, map, filter, batch and send for one unit

use std::fmt;
use std::sync::Arc;

use contracts::{
    BatchSink, DEFAULT_BATCH_SIZE, MessageMapper, OutboundMessage, QuerySource, UnitSpec,
};
use futures::StreamExt;
use tracing::{debug, info, instrument, warn};

use crate::batch::Batcher;
use crate::error::DispatchError;
use crate::metrics::SinkMetrics;

/// Successful result of a unit's dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchSummary {
    /// The query returned no events
    NoData { unit: String },
    /// Every non-empty message was delivered
    Sent {
        sink: String,
        unit: String,
        messages: usize,
        batches: usize,
        filtered: usize,
    },
}

impl fmt::Display for DispatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoData { unit } => write!(f, "found no events for {unit}"),
            Self::Sent {
                sink,
                unit,
                messages,
                ..
            } => write!(
                f,
                "finished successfully sending {messages} messages to {sink} for {unit}"
            ),
        }
    }
}

/// Dispatch pipeline shared by all units of a run.
///
/// Holds no per-unit state: every call to [`run_unit`](Self::run_unit) owns
/// its own event stream and batcher.
pub struct UnitPipeline<Q, M, S> {
    source: Q,
    mapper: M,
    sink: S,
    batch_size: usize,
    metrics: Arc<SinkMetrics>,
}

impl<Q, M, S> UnitPipeline<Q, M, S>
where
    Q: QuerySource + Sync,
    M: MessageMapper,
    S: BatchSink + Sync,
{
    pub fn new(source: Q, mapper: M, sink: S) -> Self {
        Self {
            source,
            mapper,
            sink,
            batch_size: DEFAULT_BATCH_SIZE,
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Run the full pipeline for `unit`.
    ///
    /// The event stream is dropped on every exit path, releasing whatever
    /// resource backs it.
    #[instrument(
        name = "unit_pipeline",
        skip(self, unit),
        fields(unit = %unit, sink = %self.sink.name())
    )]
    pub async fn run_unit(&self, unit: &UnitSpec) -> Result<DispatchSummary, DispatchError> {
        let mut events = self.source.fetch(unit).await.map_err(DispatchError::Query)?;

        let Some(mut next) = events.next().await else {
            info!("found no events");
            return Ok(DispatchSummary::NoData {
                unit: unit.to_string(),
            });
        };

        // Everything is mapped before the first send, so a query or mapping
        // failure leaves the sink untouched.
        let mut progress = Progress::default();
        let mut outbound = Vec::new();
        loop {
            let event = next.map_err(DispatchError::Query)?;
            for message in self.mapper.map(&event, unit).map_err(DispatchError::Mapping)? {
                if message.is_empty() {
                    progress.filtered += 1;
                } else {
                    outbound.push(message);
                }
            }

            match events.next().await {
                Some(item) => next = item,
                None => break,
            }
        }
        drop(events);
        debug!(messages = outbound.len(), filtered = progress.filtered, "Mapped all events");

        let mut batcher = Batcher::new(self.batch_size);
        for message in outbound {
            if let Some(batch) = batcher.push(message) {
                self.send(&batch, &mut progress).await?;
            }
        }
        if let Some(batch) = batcher.finish() {
            self.send(&batch, &mut progress).await?;
        }

        self.metrics.record_filtered(progress.filtered as u64);
        info!(
            messages = progress.messages,
            batches = progress.batches,
            filtered = progress.filtered,
            "Finished sending"
        );

        Ok(DispatchSummary::Sent {
            sink: self.sink.name().to_string(),
            unit: unit.to_string(),
            messages: progress.messages,
            batches: progress.batches,
            filtered: progress.filtered,
        })
    }

    async fn send(
        &self,
        batch: &[OutboundMessage],
        progress: &mut Progress,
    ) -> Result<(), DispatchError> {
        let ordinal = progress.batches + 1;
        let sink = self.sink.name();

        match self.sink.send_batch(batch).await {
            Ok(()) => {
                debug!(batch = ordinal, size = batch.len(), "Batch sent");
                self.metrics.record_batch(batch.len());
                observability::record_batch_dispatched(sink, batch.len(), true);
                progress.batches = ordinal;
                progress.messages += batch.len();
                Ok(())
            }
            Err(e) => {
                warn!(batch = ordinal, error = %e, "Batch send failed");
                self.metrics.record_failure(e.is_config());
                observability::record_batch_dispatched(sink, batch.len(), false);
                Err(DispatchError::from_sink(ordinal, e))
            }
        }
    }
}

#[derive(Debug, Default)]
struct Progress {
    messages: usize,
    batches: usize,
    filtered: usize,
}
