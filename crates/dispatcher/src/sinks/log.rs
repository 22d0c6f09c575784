//! LogSink - logs batch summary via tracing

use contracts::{BatchSink, OutboundMessage, SinkError};
use tracing::{info, instrument};

/// Sink that logs batch summaries for debugging
#[derive(Debug)]
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_batch_summary(&self, batch: &[OutboundMessage]) {
        let Some(first) = batch.first() else {
            return;
        };
        info!(
            sink = %self.name,
            dimension = %first.dimension,
            subject = %first.subject,
            sub_key = first.sub_key.as_deref().unwrap_or(""),
            messages = batch.len(),
            "Batch received"
        );
    }
}

impl BatchSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_send",
        skip(self, batch),
        fields(sink = %self.name, size = batch.len())
    )]
    async fn send_batch(&self, batch: &[OutboundMessage]) -> Result<(), SinkError> {
        self.log_batch_summary(batch);
        Ok(())
    }
}
