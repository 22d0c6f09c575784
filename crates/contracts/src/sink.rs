//! BatchSink trait - Dispatch pipeline output interface

use crate::{OutboundMessage, SinkError};

/// External delivery target for batches.
///
/// Implementations must scope any connection to a single call and classify
/// their failures as [`SinkError::Config`] or [`SinkError::Transport`].
#[trait_variant::make(BatchSink: Send)]
pub trait LocalBatchSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one batch. Batches of a unit arrive strictly in order.
    async fn send_batch(&self, batch: &[OutboundMessage]) -> Result<(), SinkError>;
}
