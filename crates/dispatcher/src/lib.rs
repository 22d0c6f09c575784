//! # Dispatcher
//!
//! Batched dispatch pipeline run by every work unit.
//!
//! Responsibilities:
//! - Pull the unit's raw events from a `QuerySource`
//! - Map them into outbound messages and drop empty ones
//! - Send fixed-size batches to a `BatchSink`, strictly in order
//! - Classify sink failures as configuration or transport failures

pub mod batch;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod sinks;

pub use batch::Batcher;
pub use error::DispatchError;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use pipeline::{DispatchSummary, UnitPipeline};
pub use sinks::{AnySink, FileSink, LogSink, NetworkSink, create_sink};
