//! Dispatch metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters of one sink, shared by every unit dispatching to it
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Batches delivered
    batch_count: AtomicU64,
    /// Messages delivered
    message_count: AtomicU64,
    /// Mapped messages dropped for having no content
    filtered_count: AtomicU64,
    /// Configuration-class send failures
    config_failure_count: AtomicU64,
    /// Transport-class send failures
    transport_failure_count: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch_count(&self) -> u64 {
        self.batch_count.load(Ordering::Relaxed)
    }

    pub fn message_count(&self) -> u64 {
        self.message_count.load(Ordering::Relaxed)
    }

    /// Record one delivered batch of `messages` messages
    pub fn record_batch(&self, messages: usize) {
        self.batch_count.fetch_add(1, Ordering::Relaxed);
        self.message_count.fetch_add(messages as u64, Ordering::Relaxed);
    }

    pub fn record_filtered(&self, count: u64) {
        self.filtered_count.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_failure(&self, is_config: bool) {
        let counter = if is_config {
            &self.config_failure_count
        } else {
            &self.transport_failure_count
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batch_count: self.batch_count(),
            message_count: self.message_count(),
            filtered_count: self.filtered_count.load(Ordering::Relaxed),
            config_failure_count: self.config_failure_count.load(Ordering::Relaxed),
            transport_failure_count: self.transport_failure_count.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of sink metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub batch_count: u64,
    pub message_count: u64,
    pub filtered_count: u64,
    pub config_failure_count: u64,
    pub transport_failure_count: u64,
}
