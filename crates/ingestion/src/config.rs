//! Source metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by a query source and the streams it opens
#[derive(Debug, Default)]
pub struct SourceMetrics {
    /// Streams opened
    pub streams_opened: AtomicU64,

    /// Queries without backing data
    pub missing_sources: AtomicU64,

    /// Raw events yielded
    pub events_read: AtomicU64,

    /// Read errors
    pub read_errors: AtomicU64,
}

impl SourceMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_opened(&self) {
        self.streams_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_missing(&self) {
        self.missing_sources.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event(&self) {
        self.events_read.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_read_error(&self) {
        self.read_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            streams_opened: self.streams_opened.load(Ordering::Relaxed),
            missing_sources: self.missing_sources.load(Ordering::Relaxed),
            events_read: self.events_read.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub streams_opened: u64,
    pub missing_sources: u64,
    pub events_read: u64,
    pub read_errors: u64,
}
