//! Feeder metrics
//!
//! Thin wrappers over the `metrics` facade plus an in-memory aggregator used
//! for the end-of-run summary.

use std::collections::BTreeMap;

use contracts::{FailureKind, UnitStatus};
use metrics::{counter, gauge, histogram};

/// Units handed to the executor for a run.
pub fn record_units_submitted(count: usize) {
    counter!("feeder_units_submitted_total").increment(count as u64);
    gauge!("feeder_units_in_flight").increment(count as f64);
}

/// A unit reached a terminal state.
///
/// # Example
///
/// ```ignore
/// use observability::record_unit_completed;
///
/// record_unit_completed(UnitStatus::Finished, elapsed.as_secs_f64() * 1000.0);
/// ```
pub fn record_unit_completed(status: UnitStatus, duration_ms: f64) {
    counter!(
        "feeder_units_completed_total",
        "status" => status.marker().to_lowercase()
    )
    .increment(1);
    gauge!("feeder_units_in_flight").decrement(1.0);
    histogram!("feeder_unit_duration_ms").record(duration_ms);
}

/// A unit failure, by class.
pub fn record_unit_failure(kind: FailureKind) {
    counter!("feeder_unit_failures_total", "kind" => kind.to_string()).increment(1);
}

/// One batch handed to a sink.
pub fn record_batch_dispatched(sink_name: &str, messages: usize, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "feeder_batches_dispatched_total",
        "sink" => sink_name.to_string(),
        "status" => status
    )
    .increment(1);
    if success {
        counter!("feeder_messages_sent_total", "sink" => sink_name.to_string())
            .increment(messages as u64);
        histogram!("feeder_batch_size").record(messages as f64);
    }
}

/// A progress snapshot reached the status publisher.
pub fn record_snapshot_published(payload_bytes: usize) {
    counter!("feeder_snapshots_published_total").increment(1);
    histogram!("feeder_snapshot_bytes").record(payload_bytes as f64);
}

/// A snapshot was withheld because it was already published.
pub fn record_snapshot_suppressed() {
    counter!("feeder_snapshots_suppressed_total").increment(1);
}

/// A run switched to count-only progress reporting.
pub fn record_degraded_run(unit_count: usize) {
    counter!("feeder_degraded_runs_total").increment(1);
    gauge!("feeder_degraded_run_units").set(unit_count as f64);
}

/// In-memory run statistics
#[derive(Debug, Clone, Default)]
pub struct RunMetricsAggregator {
    pub total_units: u64,
    pub finished: u64,
    pub failed: u64,
    pub canceled: u64,

    /// Units whose outcome came from the ledger
    pub replayed: u64,

    /// Duration of units executed in this process
    pub duration_stats: RunningStats,

    pub failure_counts: BTreeMap<String, u64>,
}

impl RunMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a unit executed in this process.
    pub fn update(&mut self, status: UnitStatus, failure: Option<FailureKind>, duration_ms: f64) {
        self.count(status, failure);
        self.duration_stats.push(duration_ms);
    }

    /// Record a unit restored from the ledger.
    pub fn update_replayed(&mut self, status: UnitStatus, failure: Option<FailureKind>) {
        self.count(status, failure);
        self.replayed += 1;
    }

    fn count(&mut self, status: UnitStatus, failure: Option<FailureKind>) {
        self.total_units += 1;
        match status {
            UnitStatus::Finished => self.finished += 1,
            UnitStatus::Failed => self.failed += 1,
            UnitStatus::Canceled => self.canceled += 1,
            UnitStatus::Pending | UnitStatus::Running => {}
        }
        if let Some(kind) = failure {
            *self.failure_counts.entry(kind.to_string()).or_insert(0) += 1;
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            total_units: self.total_units,
            finished: self.finished,
            failed: self.failed,
            canceled: self.canceled,
            replayed: self.replayed,
            success_rate: if self.total_units > 0 {
                self.finished as f64 / self.total_units as f64 * 100.0
            } else {
                0.0
            },
            unit_duration_ms: StatsSummary::from(&self.duration_stats),
            failure_counts: self.failure_counts.clone(),
        }
    }
}

/// Run summary
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub total_units: u64,
    pub finished: u64,
    pub failed: u64,
    pub canceled: u64,
    pub replayed: u64,
    pub success_rate: f64,
    pub unit_duration_ms: StatsSummary,
    pub failure_counts: BTreeMap<String, u64>,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Run Summary ===")?;
        writeln!(f, "Units: {} ({} replayed)", self.total_units, self.replayed)?;
        writeln!(
            f,
            "Finished: {} ({:.2}%)",
            self.finished, self.success_rate
        )?;
        writeln!(f, "Failed: {}", self.failed)?;
        writeln!(f, "Canceled: {}", self.canceled)?;
        writeln!(f, "Unit duration (ms): {}", self.unit_duration_ms)?;

        if !self.failure_counts.is_empty() {
            writeln!(f, "Failures by kind:")?;
            for (kind, count) in &self.failure_counts {
                writeln!(f, "  {}: {}", kind, count)?;
            }
        }

        Ok(())
    }
}

/// Summary of a [`RunningStats`]
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1} (n={})",
                self.min, self.max, self.mean, self.count
            )
        }
    }
}

/// Online min / max / mean
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            return;
        }
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.mean += (value - self.mean) / self.count as f64;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.mean }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [10.0, 20.0, 30.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 3);
        assert!((stats.mean() - 20.0).abs() < 1e-10);
        assert!((stats.min() - 10.0).abs() < 1e-10);
        assert!((stats.max() - 30.0).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_counts_outcomes() {
        let mut aggregator = RunMetricsAggregator::new();
        aggregator.update(UnitStatus::Finished, None, 12.0);
        aggregator.update(UnitStatus::Failed, Some(FailureKind::SinkTransport), 30.0);
        aggregator.update_replayed(UnitStatus::Finished, None);

        let summary = aggregator.summary();
        assert_eq!(summary.total_units, 3);
        assert_eq!(summary.finished, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.replayed, 1);
        assert_eq!(summary.unit_duration_ms.count, 2);
        assert_eq!(summary.failure_counts.get("sink transport error"), Some(&1));
        assert!(summary.to_string().contains("Failed: 1"));
    }

    #[test]
    fn test_record_functions_without_recorder() {
        // The facade is a no-op until a recorder is installed.
        record_units_submitted(2);
        record_unit_completed(UnitStatus::Canceled, 1.0);
        record_batch_dispatched("log", 250, true);
        record_snapshot_published(1024);
        record_snapshot_suppressed();
        record_degraded_run(420);
    }
}
