//! Status publishers
//!
//! Both publishers enforce the transport ceiling themselves and reject
//! oversize payloads with `ContractError::StatusTooLarge`.

use contracts::{
    check_transport_ceiling, ContractError, ProgressSnapshot, StatusPublisher,
    DEFAULT_TRANSPORT_CEILING_KIB,
};
use tokio::sync::watch;
use tracing::info;

/// Publishes snapshots as structured log lines.
#[derive(Debug, Clone)]
pub struct LogPublisher {
    ceiling_kib: usize,
}

impl LogPublisher {
    pub fn new(ceiling_kib: usize) -> Self {
        Self { ceiling_kib }
    }
}

impl Default for LogPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSPORT_CEILING_KIB)
    }
}

impl StatusPublisher for LogPublisher {
    async fn publish(&self, run_id: &str, snapshot: &ProgressSnapshot) -> Result<(), ContractError> {
        check_transport_ceiling(snapshot, self.ceiling_kib)?;
        info!(
            run_id,
            finished = snapshot.finished_count(),
            bytes = snapshot.payload_bytes(),
            status = %snapshot.to_payload(),
            "Custom status"
        );
        Ok(())
    }
}

/// Latest published status of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedStatus {
    pub run_id: String,
    pub snapshot: ProgressSnapshot,
}

/// Publishes snapshots into a `watch` channel for in-process observers.
///
/// Receivers only ever see the latest snapshot, which is fine since every
/// snapshot is a full rendering.
#[derive(Debug)]
pub struct WatchPublisher {
    ceiling_kib: usize,
    tx: watch::Sender<Option<PublishedStatus>>,
}

impl WatchPublisher {
    pub fn new(ceiling_kib: usize) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { ceiling_kib, tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<PublishedStatus>> {
        self.tx.subscribe()
    }

    /// Most recent snapshot, if any was published.
    pub fn latest(&self) -> Option<PublishedStatus> {
        self.tx.borrow().clone()
    }
}

impl StatusPublisher for WatchPublisher {
    async fn publish(&self, run_id: &str, snapshot: &ProgressSnapshot) -> Result<(), ContractError> {
        check_transport_ceiling(snapshot, self.ceiling_kib)?;
        self.tx.send_replace(Some(PublishedStatus {
            run_id: run_id.to_string(),
            snapshot: snapshot.clone(),
        }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_watch_publisher_keeps_latest() {
        let publisher = WatchPublisher::new(16);
        let mut rx = publisher.subscribe();

        let snapshot = ProgressSnapshot::Detailed(vec!["SiteA(Tag): Finished".into()]);
        publisher.publish("run-1", &snapshot).await.unwrap();

        rx.changed().await.unwrap();
        let latest = rx.borrow().clone().unwrap();
        assert_eq!(latest.run_id, "run-1");
        assert_eq!(latest.snapshot, snapshot);
    }

    #[tokio::test]
    async fn test_oversize_snapshot_rejected() {
        let publisher = WatchPublisher::new(1);
        let snapshot = ProgressSnapshot::Detailed(vec!["x".repeat(600)]);

        let err = publisher.publish("run-1", &snapshot).await.unwrap_err();
        assert!(matches!(err, ContractError::StatusTooLarge { .. }));
        assert!(publisher.latest().is_none());
    }

    #[tokio::test]
    async fn test_log_publisher_accepts_summary() {
        let publisher = LogPublisher::default();
        assert!(publisher.publish("run-1", &ProgressSnapshot::too_large(900)).await.is_ok());
    }
}
