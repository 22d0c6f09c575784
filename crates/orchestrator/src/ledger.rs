//! Run ledger - persisted record of every run
//!
//! The ledger maps each unit identity to its last known terminal outcome and
//! remembers the last published snapshot. A resumed run consults it so that
//! finished units are neither re-submitted nor re-published.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use contracts::{ContractError, ProgressSnapshot, UnitOutcome, UnitSpec};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::FailedUnit;
use crate::expander::FeederRequest;

/// Lifecycle of a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeStatus {
    Running,
    Completed,
    Failed,
    Canceled,
}

/// Final output of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunOutput {
    /// Per-unit summaries in submission order
    Results { results: Vec<String> },
    /// Every failed or canceled unit
    Failures { total: usize, failures: Vec<FailedUnit> },
    /// Request rejected before submission
    Rejected { message: String },
}

/// Terminal outcome of one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub unit: UnitSpec,
    pub outcome: UnitOutcome,
    pub completed_at: DateTime<Utc>,
}

/// Everything known about one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub request: FeederRequest,
    pub status: RuntimeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub last_snapshot: Option<ProgressSnapshot>,
    /// Keyed by [`UnitSpec::key`]
    #[serde(default)]
    pub units: BTreeMap<String, UnitRecord>,
    #[serde(default)]
    pub output: Option<RunOutput>,
}

impl RunRecord {
    pub fn new(run_id: impl Into<String>, request: FeederRequest) -> Self {
        let now = Utc::now();
        Self {
            run_id: run_id.into(),
            request,
            status: RuntimeStatus::Running,
            created_at: now,
            updated_at: now,
            last_snapshot: None,
            units: BTreeMap::new(),
            output: None,
        }
    }

    /// Recorded outcome of `unit`, if it already reached a terminal state.
    pub fn outcome_of(&self, unit: &UnitSpec) -> Option<&UnitOutcome> {
        self.units.get(&unit.key()).map(|r| &r.outcome)
    }

    pub fn record_outcome(&mut self, unit: &UnitSpec, outcome: UnitOutcome) {
        let now = Utc::now();
        self.units.insert(
            unit.key(),
            UnitRecord {
                unit: unit.clone(),
                outcome,
                completed_at: now,
            },
        );
        self.updated_at = now;
    }

    pub fn record_snapshot(&mut self, snapshot: ProgressSnapshot) {
        self.last_snapshot = Some(snapshot);
        self.updated_at = Utc::now();
    }

    pub fn finish(&mut self, status: RuntimeStatus, output: RunOutput) {
        self.status = status;
        self.output = Some(output);
        self.updated_at = Utc::now();
    }
}

/// Storage of run records.
#[trait_variant::make(LedgerStore: Send)]
pub trait LocalLedgerStore {
    async fn load(&self, run_id: &str) -> Result<Option<RunRecord>, ContractError>;

    /// Insert or replace the record of `record.run_id`.
    async fn save(&self, record: &RunRecord) -> Result<(), ContractError>;

    /// All runs, newest first.
    async fn list(&self) -> Result<Vec<RunRecord>, ContractError>;

    /// Returns whether a record existed.
    async fn delete(&self, run_id: &str) -> Result<bool, ContractError>;
}

/// One JSON file per run under a directory.
///
/// Writes go to a temporary file that is then renamed over the record, so a
/// crash never leaves a half-written record behind.
#[derive(Debug, Clone)]
pub struct FileLedgerStore {
    dir: PathBuf,
}

impl FileLedgerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, run_id: &str) -> Result<PathBuf, ContractError> {
        let valid = !run_id.is_empty()
            && run_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(ContractError::ledger(format!("invalid run id '{run_id}'")));
        }
        Ok(self.dir.join(format!("{run_id}.json")))
    }
}

impl LedgerStore for FileLedgerStore {
    async fn load(&self, run_id: &str) -> Result<Option<RunRecord>, ContractError> {
        let path = self.path_for(run_id)?;
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|e| ContractError::ledger(format!("corrupt record {}: {e}", path.display())))
    }

    #[instrument(name = "ledger_save", skip(self, record), fields(run_id = %record.run_id))]
    async fn save(&self, record: &RunRecord) -> Result<(), ContractError> {
        let path = self.path_for(&record.run_id)?;
        let data = serde_json::to_vec_pretty(record)
            .map_err(|e| ContractError::ledger(format!("encode failed: {e}")))?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &data).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(path = %path.display(), units = record.units.len(), "Run record saved");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<RunRecord>, ContractError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(run_id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some(record) = LedgerStore::load(self, run_id).await? {
                records.push(record);
            }
        }
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn delete(&self, run_id: &str) -> Result<bool, ContractError> {
        let path = self.path_for(run_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local ledger, for tests and one-shot runs.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    records: Mutex<HashMap<String, RunRecord>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, RunRecord>>, ContractError> {
        self.records
            .lock()
            .map_err(|_| ContractError::ledger("memory ledger poisoned"))
    }
}

impl LedgerStore for MemoryLedgerStore {
    async fn load(&self, run_id: &str) -> Result<Option<RunRecord>, ContractError> {
        Ok(self.records()?.get(run_id).cloned())
    }

    async fn save(&self, record: &RunRecord) -> Result<(), ContractError> {
        self.records()?.insert(record.run_id.clone(), record.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<RunRecord>, ContractError> {
        let mut records: Vec<RunRecord> = self.records()?.values().cloned().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn delete(&self, run_id: &str) -> Result<bool, ContractError> {
        Ok(self.records()?.remove(run_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::{FileLedgerStore, LedgerStore, MemoryLedgerStore, RunRecord};
    use crate::expander::FeederRequest;
    use contracts::{ContractError, ProgressSnapshot, UnitOutcome, UnitSpec};

    fn record(run_id: &str) -> RunRecord {
        let mut record = RunRecord::new(run_id, FeederRequest::parse("SiteA", "Tag"));
        let unit = UnitSpec::new("SiteA".into(), "Tag".into());
        record.record_outcome(&unit, UnitOutcome::finished("sent 40 messages"));
        record.record_snapshot(ProgressSnapshot::Detailed(vec!["SiteA(Tag): Finished".into()]));
        record
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLedgerStore::new(dir.path().join("runs"));

        let saved = record("run-1");
        store.save(&saved).await.unwrap();

        let loaded = store.load("run-1").await.unwrap().unwrap();
        assert_eq!(loaded, saved);
        let unit = UnitSpec::new("SiteA".into(), "Tag".into());
        assert!(loaded.outcome_of(&unit).unwrap().is_success());
        assert!(!dir.path().join("runs/run-1.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_file_store_list_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLedgerStore::new(dir.path());

        assert!(store.list().await.unwrap().is_empty());
        store.save(&record("a")).await.unwrap();
        store.save(&record("b")).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 2);

        assert!(store.delete("a").await.unwrap());
        assert!(!store.delete("a").await.unwrap());
        assert!(store.load("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLedgerStore::new(dir.path());
        let err = store.load("../etc/passwd").await.unwrap_err();
        assert!(matches!(err, ContractError::Ledger { .. }));
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryLedgerStore::new();
        store.save(&record("m")).await.unwrap();
        assert!(store.load("m").await.unwrap().is_some());
        assert!(store.delete("m").await.unwrap());
        assert!(store.list().await.unwrap().is_empty());
    }
}
