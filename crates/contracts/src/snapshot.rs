//! ProgressSnapshot - rendered progress report of a run

use serde::{Deserialize, Serialize};

/// Published progress of a run.
///
/// Always a full rendering of current state, never a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProgressSnapshot {
    /// One label per unit, in submission order
    Detailed(Vec<String>),
    /// Count-only notice used once the detailed form would be too large
    Summary(String),
}

impl ProgressSnapshot {
    /// Degraded-mode notice for `unit_count` units.
    pub fn too_large(unit_count: usize) -> Self {
        Self::Summary(format!(
            "No custom status update because the payload would be too large. {unit_count} tasks"
        ))
    }

    /// JSON payload as handed to a status transport.
    pub fn to_payload(&self) -> String {
        // Serializing strings and vectors of strings cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Payload size in bytes when encoded as UTF-16, the unit the status
    /// transport measures its ceiling in.
    pub fn payload_bytes(&self) -> usize {
        self.to_payload().encode_utf16().count() * 2
    }

    /// Whole kibibytes of [`payload_bytes`](Self::payload_bytes), rounded down.
    pub fn payload_kib(&self) -> usize {
        self.payload_bytes() / 1024
    }

    /// Number of labels carrying a terminal marker.
    pub fn finished_count(&self) -> usize {
        match self {
            Self::Detailed(labels) => labels.iter().filter(|l| !l.ends_with(": ")).count(),
            Self::Summary(_) => 0,
        }
    }
}
