//! Work unit identity, lifecycle and terminal outcome

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Dimension, Subject};

/// Month codes a cutoff subject is split into, one unit each.
pub const CUTOFF_MONTHS: [&str; 12] = [
    "01", "02", "03", "04", "05", "06", "07", "08", "09", "10", "11", "12",
];

/// One concretely submittable unit of work.
///
/// Identity is `(dimension, subject[, sub_key])`. The sub key is only set for
/// units produced by the monthly cutoff expansion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitSpec {
    pub dimension: Dimension,
    pub subject: Subject,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_key: Option<String>,
}

impl UnitSpec {
    pub fn new(dimension: Dimension, subject: Subject) -> Self {
        Self {
            dimension,
            subject,
            sub_key: None,
        }
    }

    pub fn with_sub_key(dimension: Dimension, subject: Subject, sub_key: impl Into<String>) -> Self {
        Self {
            dimension,
            subject,
            sub_key: Some(sub_key.into()),
        }
    }

    /// Stable ledger key, e.g. `SiteA/Tag` or `SiteA/WorkOrderCutoff/03`.
    pub fn key(&self) -> String {
        match &self.sub_key {
            Some(sub) => format!("{}/{}/{}", self.dimension, self.subject, sub),
            None => format!("{}/{}", self.dimension, self.subject),
        }
    }

    /// Pending progress label: `SiteA(Tag): ` or `SiteA(WorkOrderCutoff 03): `.
    pub fn label(&self) -> String {
        format!("{self}: ")
    }
}

impl fmt::Display for UnitSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sub_key {
            Some(sub) => write!(f, "{}({} {})", self.dimension, self.subject, sub),
            None => write!(f, "{}({})", self.dimension, self.subject),
        }
    }
}

/// Unit lifecycle. Transitions only move forward:
/// `Pending -> Running -> {Finished | Failed | Canceled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Pending,
    Running,
    Finished,
    Failed,
    Canceled,
}

impl UnitStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed | Self::Canceled)
    }

    fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Running => 1,
            Self::Finished | Self::Failed | Self::Canceled => 2,
        }
    }

    /// Whether moving from `self` to `next` respects the lifecycle order.
    pub fn can_advance_to(self, next: UnitStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }

    /// Marker appended to the progress label once terminal.
    pub fn marker(self) -> &'static str {
        match self {
            Self::Pending | Self::Running => "",
            Self::Finished => "Finished",
            Self::Failed => "Failed",
            Self::Canceled => "Canceled",
        }
    }
}

/// Classification of a unit failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Query source could not produce events
    Query,
    /// Event could not be mapped to outbound messages
    Mapping,
    /// Sink deemed unreachable or misconfigured
    SinkConfig,
    /// Sink failed to deliver a batch
    SinkTransport,
    /// Unit abandoned before completion
    Canceled,
    /// Unit task panicked
    Panicked,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Query => "query error",
            Self::Mapping => "mapping error",
            Self::SinkConfig => "sink configuration error",
            Self::SinkTransport => "sink transport error",
            Self::Canceled => "canceled",
            Self::Panicked => "panicked",
        };
        f.write_str(s)
    }
}

/// Serializable unit failure, persisted in the run ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl UnitFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for UnitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Terminal result of a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UnitOutcome {
    Finished { summary: String },
    Failed { failure: UnitFailure },
    Canceled { reason: String },
}

impl UnitOutcome {
    pub fn finished(summary: impl Into<String>) -> Self {
        Self::Finished {
            summary: summary.into(),
        }
    }

    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failed {
            failure: UnitFailure::new(kind, message),
        }
    }

    pub fn canceled(reason: impl Into<String>) -> Self {
        Self::Canceled {
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> UnitStatus {
        match self {
            Self::Finished { .. } => UnitStatus::Finished,
            Self::Failed { .. } => UnitStatus::Failed,
            Self::Canceled { .. } => UnitStatus::Canceled,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }

    /// Failure view; cancellations are reported as a `Canceled` failure.
    pub fn failure(&self) -> Option<UnitFailure> {
        match self {
            Self::Finished { .. } => None,
            Self::Failed { failure } => Some(failure.clone()),
            Self::Canceled { reason } => Some(UnitFailure::new(FailureKind::Canceled, reason.clone())),
        }
    }
}
