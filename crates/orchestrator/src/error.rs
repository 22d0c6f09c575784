//! Orchestrator error types

use contracts::{ContractError, UnitFailure};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Request rejected before any unit was submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please provide a valid dimension (got: {})", .requested.join(", "))]
    NoKnownDimension { requested: Vec<String> },

    #[error("Please provide a valid subject (got: {})", .requested.join(", "))]
    NoKnownSubject { requested: Vec<String> },
}

/// One failed unit inside an [`AggregateFailure`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedUnit {
    /// Unit display name, e.g. `SiteB(Tag)`
    pub unit: String,
    pub failure: UnitFailure,
}

impl fmt::Display for FailedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.unit, self.failure)
    }
}

/// Every failed or canceled unit of a run, in submission order.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("One or more operations failed: {} of {total} units ({})", .failures.len(), format_failures(.failures))]
pub struct AggregateFailure {
    pub total: usize,
    pub failures: Vec<FailedUnit>,
}

fn format_failures(failures: &[FailedUnit]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors surfaced by the orchestrator entry points
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Aggregate(#[from] AggregateFailure),

    #[error("run '{0}' not found")]
    RunNotFound(String),

    #[error("run '{0}' is already finished")]
    RunFinished(String),

    #[error("run '{0}' already exists")]
    RunExists(String),

    #[error(transparent)]
    Contract(#[from] ContractError),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
