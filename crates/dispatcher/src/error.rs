//! Dispatch error types

use contracts::{ContractError, FailureKind, SinkError, UnitFailure};
use thiserror::Error;

/// Fatal failure of a unit's dispatch pipeline.
///
/// Nothing is retried inside the pipeline; the caller sees exactly one of
/// these per failed unit.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Events could not be fetched or read
    #[error("query failed: {0}")]
    Query(#[source] ContractError),

    /// An event could not be mapped
    #[error("mapping failed: {0}")]
    Mapping(#[source] ContractError),

    /// Sink misconfigured or unreachable
    #[error("configuration error: could not send batch {batch}: {source}")]
    SinkConfig {
        batch: usize,
        #[source]
        source: SinkError,
    },

    /// Sink failed to deliver a batch
    #[error("could not send batch {batch}: {source}")]
    SinkTransport {
        batch: usize,
        #[source]
        source: SinkError,
    },
}

impl DispatchError {
    /// Classify a sink failure of the `batch`-th batch (1-based).
    pub fn from_sink(batch: usize, source: SinkError) -> Self {
        if source.is_config() {
            Self::SinkConfig { batch, source }
        } else {
            Self::SinkTransport { batch, source }
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Query(_) => FailureKind::Query,
            Self::Mapping(_) => FailureKind::Mapping,
            Self::SinkConfig { .. } => FailureKind::SinkConfig,
            Self::SinkTransport { .. } => FailureKind::SinkTransport,
        }
    }

    /// Serializable form for unit outcomes.
    pub fn to_failure(&self) -> UnitFailure {
        UnitFailure::new(self.kind(), self.to_string())
    }
}
