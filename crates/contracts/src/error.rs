//! Errors shared across the feeder crates.
//!
//! `ContractError` covers blueprint loading and the collaborator traits;
//! `SinkError` is kept apart so the dispatcher can tell config from transport.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContractError {
    /// Blueprint could not be decoded
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Blueprint decoded but broke a rule
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// Query source failed to produce events
    #[error("query error for '{unit}': {message}")]
    Query { unit: String, message: String },

    /// Raw event could not be mapped
    #[error("mapping error for subject '{subject}': {message}")]
    Mapping { subject: String, message: String },

    /// Status publisher rejected a snapshot
    #[error("status payload of {size_bytes} bytes exceeds transport ceiling of {ceiling_bytes} bytes")]
    StatusTooLarge {
        size_bytes: usize,
        ceiling_bytes: usize,
    },

    /// Status publisher unavailable
    #[error("status publish error: {message}")]
    Publish { message: String },

    /// Ledger storage failure
    #[error("ledger error: {message}")]
    Ledger { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl ContractError {
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn query(unit: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            unit: unit.into(),
            message: message.into(),
        }
    }

    pub fn mapping(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Mapping {
            subject: subject.into(),
            message: message.into(),
        }
    }

    pub fn ledger(message: impl Into<String>) -> Self {
        Self::Ledger {
            message: message.into(),
        }
    }
}

/// Sink failure, classified before it leaves the sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Sink unreachable or misconfigured
    #[error("sink '{sink_name}' configuration error: {message}")]
    Config { sink_name: String, message: String },

    /// Delivery of a batch failed
    #[error("sink '{sink_name}' transport error: {message}")]
    Transport { sink_name: String, message: String },
}

impl SinkError {
    pub fn config(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    pub fn transport(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}
