//! RawEvent / OutboundMessage - data flowing through a unit

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ContractError, Dimension, Subject};

/// Opaque serialized record returned by the query source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub payload: String,
}

impl RawEvent {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

/// Lazy, finite sequence of raw events for one unit.
pub type EventStream = BoxStream<'static, Result<RawEvent, ContractError>>;

/// Message handed to the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub dimension: Dimension,
    pub subject: Subject,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_key: Option<String>,
    pub body: Map<String, Value>,
}

impl OutboundMessage {
    /// A message without payload content is never sent.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Ordered group of messages sent in one sink call.
pub type Batch = Vec<OutboundMessage>;
