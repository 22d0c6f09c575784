//! In-memory query source
//!
//! Serves canned events per unit, for tests and demos without event files.

use std::collections::HashMap;
use std::sync::Arc;

use contracts::{ContractError, EventStream, QuerySource, RawEvent, UnitSpec};
use futures::stream::{self, StreamExt};
use tracing::trace;

use crate::config::SourceMetrics;

#[derive(Debug, Clone)]
enum Canned {
    Events(Vec<RawEvent>),
    Fail(String),
}

/// Query source holding its events in memory, keyed by unit.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: HashMap<String, Canned>,
    metrics: Arc<SourceMetrics>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `events` for `unit`.
    pub fn with_events<I, S>(mut self, unit: &UnitSpec, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let events = events.into_iter().map(RawEvent::new).collect();
        self.entries.insert(unit.key(), Canned::Events(events));
        self
    }

    /// Serve `count` generated single-field objects for `unit`.
    pub fn with_generated(self, unit: &UnitSpec, count: usize) -> Self {
        let events = (0..count).map(|i| format!(r#"{{"seq":{i}}}"#));
        self.with_events(unit, events)
    }

    /// Make fetching `unit` fail with a query error.
    pub fn with_failure(mut self, unit: &UnitSpec, message: impl Into<String>) -> Self {
        self.entries.insert(unit.key(), Canned::Fail(message.into()));
        self
    }

    pub fn metrics(&self) -> &Arc<SourceMetrics> {
        &self.metrics
    }
}

impl QuerySource for MemorySource {
    async fn fetch(&self, unit: &UnitSpec) -> Result<EventStream, ContractError> {
        match self.entries.get(&unit.key()) {
            Some(Canned::Events(events)) => {
                trace!(unit = %unit, count = events.len(), "Serving canned events");
                self.metrics.record_opened();
                let metrics = Arc::clone(&self.metrics);
                let events = events.clone();
                Ok(stream::iter(events)
                    .map(move |event| {
                        metrics.record_event();
                        Ok(event)
                    })
                    .boxed())
            }
            Some(Canned::Fail(message)) => Err(ContractError::query(unit.key(), message.clone())),
            None => {
                self.metrics.record_missing();
                Ok(stream::empty().boxed())
            }
        }
    }
}
