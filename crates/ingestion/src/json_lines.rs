//! JsonLinesSource - file-backed query source
//!
//! Layout: `{root}/{dimension}/{subject}.jsonl`, or
//! `{root}/{dimension}/{subject}-{sub_key}.jsonl` for monthly units.
//! One raw event per non-blank line.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use contracts::{ContractError, EventStream, QuerySource, RawEvent, UnitSpec};
use futures::future;
use futures::stream::{self, StreamExt};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;
use tracing::{debug, instrument};

use crate::config::SourceMetrics;

/// Streams events lazily from JSON-lines files.
#[derive(Debug, Clone)]
pub struct JsonLinesSource {
    root: PathBuf,
    metrics: Arc<SourceMetrics>,
}

impl JsonLinesSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            metrics: Arc::new(SourceMetrics::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn metrics(&self) -> &Arc<SourceMetrics> {
        &self.metrics
    }

    /// File holding the events of `unit`.
    pub fn path_for(&self, unit: &UnitSpec) -> PathBuf {
        let file_name = match &unit.sub_key {
            Some(sub) => format!("{}-{}.jsonl", unit.subject, sub),
            None => format!("{}.jsonl", unit.subject),
        };
        self.root.join(unit.dimension.as_str()).join(file_name)
    }
}

impl QuerySource for JsonLinesSource {
    #[instrument(name = "json_lines_fetch", skip(self, unit), fields(unit = %unit))]
    async fn fetch(&self, unit: &UnitSpec) -> Result<EventStream, ContractError> {
        let path = self.path_for(unit);
        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No event file, treating as empty");
                self.metrics.record_missing();
                return Ok(stream::empty().boxed());
            }
            Err(e) => {
                return Err(ContractError::query(
                    unit.key(),
                    format!("failed to open {}: {e}", path.display()),
                ));
            }
        };
        self.metrics.record_opened();

        let unit_key = unit.key();
        let metrics = Arc::clone(&self.metrics);
        let lines = LinesStream::new(BufReader::new(file).lines());
        let events = lines.filter_map(move |line| {
            let item = match line {
                Ok(line) if line.trim().is_empty() => None,
                Ok(line) => {
                    metrics.record_event();
                    Some(Ok(RawEvent::new(line)))
                }
                Err(e) => {
                    metrics.record_read_error();
                    Some(Err(ContractError::query(unit_key.clone(), e.to_string())))
                }
            };
            future::ready(item)
        });

        Ok(events.boxed())
    }
}
