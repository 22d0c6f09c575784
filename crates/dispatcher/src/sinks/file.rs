//! FileSink - appends batches to a JSON-lines file

use contracts::{BatchSink, OutboundMessage, SinkError};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output file, one message per line
    pub path: PathBuf,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let path = params
            .get("path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output/messages.jsonl"));

        Self { path }
    }
}

/// Sink that appends every message as one JSON line.
///
/// The file is opened for each batch and closed when the call returns.
#[derive(Debug)]
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
}

impl FileSink {
    /// Create a new FileSink
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }

    /// Create from params map (for factory)
    pub fn from_params(name: impl Into<String>, params: &HashMap<String, String>) -> Self {
        Self::new(name, FileSinkConfig::from_params(params))
    }

    fn encode(&self, batch: &[OutboundMessage]) -> Result<Vec<u8>, SinkError> {
        let mut buf = Vec::new();
        for message in batch {
            serde_json::to_writer(&mut buf, message)
                .map_err(|e| SinkError::transport(&self.name, format!("json error: {e}")))?;
            buf.push(b'\n');
        }
        Ok(buf)
    }
}

impl BatchSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_send",
        skip(self, batch),
        fields(sink = %self.name, size = batch.len())
    )]
    async fn send_batch(&self, batch: &[OutboundMessage]) -> Result<(), SinkError> {
        let data = self.encode(batch)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.config.path)
            .await
            .map_err(|e| {
                error!(sink = %self.name, path = %self.config.path.display(), error = %e, "Open failed");
                SinkError::config(
                    &self.name,
                    format!("cannot open {}: {e}", self.config.path.display()),
                )
            })?;

        file.write_all(&data).await.map_err(|e| {
            error!(sink = %self.name, error = %e, "Write failed");
            SinkError::transport(&self.name, e.to_string())
        })?;
        file.flush()
            .await
            .map_err(|e| SinkError::transport(&self.name, e.to_string()))?;

        debug!(sink = %self.name, bytes = data.len(), "Batch appended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value};
    use std::fs;
    use tempfile::tempdir;

    fn message(n: u64) -> OutboundMessage {
        let mut body = Map::new();
        body.insert("n".into(), Value::from(n));
        OutboundMessage {
            dimension: "SiteA".into(),
            subject: "Tag".into(),
            sub_key: None,
            body,
        }
    }

    #[tokio::test]
    async fn test_file_sink_appends_lines() {
        let dir = tempdir().unwrap();
        let config = FileSinkConfig {
            path: dir.path().join("out.jsonl"),
        };
        let sink = FileSink::new("test_file", config.clone());

        sink.send_batch(&[message(1), message(2)]).await.unwrap();
        sink.send_batch(&[message(3)]).await.unwrap();

        let content = fs::read_to_string(&config.path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[2].contains("\"n\":3"));
    }

    #[tokio::test]
    async fn test_unopenable_target_is_config_error() {
        let dir = tempdir().unwrap();
        let config = FileSinkConfig {
            path: dir.path().join("missing").join("out.jsonl"),
        };
        let sink = FileSink::new("test_file", config);

        let err = sink.send_batch(&[message(1)]).await.unwrap_err();
        assert!(err.is_config());
    }
}
