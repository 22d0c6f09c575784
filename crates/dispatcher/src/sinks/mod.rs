//! Sink implementations
//!
//! Contains LogSink, FileSink, NetworkSink and the config-driven `AnySink`.

mod file;
mod log;
mod network;

pub use self::file::{FileSink, FileSinkConfig};
pub use self::log::LogSink;
pub use self::network::{NetworkSink, NetworkSinkConfig};

use contracts::{BatchSink, OutboundMessage, SinkConfig, SinkError, SinkType};
use tracing::debug;

/// Sink selected by configuration.
#[derive(Debug)]
pub enum AnySink {
    Log(LogSink),
    File(FileSink),
    Network(NetworkSink),
}

/// Build the sink described by `config`.
///
/// Parameter problems are not reported here; the sink answers every batch
/// with a configuration-class failure instead, so each unit records it.
pub fn create_sink(config: &SinkConfig) -> AnySink {
    debug!(sink = %config.name, sink_type = ?config.sink_type, "Creating sink");
    match config.sink_type {
        SinkType::Log => AnySink::Log(LogSink::new(&config.name)),
        SinkType::File => AnySink::File(FileSink::from_params(&config.name, &config.params)),
        SinkType::Network => {
            AnySink::Network(NetworkSink::from_params(&config.name, &config.params))
        }
    }
}

impl BatchSink for AnySink {
    fn name(&self) -> &str {
        match self {
            Self::Log(sink) => sink.name(),
            Self::File(sink) => sink.name(),
            Self::Network(sink) => sink.name(),
        }
    }

    async fn send_batch(&self, batch: &[OutboundMessage]) -> Result<(), SinkError> {
        match self {
            Self::Log(sink) => sink.send_batch(batch).await,
            Self::File(sink) => sink.send_batch(batch).await,
            Self::Network(sink) => sink.send_batch(batch).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_create_sink_from_config() {
        let config = SinkConfig {
            name: "events".into(),
            sink_type: SinkType::Network,
            params: HashMap::from([("addr".to_string(), "127.0.0.1:9999".to_string())]),
        };
        let sink = create_sink(&config);
        assert!(matches!(sink, AnySink::Network(_)));
        assert_eq!(sink.name(), "events");
    }
}
