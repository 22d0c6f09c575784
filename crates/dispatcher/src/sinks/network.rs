//! NetworkSink - one UDP datagram per batch

use contracts::{BatchSink, OutboundMessage, SinkError};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{debug, error, instrument, warn};

/// Default datagram ceiling, below the IPv4 UDP limit of 65507
const DEFAULT_MAX_PACKET_SIZE: usize = 65000;

/// Configuration for NetworkSink
#[derive(Debug, Clone)]
pub struct NetworkSinkConfig {
    /// Target address
    pub addr: SocketAddr,
    /// Max datagram size
    pub max_packet_size: usize,
}

impl NetworkSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let addr_str = params
            .get("addr")
            .ok_or_else(|| "missing 'addr' parameter".to_string())?;

        let addr: SocketAddr = addr_str
            .parse()
            .map_err(|e| format!("invalid address '{}': {}", addr_str, e))?;

        let max_packet_size = match params.get("max_packet_size") {
            Some(s) => s
                .parse()
                .map_err(|e| format!("invalid max_packet_size '{}': {}", s, e))?,
            None => DEFAULT_MAX_PACKET_SIZE,
        };

        Ok(Self {
            addr,
            max_packet_size,
        })
    }
}

/// Sink that sends each batch as a JSON array over UDP.
///
/// A socket is bound and connected per batch and dropped afterwards.
/// Invalid parameters are kept and reported on every send as a
/// configuration failure.
#[derive(Debug)]
pub struct NetworkSink {
    name: String,
    config: Result<NetworkSinkConfig, String>,
}

impl NetworkSink {
    /// Create a new NetworkSink
    pub fn new(name: impl Into<String>, config: NetworkSinkConfig) -> Self {
        Self {
            name: name.into(),
            config: Ok(config),
        }
    }

    /// Create from params (for factory)
    pub fn from_params(name: impl Into<String>, params: &HashMap<String, String>) -> Self {
        let name = name.into();
        let config = NetworkSinkConfig::from_params(params);
        if let Err(e) = &config {
            warn!(sink = %name, error = %e, "Network sink misconfigured");
        }
        Self { name, config }
    }

    fn config(&self) -> Result<&NetworkSinkConfig, SinkError> {
        self.config
            .as_ref()
            .map_err(|e| SinkError::config(&self.name, e.clone()))
    }

    fn prepare_payload(
        &self,
        config: &NetworkSinkConfig,
        batch: &[OutboundMessage],
    ) -> Result<Vec<u8>, SinkError> {
        let data = serde_json::to_vec(batch)
            .map_err(|e| SinkError::transport(&self.name, format!("json error: {e}")))?;

        if data.len() > config.max_packet_size {
            return Err(SinkError::transport(
                &self.name,
                format!(
                    "datagram of {} bytes exceeds max_packet_size {}",
                    data.len(),
                    config.max_packet_size
                ),
            ));
        }
        Ok(data)
    }

    async fn connect(&self, addr: SocketAddr) -> Result<UdpSocket, SinkError> {
        let bind_addr = if addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| SinkError::config(&self.name, format!("bind failed: {e}")))?;
        socket
            .connect(addr)
            .await
            .map_err(|e| SinkError::config(&self.name, format!("connect to {addr} failed: {e}")))?;
        Ok(socket)
    }
}

impl BatchSink for NetworkSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "network_sink_send",
        skip(self, batch),
        fields(sink = %self.name, size = batch.len())
    )]
    async fn send_batch(&self, batch: &[OutboundMessage]) -> Result<(), SinkError> {
        let config = self.config()?;
        let data = self.prepare_payload(config, batch)?;
        let socket = self.connect(config.addr).await?;

        match socket.send(&data).await {
            Ok(sent) => {
                debug!(sink = %self.name, bytes = sent, "Sent");
                Ok(())
            }
            Err(e) => {
                error!(sink = %self.name, error = %e, "UDP send failed");
                Err(SinkError::transport(&self.name, e.to_string()))
            }
        }
    }
}
