//! Logging and metrics for the feeder: one call installs the tracing
//! subscriber (plus an optional Prometheus exporter), and the `metrics`
//! module holds the counters and histograms the orchestrator records into.
//!
//! ```ignore
//! observability::init_with_config(ObservabilityConfig::default())?;
//!
//! observability::record_units_submitted(specs.len());
//! observability::record_unit_completed(UnitStatus::Finished, 12.5);
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

pub use crate::metrics::{
    record_batch_dispatched, record_degraded_run, record_snapshot_published,
    record_snapshot_suppressed, record_unit_completed, record_unit_failure,
    record_units_submitted, RunMetricsAggregator, RunSummary, RunningStats, StatsSummary,
};

/// Observability settings
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,
    /// Prometheus port, `None` disables the exporter
    pub metrics_port: Option<u16>,
    /// Level used when `RUST_LOG` is unset
    pub default_log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            metrics_port: None,
            default_log_level: "info".to_string(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured JSON lines
    #[default]
    Json,
    /// Multi-line, human readable
    Pretty,
    /// Single line
    Compact,
}

/// Install the tracing subscriber and, if configured, the Prometheus exporter.
///
/// `RUST_LOG` wins over `default_log_level` when set.
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level));

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init()
        .context("tracing subscriber already installed")?;

    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::debug!(log_format = ?config.log_format, "Logging ready");
    Ok(())
}

/// Install only the Prometheus exporter on `0.0.0.0:port`.
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .with_context(|| format!("cannot serve metrics on port {port}"))?;

    tracing::info!(port, "Prometheus exporter listening");
    Ok(())
}
