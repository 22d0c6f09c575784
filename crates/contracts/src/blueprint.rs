//! FeederBlueprint - Config Loader output
//!
//! Describes a complete feeder deployment: catalogs, event source, sink,
//! batching, progress tracking, execution and the run ledger.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use validator::Validate;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete feeder configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FeederBlueprint {
    #[serde(default)]
    pub version: ConfigVersion,

    #[validate(nested)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub source: SourceConfig,

    pub sink: SinkConfig,

    #[serde(default)]
    #[validate(nested)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    #[validate(nested)]
    pub tracker: TrackerConfig,

    #[serde(default)]
    #[validate(nested)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Known dimensions, subjects and aliases
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CatalogConfig {
    #[validate(length(min = 1, message = "at least one dimension is required"))]
    pub dimensions: Vec<String>,

    #[validate(length(min = 1, message = "at least one subject is required"))]
    pub subjects: Vec<String>,

    /// Subject processed as twelve monthly units
    #[serde(default)]
    pub cutoff_subject: Option<String>,

    /// Alias -> member dimensions
    #[serde(default)]
    pub aliases: BTreeMap<String, Vec<String>>,
}

/// Location of raw event files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_root")]
    pub root: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            root: default_source_root(),
        }
    }
}

fn default_source_root() -> PathBuf {
    PathBuf::from("./data")
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log output
    Log,
    /// Append JSON lines to a file
    File,
    /// UDP datagrams
    Network,
}

/// Batching of outbound messages
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DispatchConfig {
    #[serde(default = "default_batch_size")]
    #[validate(range(min = 1, message = "batch_size must be >= 1"))]
    pub batch_size: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

pub const DEFAULT_BATCH_SIZE: usize = 250;

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

/// Progress tracking limits
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TrackerConfig {
    /// Above this size per-unit detail is no longer published
    #[serde(default = "default_status_ceiling_kib")]
    #[validate(range(min = 1))]
    pub status_ceiling_kib: usize,

    /// Hard limit of the status transport
    #[serde(default = "default_transport_ceiling_kib")]
    #[validate(range(min = 1))]
    pub transport_ceiling_kib: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            status_ceiling_kib: default_status_ceiling_kib(),
            transport_ceiling_kib: default_transport_ceiling_kib(),
        }
    }
}

pub const DEFAULT_STATUS_CEILING_KIB: usize = 14;
pub const DEFAULT_TRANSPORT_CEILING_KIB: usize = 16;

fn default_status_ceiling_kib() -> usize {
    DEFAULT_STATUS_CEILING_KIB
}

fn default_transport_ceiling_kib() -> usize {
    DEFAULT_TRANSPORT_CEILING_KIB
}

/// Unit execution limits
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExecutorConfig {
    #[serde(default = "default_max_concurrent_units")]
    #[validate(range(min = 1, message = "max_concurrent_units must be >= 1"))]
    pub max_concurrent_units: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_units: default_max_concurrent_units(),
        }
    }
}

fn default_max_concurrent_units() -> usize {
    16
}

/// Persisted run records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_ledger_dir")]
    pub dir: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            dir: default_ledger_dir(),
        }
    }
}

fn default_ledger_dir() -> PathBuf {
    PathBuf::from("./runs")
}
