//! # Ingestion
//!
//! Query source and mapper collaborators of the dispatch pipeline.
//!
//! Responsibilities:
//! - Stream raw events per unit (`JsonLinesSource`, `MemorySource`)
//! - Map raw events into outbound messages (`EnvelopeMapper`)
//! - Count opened streams and events read
//!
//! ## Usage Example
//!
//! ```ignore
//! use contracts::{MessageMapper, QuerySource, UnitSpec};
//! use ingestion::{EnvelopeMapper, JsonLinesSource};
//!
//! let source = JsonLinesSource::new("./data");
//! let unit = UnitSpec::new("SiteA".into(), "Tag".into());
//! let mut events = source.fetch(&unit).await?;
//! while let Some(event) = events.next().await {
//!     let messages = EnvelopeMapper.map(&event?, &unit)?;
//! }
//! ```

mod config;
mod json_lines;
mod mapper;
mod memory;

pub use config::{MetricsSnapshot, SourceMetrics};
pub use json_lines::JsonLinesSource;
pub use mapper::EnvelopeMapper;
pub use memory::MemorySource;
