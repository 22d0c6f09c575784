//! # Orchestrator
//!
//! Fan-out / fan-in coordination of feeder runs.
//!
//! Responsibilities:
//! - Expand a request into work units (aliases, `all`, monthly cutoff)
//! - Submit units to a job executor and track them to completion
//! - Publish size-bounded progress snapshots
//! - Aggregate per-unit outcomes into one result
//! - Persist every run in a ledger so interrupted runs resume without
//!   re-submitting or re-publishing finished units
//!
//! ## Usage
//!
//! ```ignore
//! use orchestrator::{FeederRequest, Orchestrator};
//!
//! let orchestrator = Orchestrator::new(planner, executor, publisher, ledger, cancel);
//! let report = orchestrator.start(FeederRequest::parse("SiteA,SiteB", "Tag")).await?;
//! for line in report.results {
//!     println!("{line}");
//! }
//! ```

mod aggregator;
mod error;
mod executor;
mod expander;
mod handle;
mod ledger;
mod publisher;
mod run;
mod tracker;

pub use aggregator::aggregate;
pub use error::{AggregateFailure, FailedUnit, OrchestratorError, Result, ValidationError};
pub use executor::{JobExecutor, LocalJobExecutor, TaskExecutor};
pub use expander::{split_list, FeederRequest, UnitPlanner};
pub use handle::UnitHandle;
pub use ledger::{
    FileLedgerStore, LedgerStore, LocalLedgerStore, MemoryLedgerStore, RunOutput, RunRecord,
    RuntimeStatus, UnitRecord,
};
pub use publisher::{LogPublisher, PublishedStatus, WatchPublisher};
pub use run::{Orchestrator, RunReport};
pub use tracker::{ProgressTracker, TrackReport, TrackedUnit};
