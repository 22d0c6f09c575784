//! # Contracts
//!
//! Frozen interface contracts shared by every feeder crate: the work unit
//! data model, the error taxonomy, collaborator traits and the blueprint.
//! Business crates depend only on this crate, never on each other in reverse.
//!
//! ## Unit model
//! - A unit is identified by `(dimension, subject[, sub_key])`
//! - Its status only moves forward: `Pending -> Running -> terminal`

mod blueprint;
mod catalog;
mod error;
mod event;
mod name;
mod sink;
mod snapshot;
mod source;
mod status;
mod unit;

pub use blueprint::*;
pub use catalog::Catalog;
pub use error::*;
pub use event::*;
pub use name::{Dimension, Subject};
pub use sink::*;
pub use snapshot::ProgressSnapshot;
pub use source::*;
pub use status::*;
pub use unit::*;
