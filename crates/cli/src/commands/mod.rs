//! Command implementations.

mod info;
mod list;
mod purge;
mod run;
mod status;
mod validate;

pub use info::run_info;
pub use list::run_list;
pub use purge::run_purge;
pub use run::run_feeder;
pub use status::run_status;
pub use validate::run_validate;
