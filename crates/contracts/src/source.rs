//! QuerySource / MessageMapper traits - Dispatch pipeline input interfaces

use crate::{ContractError, EventStream, OutboundMessage, RawEvent, UnitSpec};

/// Produces the raw events of one unit.
#[trait_variant::make(QuerySource: Send)]
pub trait LocalQuerySource {
    /// Open a lazy event sequence for `unit`.
    ///
    /// Resources backing the stream are owned by it and released when it is
    /// dropped, whatever the exit path.
    async fn fetch(&self, unit: &UnitSpec) -> Result<EventStream, ContractError>;
}

/// Transforms raw events into outbound messages (1:N).
pub trait MessageMapper: Send + Sync {
    fn map(&self, event: &RawEvent, unit: &UnitSpec) -> Result<Vec<OutboundMessage>, ContractError>;
}
