//! StatusPublisher trait - progress reporting interface

use crate::{ContractError, ProgressSnapshot};

/// Receives progress snapshots of a run.
///
/// Publishers reject payloads above their own transport ceiling with
/// [`ContractError::StatusTooLarge`].
#[trait_variant::make(StatusPublisher: Send)]
pub trait LocalStatusPublisher {
    async fn publish(&self, run_id: &str, snapshot: &ProgressSnapshot) -> Result<(), ContractError>;
}

/// Reject `snapshot` when it does not fit into `ceiling_kib`.
pub fn check_transport_ceiling(
    snapshot: &ProgressSnapshot,
    ceiling_kib: usize,
) -> Result<(), ContractError> {
    let size_bytes = snapshot.payload_bytes();
    let ceiling_bytes = ceiling_kib * 1024;
    if size_bytes > ceiling_bytes {
        return Err(ContractError::StatusTooLarge {
            size_bytes,
            ceiling_bytes,
        });
    }
    Ok(())
}
