//! Batcher - fixed-size, order-preserving chunking

use contracts::OutboundMessage;

/// Accumulates items and hands out full batches.
///
/// Every batch holds exactly `batch_size` items except possibly the last one
/// returned by [`finish`](Self::finish). Concatenating all batches yields the
/// pushed sequence unchanged.
#[derive(Debug)]
pub struct Batcher<T = OutboundMessage> {
    batch_size: usize,
    current: Vec<T>,
}

impl<T> Batcher<T> {
    /// A zero `batch_size` is treated as 1.
    pub fn new(batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            batch_size,
            current: Vec::with_capacity(batch_size),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Add an item; returns a batch once `batch_size` items are buffered.
    pub fn push(&mut self, item: T) -> Option<Vec<T>> {
        self.current.push(item);
        if self.current.len() < self.batch_size {
            return None;
        }
        Some(std::mem::replace(
            &mut self.current,
            Vec::with_capacity(self.batch_size),
        ))
    }

    /// Remaining partial batch, if any.
    pub fn finish(self) -> Option<Vec<T>> {
        (!self.current.is_empty()).then_some(self.current)
    }
}
