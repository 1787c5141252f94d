//! Batch scheduling over the ordered contact sequence.
//!
//! Batches are positional: contact `i` belongs to batch `i / batch_size + 1`. A batch
//! boundary is signalled before the first contact of each batch, and a batch delay is
//! due after the last contact of every batch except the final one.

/// Signalled before the first contact of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchBoundary {
    /// 1-based batch number
    pub number: usize,
    pub total_batches: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchScheduler {
    batch_size: usize,
    total: usize,
}

impl BatchScheduler {
    /// `batch_size` of zero is treated as one.
    pub fn new(batch_size: usize, total: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            total,
        }
    }

    /// `ceil(total / batch_size)`
    pub fn total_batches(&self) -> usize {
        self.total.div_ceil(self.batch_size)
    }

    /// The batch boundary to signal before processing `index`, if any.
    pub fn boundary_before(&self, index: usize) -> Option<BatchBoundary> {
        if index >= self.total || index % self.batch_size != 0 {
            return None;
        }
        Some(BatchBoundary {
            number: index / self.batch_size + 1,
            total_batches: self.total_batches(),
        })
    }

    /// Whether `index` closes a batch that is followed by another one.
    pub fn delay_after(&self, index: usize) -> bool {
        let next = index + 1;
        next < self.total && next % self.batch_size == 0
    }

    /// 1-based number of the batch containing `index`.
    pub fn batch_of(&self, index: usize) -> usize {
        index / self.batch_size + 1
    }

    /// Index ranges of every batch, in order.
    #[cfg(test)]
    fn batches(&self) -> Vec<std::ops::Range<usize>> {
        (0..self.total)
            .step_by(self.batch_size)
            .map(|start| start..(start + self.batch_size).min(self.total))
            .collect()
    }
}
