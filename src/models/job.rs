//! Job model.
//!
//! A job is an ordered chain of operations. Each operation may start only
//! after its predecessor in the job has finished.

use serde::{Deserialize, Serialize};

use super::OperationId;

/// A job to be scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Job index.
    pub id: usize,
    /// Operation ids in execution order.
    pub operations: Vec<OperationId>,
}

impl Job {
    /// Creates an empty job.
    pub fn new(id: usize) -> Self {
        Self {
            id,
            operations: Vec::new(),
        }
    }

    /// Appends an operation to the end of the chain.
    pub fn with_operation(mut self, op: OperationId) -> Self {
        self.operations.push(op);
        self
    }

    /// Number of operations.
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    /// The first operation, if any.
    pub fn first(&self) -> Option<OperationId> {
        self.operations.first().copied()
    }

    /// The last operation, if any. Its end time is the job's completion.
    pub fn last(&self) -> Option<OperationId> {
        self.operations.last().copied()
    }

    /// Consecutive `(predecessor, successor)` pairs.
    pub fn chain(&self) -> impl Iterator<Item = (OperationId, OperationId)> + '_ {
        self.operations.windows(2).map(|w| (w[0], w[1]))
    }
}
