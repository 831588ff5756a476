//! Machine model.
//!
//! A machine is a unary (disjunctive) resource: it processes at most one
//! operation at a time.

use serde::{Deserialize, Serialize};

use super::OperationId;

/// A machine and the operations that require it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    /// Machine index.
    pub id: usize,
    /// Operations assigned to this machine, in discovery order
    /// (job-major, then position within the job).
    pub operations: Vec<OperationId>,
}

impl Machine {
    /// Creates a machine with no operations.
    pub fn new(id: usize) -> Self {
        Self {
            id,
            operations: Vec::new(),
        }
    }

    /// Number of operations on this machine.
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    /// Whether no operation uses this machine.
    pub fn is_idle(&self) -> bool {
        self.operations.is_empty()
    }

    /// Unordered operation pairs `(i, j)` with `i < j` in list order.
    ///
    /// Each pair is one disjunctive (either-order) decision.
    pub fn pairs(&self) -> impl Iterator<Item = (OperationId, OperationId)> + '_ {
        self.operations
            .iter()
            .enumerate()
            .flat_map(move |(i, &a)| self.operations[i + 1..].iter().map(move |&b| (a, b)))
    }
}
