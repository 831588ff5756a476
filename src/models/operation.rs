//! Operation model.
//!
//! An operation is the smallest schedulable unit of work: one step of a
//! job that occupies a single machine for a fixed duration.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 2

use serde::{Deserialize, Serialize};

/// Dense operation index into a problem's operation arena.
///
/// Operations are numbered job by job, in execution order.
pub type OperationId = usize;

/// An operation to be scheduled.
///
/// Immutable once the problem is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Arena index.
    pub id: OperationId,
    /// Owning job index.
    pub job: usize,
    /// Position within the job (0-indexed).
    pub position: usize,
    /// Required machine index.
    pub machine: usize,
    /// Processing time (strictly positive).
    pub duration: i64,
}

impl Operation {
    /// Creates a new operation.
    pub fn new(id: OperationId, job: usize, position: usize, machine: usize, duration: i64) -> Self {
        Self {
            id,
            job,
            position,
            machine,
            duration,
        }
    }

    /// Whether this is the first operation of its job.
    #[inline]
    pub fn is_first(&self) -> bool {
        self.position == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_fields() {
        let op = Operation::new(4, 1, 2, 0, 7);
        assert_eq!(op.id, 4);
        assert_eq!(op.job, 1);
        assert_eq!(op.position, 2);
        assert_eq!(op.machine, 0);
        assert_eq!(op.duration, 7);
        assert!(!op.is_first());
        assert!(Operation::new(0, 0, 0, 0, 1).is_first());
    }
}
