//! Solution extraction.
//!
//! Reads a fully fixed variable store into a [`Schedule`]. Read-only: the
//! store is never modified.

use thiserror::Error;

use super::variables::VariableStore;
use crate::models::{JobShopProblem, OperationId, Schedule};

/// The store still has an operation with more than one possible start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation {operation} is not fixed")]
pub struct Unfixed {
    pub operation: OperationId,
}

/// Builds the schedule of a fixed store.
///
/// Records are grouped per machine and sorted by start; the makespan is the
/// latest end among the jobs' last operations.
///
/// # Errors
/// `Unfixed` for the first operation whose start is not a single value.
pub fn extract(problem: &JobShopProblem, store: &VariableStore) -> Result<Schedule, Unfixed> {
    let starts = (0..problem.num_operations())
        .map(|op| {
            if store.is_fixed(op) {
                Ok(store.start_min(op))
            } else {
                Err(Unfixed { operation: op })
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Schedule::from_starts(problem, &starts))
}
