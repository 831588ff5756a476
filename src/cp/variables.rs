//! Time-domain variables.
//!
//! Every operation owns a start and an end domain, each an integer
//! interval. The duration is a constant, so the two domains are linked by
//! `end = start + duration`. Bounds are stored in a flat arena indexed by
//! operation id, which makes a snapshot a plain vector copy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{JobShopProblem, OperationId};

/// A domain wipe-out: some operation has no consistent start time left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("domain of operation {operation} is empty")]
pub struct Infeasible {
    /// The operation whose domain became empty.
    pub operation: OperationId,
}

/// Bounds of one operation's start and end domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBounds {
    /// Earliest start.
    pub start_min: i64,
    /// Latest start.
    pub start_max: i64,
    /// Earliest end.
    pub end_min: i64,
    /// Latest end.
    pub end_max: i64,
}

impl TimeBounds {
    /// Unconstrained domains `[0, horizon]` for start and end.
    pub fn unbounded(horizon: i64) -> Self {
        Self {
            start_min: 0,
            start_max: horizon,
            end_min: 0,
            end_max: horizon,
        }
    }

    /// Whether start (and hence end) is a single value.
    #[inline]
    pub fn is_fixed(&self) -> bool {
        self.start_min == self.start_max
    }
}

/// A saved copy of every operation's bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    bounds: Vec<TimeBounds>,
}

/// Mutable start/end domains for all operations of a problem.
#[derive(Debug, Clone)]
pub struct VariableStore {
    bounds: Vec<TimeBounds>,
    durations: Vec<i64>,
    horizon: i64,
}

impl VariableStore {
    /// Allocates one variable per operation with domains `[0, horizon]`.
    pub fn new(problem: &JobShopProblem) -> Self {
        let horizon = problem.horizon();
        Self {
            bounds: vec![TimeBounds::unbounded(horizon); problem.num_operations()],
            durations: problem.operations().iter().map(|op| op.duration).collect(),
            horizon,
        }
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    /// Whether the store holds no variables.
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Global upper bound on any end time.
    pub fn horizon(&self) -> i64 {
        self.horizon
    }

    /// Current bounds of an operation.
    #[inline]
    pub fn bounds(&self, op: OperationId) -> TimeBounds {
        self.bounds[op]
    }

    /// Earliest start.
    #[inline]
    pub fn start_min(&self, op: OperationId) -> i64 {
        self.bounds[op].start_min
    }

    /// Latest start.
    #[inline]
    pub fn start_max(&self, op: OperationId) -> i64 {
        self.bounds[op].start_max
    }

    /// Earliest end.
    #[inline]
    pub fn end_min(&self, op: OperationId) -> i64 {
        self.bounds[op].end_min
    }

    /// Latest end.
    #[inline]
    pub fn end_max(&self, op: OperationId) -> i64 {
        self.bounds[op].end_max
    }

    /// Constant duration of an operation.
    #[inline]
    pub fn duration(&self, op: OperationId) -> i64 {
        self.durations[op]
    }

    /// Raises the earliest start to `value` (and the earliest end with it).
    ///
    /// Returns whether any bound moved. Never loosens.
    pub fn tighten_start_min(&mut self, op: OperationId, value: i64) -> Result<bool, Infeasible> {
        let d = self.durations[op];
        let b = &mut self.bounds[op];
        if value <= b.start_min {
            return Ok(false);
        }
        b.start_min = value;
        b.end_min = b.end_min.max(value + d);
        self.check(op)?;
        Ok(true)
    }

    /// Lowers the latest end to `value` (and the latest start with it).
    ///
    /// Returns whether any bound moved. Never loosens.
    pub fn tighten_end_max(&mut self, op: OperationId, value: i64) -> Result<bool, Infeasible> {
        let d = self.durations[op];
        let b = &mut self.bounds[op];
        if value >= b.end_max {
            return Ok(false);
        }
        b.end_max = value;
        b.start_max = b.start_max.min(value - d);
        self.check(op)?;
        Ok(true)
    }

    /// Re-derives each side of the `end = start + duration` link from the
    /// other.
    pub fn link(&mut self, op: OperationId) -> Result<bool, Infeasible> {
        let d = self.durations[op];
        let b = self.bounds[op];
        let mut changed = false;
        changed |= self.tighten_start_min(op, b.end_min - d)?;
        changed |= self.tighten_end_max(op, b.start_max + d)?;
        let b = &mut self.bounds[op];
        if b.start_min + d > b.end_min {
            b.end_min = b.start_min + d;
            changed = true;
        }
        if b.end_max - d < b.start_max {
            b.start_max = b.end_max - d;
            changed = true;
        }
        self.check(op)?;
        Ok(changed)
    }

    /// Caps every end domain at `limit`.
    ///
    /// Used to demand a strictly better makespan than the incumbent.
    pub fn cap_end(&mut self, limit: i64) -> Result<bool, Infeasible> {
        let mut changed = false;
        for op in 0..self.bounds.len() {
            changed |= self.tighten_end_max(op, limit)?;
        }
        Ok(changed)
    }

    /// Collapses an operation's start to `start` and its end to
    /// `start + duration`.
    ///
    /// # Errors
    /// `Infeasible` if `start` lies outside the current start domain.
    pub fn fix(&mut self, op: OperationId, start: i64) -> Result<(), Infeasible> {
        let d = self.durations[op];
        let b = &mut self.bounds[op];
        if start < b.start_min || start > b.start_max || start + d > b.end_max {
            return Err(Infeasible { operation: op });
        }
        *b = TimeBounds {
            start_min: start,
            start_max: start,
            end_min: start + d,
            end_max: start + d,
        };
        Ok(())
    }

    /// Whether an operation's start is a single value.
    pub fn is_fixed(&self, op: OperationId) -> bool {
        self.bounds[op].is_fixed()
    }

    /// Whether every operation is fixed.
    pub fn all_fixed(&self) -> bool {
        self.bounds.iter().all(TimeBounds::is_fixed)
    }

    /// Largest earliest-end over all operations.
    pub fn max_end_min(&self) -> i64 {
        self.bounds.iter().map(|b| b.end_min).max().unwrap_or(0)
    }

    /// Copies the current bounds.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            bounds: self.bounds.clone(),
        }
    }

    /// Restores bounds saved by [`snapshot`](Self::snapshot).
    ///
    /// # Panics
    /// If the snapshot was taken from a store of a different size.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.bounds.copy_from_slice(&snapshot.bounds);
    }

    fn check(&self, op: OperationId) -> Result<(), Infeasible> {
        let b = &self.bounds[op];
        if b.start_min > b.start_max || b.end_min > b.end_max || b.end_min > self.horizon {
            Err(Infeasible { operation: op })
        } else {
            Ok(())
        }
    }
}
