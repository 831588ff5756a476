//! Precedence propagation.
//!
//! A precedence arc `before -> after` states `after.start >= before.end`.
//! Propagating it raises `after.start_min` to `before.end_min` and lowers
//! `before.end_max` to `after.start_max`. Job chains contribute a fixed set
//! of arcs; resolved disjunctions contribute more during search.
//!
//! Propagation sweeps all active arcs until a full pass changes nothing.
//! Bounds only tighten, and each tightening moves a bound by at least one
//! time unit inside `[0, horizon]`, so the sweep terminates.
//!
//! # Reference
//! Baptiste, Le Pape & Nuijten (2001), "Constraint-Based Scheduling", Ch. 1

use serde::{Deserialize, Serialize};

use super::variables::{Infeasible, VariableStore};
use crate::models::{JobShopProblem, OperationId};

/// `after` may not start before `before` ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Precedence {
    /// Operation that must finish first.
    pub before: OperationId,
    /// Operation that waits for `before`.
    pub after: OperationId,
}

impl Precedence {
    /// Creates the arc `before -> after`.
    pub fn new(before: OperationId, after: OperationId) -> Self {
        Self { before, after }
    }

    /// Applies the arc once. Returns whether any bound moved.
    pub fn apply(&self, store: &mut VariableStore) -> Result<bool, Infeasible> {
        let mut changed = store.tighten_start_min(self.after, store.end_min(self.before))?;
        changed |= store.tighten_end_max(self.before, store.start_max(self.after))?;
        Ok(changed)
    }

    /// Whether the arc holds for fixed (or fully separated) domains.
    pub fn is_entailed(&self, store: &VariableStore) -> bool {
        store.end_max(self.before) <= store.start_min(self.after)
    }
}

/// Statistics of one propagation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagationReport {
    /// Full sweeps over the arc set, including the final quiet one.
    pub passes: usize,
    /// Arc applications that moved at least one bound.
    pub tightenings: usize,
}

/// Enforces job precedences plus any extra arcs to a fixed point.
#[derive(Debug, Clone)]
pub struct ConstraintEngine {
    job_arcs: Vec<Precedence>,
}

impl ConstraintEngine {
    /// Collects the intra-job arcs of a problem.
    pub fn new(problem: &JobShopProblem) -> Self {
        let job_arcs = problem
            .jobs()
            .iter()
            .flat_map(|job| job.chain().map(|(a, b)| Precedence::new(a, b)))
            .collect();
        Self { job_arcs }
    }

    /// Intra-job arcs.
    pub fn job_arcs(&self) -> &[Precedence] {
        &self.job_arcs
    }

    /// Propagates job arcs and `extra` arcs until nothing changes.
    ///
    /// The duration link of every variable is enforced first.
    ///
    /// # Errors
    /// `Infeasible` as soon as any domain empties. The store is then in a
    /// partially tightened state and must be restored by the caller.
    pub fn propagate(
        &self,
        store: &mut VariableStore,
        extra: &[Precedence],
    ) -> Result<PropagationReport, Infeasible> {
        for op in 0..store.len() {
            store.link(op)?;
        }

        let mut report = PropagationReport::default();
        loop {
            report.passes += 1;
            let mut changed = false;
            for arc in self.job_arcs.iter().chain(extra) {
                if arc.apply(store)? {
                    report.tightenings += 1;
                    changed = true;
                }
            }
            if !changed {
                return Ok(report);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem() -> JobShopProblem {
        // J0: M0(3) -> M1(2) -> M2(2); J1: M1(4)
        JobShopProblem::new(vec![vec![(0, 3), (1, 2), (2, 2)], vec![(1, 4)]]).unwrap()
    }

    #[test]
    fn test_job_arcs() {
        let engine = ConstraintEngine::new(&problem());
        assert_eq!(
            engine.job_arcs(),
            &[Precedence::new(0, 1), Precedence::new(1, 2)]
        );
    }

    #[test]
    fn test_forward_and_backward_pass() {
        let p = problem();
        let engine = ConstraintEngine::new(&p);
        let mut store = VariableStore::new(&p);
        engine.propagate(&mut store, &[]).unwrap();

        // Horizon 11. Earliest starts 0, 3, 5; latest ends 7, 9, 11.
        assert_eq!(store.start_min(1), 3);
        assert_eq!(store.start_min(2), 5);
        assert_eq!(store.end_max(0), 7);
        assert_eq!(store.end_max(1), 9);
        assert_eq!(store.start_max(0), 4);
        // J1 is unconstrained.
        assert_eq!(store.start_min(3), 0);
        assert_eq!(store.end_max(3), 11);
    }

    #[test]
    fn test_fixed_point_is_stable() {
        let p = problem();
        let engine = ConstraintEngine::new(&p);
        let mut store = VariableStore::new(&p);
        engine.propagate(&mut store, &[]).unwrap();
        let snap = store.snapshot();
        let report = engine.propagate(&mut store, &[]).unwrap();
        assert_eq!(report.tightenings, 0);
        assert_eq!(report.passes, 1);
        assert_eq!(store.snapshot(), snap);
    }

    #[test]
    fn test_extra_arc() {
        let p = problem();
        let engine = ConstraintEngine::new(&p);
        let mut store = VariableStore::new(&p);
        // J1 (op 3) before J0's second operation (op 1) on M1.
        engine
            .propagate(&mut store, &[Precedence::new(3, 1)])
            .unwrap();
        assert_eq!(store.start_min(1), 4);
        assert_eq!(store.start_min(2), 6);
        // Backward: op 3 must end by op 1's latest start (7).
        assert_eq!(store.end_max(3), 7);
    }

    #[test]
    fn test_cycle_is_infeasible() {
        let p = problem();
        let engine = ConstraintEngine::new(&p);
        let mut store = VariableStore::new(&p);
        // op 2 before op 0 closes a cycle with the job chain.
        assert!(engine
            .propagate(&mut store, &[Precedence::new(2, 0)])
            .is_err());
    }

    #[test]
    fn test_entailment_after_fixing() {
        let p = problem();
        let mut store = VariableStore::new(&p);
        store.fix(0, 0).unwrap();
        store.fix(1, 3).unwrap();
        assert!(Precedence::new(0, 1).is_entailed(&store));
        assert!(!Precedence::new(1, 0).is_entailed(&store));
    }
}
