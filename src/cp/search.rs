//! Depth-first branch-and-bound over disjunctive decisions.
//!
//! # Algorithm
//!
//! Each node is the set of resolved disjunctions plus the bounds implied by
//! propagating them. At a node:
//!
//! 1. Propagate job arcs and resolved disjunctions, with every end domain
//!    capped at `best - 1` once an incumbent exists. A wipe-out makes the
//!    node `Infeasible`.
//! 2. Compute a makespan lower bound. If it reaches the incumbent the node
//!    is `BoundedOut`.
//! 3. If every disjunction is resolved the node is a `FeasibleLeaf`: each
//!    operation is fixed at its earliest start and the schedule is read off.
//! 4. Otherwise the node is `Branching`: the budget is checked, the first
//!    undecided pair is resolved `ABeforeB`, explored, undone, then resolved
//!    `BBeforeA` and explored.
//!
//! The descent is a loop over an explicit stack of decision frames, so its
//! depth (up to the number of disjunctions) lives on the heap. Undo is a
//! snapshot restore of the flat bound array.
//!
//! # Lower Bound
//!
//! `max(max end_min, max over machines of (min head + load + min tail))`
//! where head is an operation's earliest start and tail the work left in
//! its job after it.
//!
//! # Reference
//! Brucker, Jurisch & Sievers (1994), "A branch and bound algorithm for the
//! job-shop scheduling problem", Discrete Applied Mathematics 49.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::disjunction::{DisjunctionSet, DisjunctionState};
use super::extract::extract;
use super::propagation::{ConstraintEngine, Precedence};
use super::variables::{Infeasible, Snapshot, VariableStore};
use crate::models::{JobShopProblem, Schedule};

/// Classification of a search node after propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeState {
    /// Consistent, with undecided disjunctions left.
    Branching,
    /// Every disjunction resolved and all domains consistent.
    FeasibleLeaf,
    /// Propagation emptied a domain.
    Infeasible,
    /// Lower bound cannot beat the incumbent.
    BoundedOut,
}

/// Counters collected during search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Nodes evaluated, pruned ones included.
    pub nodes: u64,
    /// Complete schedules reached.
    pub leaves: u64,
    /// Nodes pruned by a domain wipe-out.
    pub infeasible: u64,
    /// Nodes pruned by the lower bound.
    pub bounded_out: u64,
    /// Incumbent improvements found by the search.
    pub improvements: u64,
    /// Deepest decision level reached.
    pub max_depth: usize,
}

impl SearchStats {
    /// Adds another worker's counters.
    pub fn merge(&mut self, other: &SearchStats) {
        self.nodes += other.nodes;
        self.leaves += other.leaves;
        self.infeasible += other.infeasible;
        self.bounded_out += other.bounded_out;
        self.improvements += other.improvements;
        self.max_depth = self.max_depth.max(other.max_depth);
    }
}

/// Cooperative search budget.
#[derive(Debug, Clone, Default)]
pub struct Budget {
    deadline: Option<Instant>,
    node_limit: Option<u64>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Budget {
    /// A budget that never runs out.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Stops once `deadline` has passed.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Stops once this many nodes have been explored.
    pub fn with_node_limit(mut self, limit: u64) -> Self {
        self.node_limit = Some(limit);
        self
    }

    /// Stops once the flag is set to `true`.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Whether the search must stop after `nodes` explored nodes.
    pub fn is_exhausted(&self, nodes: u64) -> bool {
        if self.node_limit.is_some_and(|limit| nodes >= limit) {
            return true;
        }
        if self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            return true;
        }
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// State shared by every worker of one solve.
#[derive(Debug)]
pub(crate) struct SharedSearch {
    best: AtomicI64,
    nodes: AtomicU64,
    found: AtomicBool,
}

impl SharedSearch {
    pub(crate) fn new(incumbent: Option<i64>) -> Self {
        Self {
            best: AtomicI64::new(incumbent.unwrap_or(i64::MAX)),
            nodes: AtomicU64::new(0),
            found: AtomicBool::new(false),
        }
    }

    /// Best makespan so far, `i64::MAX` if none.
    pub(crate) fn best(&self) -> i64 {
        self.best.load(Ordering::Acquire)
    }

    /// Total nodes over all workers.
    pub(crate) fn nodes(&self) -> u64 {
        self.nodes.load(Ordering::Relaxed)
    }

    fn offer(&self, makespan: i64) -> bool {
        self.best.fetch_min(makespan, Ordering::AcqRel) > makespan
    }
}

/// What a worker hands back when its subtree is done.
#[derive(Debug, Clone, Default)]
pub(crate) struct WorkerOutcome {
    pub(crate) best: Option<Schedule>,
    pub(crate) stats: SearchStats,
    pub(crate) exhausted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Node closed; move on to its next sibling.
    Continue,
    /// Node needs branching.
    Descend,
    /// Abandon the whole search.
    Stop,
}

/// Orders tried at every decision, in sequence.
const BRANCH_ORDER: [DisjunctionState; 2] = [DisjunctionState::ABeforeB, DisjunctionState::BBeforeA];

/// One open decision on the descent stack.
#[derive(Debug)]
struct Frame {
    /// Disjunction being branched on.
    index: usize,
    /// Orders of `BRANCH_ORDER` already tried.
    tried: usize,
    /// Whether the current child's decision is applied and must be undone.
    applied: bool,
    /// Parent node bounds.
    snapshot: Snapshot,
}

/// One depth-first branch-and-bound worker.
///
/// Owns its variable store and disjunction states; shares only the
/// incumbent makespan and node counter.
#[derive(Debug, Clone)]
pub(crate) struct BranchAndBound<'a> {
    problem: &'a JobShopProblem,
    engine: &'a ConstraintEngine,
    shared: &'a SharedSearch,
    budget: &'a Budget,
    stop_after_first: bool,
    store: VariableStore,
    disjunctions: DisjunctionSet,
    arcs: Vec<Precedence>,
    machine_loads: Vec<i64>,
    outcome: WorkerOutcome,
}

impl<'a> BranchAndBound<'a> {
    /// Sets up the root node and propagates job precedences.
    ///
    /// # Errors
    /// `Infeasible` if the root node itself is inconsistent.
    pub(crate) fn new(
        problem: &'a JobShopProblem,
        engine: &'a ConstraintEngine,
        shared: &'a SharedSearch,
        budget: &'a Budget,
        stop_after_first: bool,
    ) -> Result<Self, Infeasible> {
        let mut store = VariableStore::new(problem);
        engine.propagate(&mut store, &[])?;
        Ok(Self {
            problem,
            engine,
            shared,
            budget,
            stop_after_first,
            store,
            disjunctions: DisjunctionSet::new(problem),
            arcs: Vec::new(),
            machine_loads: (0..problem.num_machines())
                .map(|m| problem.machine_load(m))
                .collect(),
            outcome: WorkerOutcome::default(),
        })
    }

    /// Number of disjunctive pairs.
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    pub(crate) fn disjunction_count(&self) -> usize {
        self.disjunctions.len()
    }

    /// Makespan lower bound of the current node.
    pub(crate) fn lower_bound(&self) -> i64 {
        let mut bound = self.store.max_end_min();
        for machine in self.problem.machines() {
            let ops = &machine.operations;
            let Some(head) = ops.iter().map(|&op| self.store.start_min(op)).min() else {
                continue;
            };
            let tail = ops
                .iter()
                .map(|&op| self.problem.tail(op))
                .min()
                .unwrap_or(0);
            let machine_bound = head
                .saturating_add(self.machine_loads[machine.id])
                .saturating_add(tail);
            bound = bound.max(machine_bound);
        }
        bound
    }

    /// Resolves the first undecided pairs in order with the given states.
    ///
    /// The resulting node is propagated by [`run`](Self::run).
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    pub(crate) fn with_prefix(mut self, prefix: &[DisjunctionState]) -> Self {
        for &state in prefix {
            let Some(index) = self.disjunctions.next_undecided() else {
                break;
            };
            match self.disjunctions.decide(index, state) {
                Some(arc) => self.arcs.push(arc),
                None => break,
            }
        }
        self
    }

    /// Explores the subtree under the current node.
    pub(crate) fn run(mut self) -> WorkerOutcome {
        let base = self.disjunctions.decided_count();
        let state = self.evaluate();
        if self.visit(state, base) != Flow::Descend {
            return self.outcome;
        }

        let mut stack = Vec::new();
        self.open_frame(&mut stack);
        while let Some(frame) = stack.last_mut() {
            if frame.applied {
                self.arcs.pop();
                self.disjunctions.undo(frame.index);
                self.store.restore(&frame.snapshot);
                frame.applied = false;
            }
            let Some(&order) = BRANCH_ORDER.get(frame.tried) else {
                stack.pop();
                continue;
            };
            frame.tried += 1;
            let Some(arc) = self.disjunctions.decide(frame.index, order) else {
                continue;
            };
            self.arcs.push(arc);
            frame.applied = true;

            let depth = base + stack.len();
            let state = self.evaluate();
            match self.visit(state, depth) {
                Flow::Continue => {}
                Flow::Descend => self.open_frame(&mut stack),
                Flow::Stop => break,
            }
        }
        self.outcome
    }

    /// Pushes a frame for the first undecided pair of the current node.
    fn open_frame(&self, stack: &mut Vec<Frame>) {
        if let Some(index) = self.disjunctions.next_undecided() {
            stack.push(Frame {
                index,
                tried: 0,
                applied: false,
                snapshot: self.store.snapshot(),
            });
        }
    }

    fn propagate(&mut self) -> Result<(), Infeasible> {
        let best = self.shared.best();
        if best != i64::MAX {
            self.store.cap_end(best - 1)?;
        }
        self.engine.propagate(&mut self.store, &self.arcs)?;
        Ok(())
    }

    fn evaluate(&mut self) -> NodeState {
        if self.propagate().is_err() {
            return NodeState::Infeasible;
        }
        if self.lower_bound() >= self.shared.best() {
            return NodeState::BoundedOut;
        }
        if self.disjunctions.is_complete() {
            NodeState::FeasibleLeaf
        } else {
            NodeState::Branching
        }
    }

    fn visit(&mut self, state: NodeState, depth: usize) -> Flow {
        self.outcome.stats.nodes += 1;
        self.outcome.stats.max_depth = self.outcome.stats.max_depth.max(depth);
        let nodes = self.shared.nodes.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(depth, state = ?state, "node");

        match state {
            NodeState::Infeasible => {
                self.outcome.stats.infeasible += 1;
                Flow::Continue
            }
            NodeState::BoundedOut => {
                self.outcome.stats.bounded_out += 1;
                Flow::Continue
            }
            NodeState::FeasibleLeaf => self.record_leaf(),
            NodeState::Branching => {
                if self.stop_after_first && self.shared.found.load(Ordering::Relaxed) {
                    return Flow::Stop;
                }
                if self.budget.is_exhausted(nodes) {
                    self.outcome.exhausted = true;
                    return Flow::Stop;
                }
                Flow::Descend
            }
        }
    }

    fn record_leaf(&mut self) -> Flow {
        self.outcome.stats.leaves += 1;

        for op in 0..self.store.len() {
            let start = self.store.start_min(op);
            if self.store.fix(op, start).is_err() {
                self.outcome.stats.infeasible += 1;
                return Flow::Continue;
            }
        }
        let Ok(schedule) = extract(self.problem, &self.store) else {
            return Flow::Continue;
        };
        debug_assert!(schedule.verify(self.problem).is_empty());

        let makespan = schedule.makespan;
        if self.shared.offer(makespan) {
            self.outcome.stats.improvements += 1;
            debug!(event = "improvement", makespan, nodes = self.shared.nodes());
        }
        let local_best = self.outcome.best.as_ref().map_or(i64::MAX, |s| s.makespan);
        if makespan < local_best {
            self.outcome.best = Some(schedule);
        }

        if self.stop_after_first {
            self.shared.found.store(true, Ordering::Relaxed);
            return Flow::Stop;
        }
        Flow::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_a() -> JobShopProblem {
        JobShopProblem::new(vec![
            vec![(0, 3), (1, 2), (2, 2)],
            vec![(0, 2), (2, 1), (1, 4)],
            vec![(1, 4), (2, 3)],
        ])
        .unwrap()
    }

    fn search(problem: &JobShopProblem, incumbent: Option<i64>, budget: Budget) -> WorkerOutcome {
        let engine = ConstraintEngine::new(problem);
        let shared = SharedSearch::new(incumbent);
        BranchAndBound::new(problem, &engine, &shared, &budget, false)
            .unwrap()
            .run()
    }

    #[test]
    fn test_finds_optimum() {
        let p = scenario_a();
        let outcome = search(&p, None, Budget::unlimited());
        let best = outcome.best.unwrap();
        assert_eq!(best.makespan, 11);
        assert!(best.is_valid(&p));
        assert!(!outcome.exhausted);
        assert!(outcome.stats.leaves >= 1);
        assert!(outcome.stats.improvements >= 1);
    }

    #[test]
    fn test_optimal_incumbent_prunes_everything() {
        let p = scenario_a();
        let outcome = search(&p, Some(11), Budget::unlimited());
        assert!(outcome.best.is_none());
        assert_eq!(outcome.stats.improvements, 0);
        assert!(!outcome.exhausted);
    }

    #[test]
    fn test_node_limit_exhausts() {
        let p = scenario_a();
        let outcome = search(&p, None, Budget::unlimited().with_node_limit(1));
        assert!(outcome.exhausted);
        assert_eq!(outcome.stats.nodes, 1);
        assert!(outcome.best.is_none());
    }

    #[test]
    fn test_cancel_flag_exhausts() {
        let p = scenario_a();
        let flag = Arc::new(AtomicBool::new(true));
        let outcome = search(&p, None, Budget::unlimited().with_cancel(flag));
        assert!(outcome.exhausted);
    }

    #[test]
    fn test_stop_after_first() {
        let p = scenario_a();
        let engine = ConstraintEngine::new(&p);
        let shared = SharedSearch::new(None);
        let budget = Budget::unlimited();
        let outcome = BranchAndBound::new(&p, &engine, &shared, &budget, true)
            .unwrap()
            .run();
        assert_eq!(outcome.stats.leaves, 1);
        assert!(outcome.best.unwrap().is_valid(&p));
    }

    #[test]
    fn test_root_lower_bound() {
        let p = scenario_a();
        let engine = ConstraintEngine::new(&p);
        let shared = SharedSearch::new(None);
        let budget = Budget::unlimited();
        let bnb = BranchAndBound::new(&p, &engine, &shared, &budget, false).unwrap();
        // M1 load 10 with no head and min tail 0; J1 chain ends no earlier than 7.
        assert_eq!(bnb.lower_bound(), 10);
        assert_eq!(bnb.disjunction_count(), 7);
    }

    #[test]
    fn test_prefix_splits_search_space() {
        let p = scenario_a();
        let engine = ConstraintEngine::new(&p);
        let shared = SharedSearch::new(None);
        let budget = Budget::unlimited();
        let root = BranchAndBound::new(&p, &engine, &shared, &budget, false).unwrap();

        let mut best = i64::MAX;
        for prefix in [
            [DisjunctionState::ABeforeB],
            [DisjunctionState::BBeforeA],
        ] {
            let worker = root.clone().with_prefix(&prefix);
            assert_eq!(worker.disjunctions.decided_count(), 1);
            if let Some(s) = worker.run().best {
                best = best.min(s.makespan);
            }
        }
        assert_eq!(best, 11);
    }

    #[test]
    fn test_no_disjunctions_is_single_leaf() {
        let p = JobShopProblem::new(vec![vec![(0, 2), (1, 3)], vec![(2, 4)]]).unwrap();
        let outcome = search(&p, None, Budget::unlimited());
        assert_eq!(outcome.stats.nodes, 1);
        assert_eq!(outcome.stats.leaves, 1);
        assert_eq!(outcome.best.unwrap().makespan, 5);
    }

    #[test]
    fn test_budget_deadline() {
        let budget = Budget::unlimited().with_deadline(Instant::now());
        assert!(budget.is_exhausted(0));
        assert!(!Budget::unlimited().is_exhausted(u64::MAX));
    }

    #[test]
    fn test_stats_merge() {
        let mut a = SearchStats {
            nodes: 3,
            max_depth: 2,
            ..Default::default()
        };
        let b = SearchStats {
            nodes: 4,
            leaves: 1,
            max_depth: 5,
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.nodes, 7);
        assert_eq!(a.leaves, 1);
        assert_eq!(a.max_depth, 5);
    }
}
