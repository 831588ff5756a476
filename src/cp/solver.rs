//! Job-shop solver facade.
//!
//! Runs the full pipeline for one problem: optional dispatching warm start,
//! root propagation, branch-and-bound (one worker, or a rayon fan-out over
//! the first decisions with the `parallel` feature), and result assembly.
//!
//! # Status
//!
//! | Outcome | Status |
//! |---------|--------|
//! | Search finished | `Optimal` |
//! | Budget ran out / first-feasible mode, with a schedule | `Feasible` |
//! | Budget ran out, no schedule | `TimedOut` |
//! | Root propagation failed | `Infeasible` |
//!
//! A schedule whose makespan meets the root lower bound is reported
//! `Optimal` whatever stopped the search.

use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::config::{ConfigError, SolverConfig};
use super::propagation::ConstraintEngine;
use super::search::{Budget, BranchAndBound, SharedSearch, WorkerOutcome};
use crate::models::{JobShopProblem, Schedule};
use crate::scheduler::best_dispatch;

/// Final status of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolveStatus {
    /// Best possible makespan, proven.
    Optimal,
    /// Valid schedule, optimality not proven.
    Feasible,
    /// No schedule exists.
    Infeasible,
    /// Budget ran out before any schedule was found.
    TimedOut,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::TimedOut => "TIMED_OUT",
        };
        f.write_str(s)
    }
}

/// Search statistics of a solve.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveStats {
    /// Search nodes evaluated.
    pub nodes: u64,
    /// Complete schedules reached by the search.
    pub leaves: u64,
    /// Nodes pruned by a domain wipe-out.
    pub infeasible_nodes: u64,
    /// Nodes pruned by the lower bound.
    pub bounded_nodes: u64,
    /// Incumbent improvements found by the search.
    pub improvements: u64,
    /// Deepest decision level reached.
    pub max_depth: usize,
    /// Makespan lower bound at the root.
    pub root_lower_bound: i64,
    /// Makespan of the warm-start schedule, if one was used.
    pub warm_start_makespan: Option<i64>,
    /// Wall-clock time in milliseconds.
    pub wall_time_ms: u64,
    /// Whether the time limit, node limit, or cancel flag stopped the search.
    pub budget_exhausted: bool,
}

/// Outcome of a solve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveResult {
    /// How the solve ended.
    pub status: SolveStatus,
    /// Best verified schedule, absent for `Infeasible` and `TimedOut`.
    pub schedule: Option<Schedule>,
    /// Search statistics.
    pub stats: SolveStats,
}

impl SolveResult {
    /// Makespan of the returned schedule.
    pub fn makespan(&self) -> Option<i64> {
        self.schedule.as_ref().map(|s| s.makespan)
    }

    /// Whether optimality was proven.
    pub fn is_proven_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }
}

/// Exact job-shop solver (constraint propagation + branch-and-bound).
///
/// # Usage
///
/// ```
/// use u_jobshop::cp::{JobShopSolver, SolverConfig, SolveStatus};
/// use u_jobshop::models::JobShopProblem;
///
/// let problem = JobShopProblem::new(vec![vec![(0, 3)], vec![(0, 4)]]).unwrap();
/// let solver = JobShopSolver::new(SolverConfig::default().with_node_limit(10_000));
/// let result = solver.solve(&problem);
/// assert_eq!(result.status, SolveStatus::Optimal);
/// assert_eq!(result.makespan(), Some(7));
/// ```
#[derive(Debug, Clone, Default)]
pub struct JobShopSolver {
    config: SolverConfig,
}

impl JobShopSolver {
    /// Creates a solver with the given configuration.
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Creates a solver after validating the configuration.
    pub fn with_config(config: SolverConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solves a problem within the configured budget.
    pub fn solve(&self, problem: &JobShopProblem) -> SolveResult {
        self.solve_with_cancel(problem, None)
    }

    /// Solves with an optional cancellation token.
    ///
    /// If `cancel` is `Some` and the flag is set to `true`, the search stops
    /// at the next node and returns the best schedule found so far.
    pub fn solve_with_cancel(
        &self,
        problem: &JobShopProblem,
        cancel: Option<Arc<AtomicBool>>,
    ) -> SolveResult {
        let started = Instant::now();
        info!(
            event = "solve_start",
            jobs = problem.num_jobs(),
            machines = problem.num_machines(),
            operations = problem.num_operations()
        );

        let budget = self.budget(started, cancel);
        let warm = self.warm_start(problem);
        let mut stats = SolveStats {
            warm_start_makespan: warm.as_ref().map(|s| s.makespan),
            ..Default::default()
        };

        let engine = ConstraintEngine::new(problem);
        let shared = SharedSearch::new(stats.warm_start_makespan);
        let root = match BranchAndBound::new(
            problem,
            &engine,
            &shared,
            &budget,
            self.config.stop_after_first,
        ) {
            Ok(root) => root,
            Err(err) => {
                debug!(event = "root_infeasible", operation = err.operation);
                return self.finish(SolveStatus::Infeasible, None, stats, started);
            }
        };
        stats.root_lower_bound = root.lower_bound();

        let outcome = self.run(root);
        stats.nodes = outcome.stats.nodes;
        stats.leaves = outcome.stats.leaves;
        stats.infeasible_nodes = outcome.stats.infeasible;
        stats.bounded_nodes = outcome.stats.bounded_out;
        stats.improvements = outcome.stats.improvements;
        stats.max_depth = outcome.stats.max_depth;
        stats.budget_exhausted = outcome.exhausted;
        if outcome.exhausted {
            debug!(event = "budget_exhausted", nodes = outcome.stats.nodes);
        }

        // The search only reports schedules strictly better than the warm start.
        let schedule = outcome.best.or(warm);
        let status = match &schedule {
            None if outcome.exhausted => SolveStatus::TimedOut,
            None => SolveStatus::Infeasible,
            Some(s) if s.makespan <= stats.root_lower_bound => SolveStatus::Optimal,
            Some(_) if outcome.exhausted || self.config.stop_after_first => SolveStatus::Feasible,
            Some(_) => SolveStatus::Optimal,
        };
        self.finish(status, schedule, stats, started)
    }

    fn budget(&self, started: Instant, cancel: Option<Arc<AtomicBool>>) -> Budget {
        let mut budget = Budget::unlimited();
        if let Some(limit) = self.config.time_limit() {
            budget = budget.with_deadline(started + limit);
        }
        if let Some(nodes) = self.config.node_limit {
            budget = budget.with_node_limit(nodes);
        }
        if let Some(flag) = cancel {
            budget = budget.with_cancel(flag);
        }
        budget
    }

    fn warm_start(&self, problem: &JobShopProblem) -> Option<Schedule> {
        if !self.config.warm_start || self.config.stop_after_first {
            return None;
        }
        let (rule, schedule) = best_dispatch(problem);
        if !schedule.is_valid(problem) {
            return None;
        }
        debug!(event = "warm_start", rule = rule.name(), makespan = schedule.makespan);
        Some(schedule)
    }

    fn run(&self, root: BranchAndBound<'_>) -> WorkerOutcome {
        #[cfg(feature = "parallel")]
        {
            if self.config.num_workers > 1 {
                return self.run_parallel(root);
            }
        }
        #[cfg(not(feature = "parallel"))]
        {
            if self.config.num_workers > 1 {
                debug!(
                    event = "sequential_fallback",
                    num_workers = self.config.num_workers,
                    "built without the `parallel` feature"
                );
            }
        }
        root.run()
    }

    /// Splits the tree at its first decisions and solves the subtrees on a
    /// dedicated rayon pool.
    #[cfg(feature = "parallel")]
    fn run_parallel(&self, root: BranchAndBound<'_>) -> WorkerOutcome {
        use rayon::prelude::*;

        use super::disjunction::DisjunctionState;

        let workers = self.config.num_workers;
        let depth = prefix_depth(workers, root.disjunction_count());
        if depth == 0 {
            return root.run();
        }
        let pool = match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => pool,
            Err(err) => {
                debug!(event = "sequential_fallback", error = %err);
                return root.run();
            }
        };

        let prefixes: Vec<Vec<DisjunctionState>> = (0..1usize << depth)
            .map(|mask| {
                (0..depth)
                    .map(|bit| {
                        if (mask >> (depth - 1 - bit)) & 1 == 0 {
                            DisjunctionState::ABeforeB
                        } else {
                            DisjunctionState::BBeforeA
                        }
                    })
                    .collect()
            })
            .collect();
        debug!(event = "parallel_split", workers, subtrees = prefixes.len());

        let outcomes: Vec<WorkerOutcome> = pool.install(|| {
            prefixes
                .par_iter()
                .map(|prefix| root.clone().with_prefix(prefix).run())
                .collect()
        });
        merge_outcomes(outcomes)
    }

    fn finish(
        &self,
        status: SolveStatus,
        schedule: Option<Schedule>,
        mut stats: SolveStats,
        started: Instant,
    ) -> SolveResult {
        stats.wall_time_ms = started.elapsed().as_millis() as u64;
        info!(
            event = "solve_end",
            status = %status,
            makespan = schedule.as_ref().map(|s| s.makespan),
            nodes = stats.nodes,
            wall_time_ms = stats.wall_time_ms
        );
        SolveResult {
            status,
            schedule,
            stats,
        }
    }
}

/// Number of leading decisions to expand: `ceil(log2(4 * workers))`, at most
/// the number of decisions.
#[cfg_attr(not(feature = "parallel"), allow(dead_code))]
fn prefix_depth(workers: usize, disjunctions: usize) -> usize {
    let target = workers.saturating_mul(4).max(1);
    (target.next_power_of_two().trailing_zeros() as usize).min(disjunctions)
}

/// Combines subtree outcomes in subtree order: lowest makespan wins, ties go
/// to the lower subtree index.
#[cfg_attr(not(feature = "parallel"), allow(dead_code))]
fn merge_outcomes(outcomes: Vec<WorkerOutcome>) -> WorkerOutcome {
    let mut merged = WorkerOutcome::default();
    for outcome in outcomes {
        merged.stats.merge(&outcome.stats);
        merged.exhausted |= outcome.exhausted;
        if let Some(schedule) = outcome.best {
            let current = merged.best.as_ref().map_or(i64::MAX, |s| s.makespan);
            if schedule.makespan < current {
                merged.best = Some(schedule);
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::InstanceGenerator;
    use crate::validation::MAX_HORIZON;
    use proptest::prelude::*;

    fn scenario_a() -> JobShopProblem {
        JobShopProblem::new(vec![
            vec![(0, 3), (1, 2), (2, 2)],
            vec![(0, 2), (2, 1), (1, 4)],
            vec![(1, 4), (2, 3)],
        ])
        .unwrap()
    }

    /// Recomputes the makespan from scratch.
    fn recomputed_makespan(s: &Schedule) -> i64 {
        s.records().map(|r| r.start + r.duration).max().unwrap_or(0)
    }

    #[test]
    fn test_scenario_a_optimal() {
        let p = scenario_a();
        let result = JobShopSolver::default().solve(&p);
        assert_eq!(result.status, SolveStatus::Optimal);
        assert_eq!(result.makespan(), Some(11));
        let s = result.schedule.unwrap();
        assert!(s.is_valid(&p));
        assert_eq!(recomputed_makespan(&s), 11);
        assert_eq!(result.stats.root_lower_bound, 10);
        assert!(!result.stats.budget_exhausted);
    }

    #[test]
    fn test_scenario_a_without_warm_start() {
        let p = scenario_a();
        let solver = JobShopSolver::new(SolverConfig::default().with_warm_start(false));
        let result = solver.solve(&p);
        assert_eq!(result.status, SolveStatus::Optimal);
        assert_eq!(result.makespan(), Some(11));
        assert_eq!(result.stats.warm_start_makespan, None);
        assert!(result.stats.improvements >= 1);
    }

    #[test]
    fn test_scenario_b_single_operation() {
        let p = JobShopProblem::new(vec![vec![(0, 5)]]).unwrap();
        let result = JobShopSolver::default().solve(&p);
        assert_eq!(result.status, SolveStatus::Optimal);
        assert_eq!(result.makespan(), Some(5));
    }

    #[test]
    fn test_scenario_c_shared_machine() {
        let p = JobShopProblem::new(vec![vec![(0, 3)], vec![(0, 4)]]).unwrap();
        let result = JobShopSolver::default().solve(&p);
        assert_eq!(result.status, SolveStatus::Optimal);
        assert_eq!(result.makespan(), Some(7));
        let seq = result.schedule.unwrap();
        let m0 = seq.machine_sequence(0);
        assert_eq!(m0.len(), 2);
        assert!(m0[0].end <= m0[1].start);
    }

    #[test]
    fn test_scenario_d_machine_inference() {
        let p = JobShopProblem::new(vec![vec![(3, 2)], vec![(1, 1), (3, 1)]]).unwrap();
        assert_eq!(p.num_machines(), 4);
        let result = JobShopSolver::default().solve(&p);
        assert_eq!(result.status, SolveStatus::Optimal);
        let s = result.schedule.unwrap();
        assert_eq!(s.machines.len(), 4);
        assert!(s.machine_sequence(0).is_empty());
        assert_eq!(s.makespan, 3);
    }

    #[test]
    fn test_deep_first_feasible_search() {
        // 40 jobs x 10 machines: thousands of decisions along one descent.
        let p = InstanceGenerator::new(40, 10).with_seed(1).generate().unwrap();
        let config = SolverConfig::default()
            .with_stop_after_first(true)
            .with_time_limit_ms(20_000);
        let result = JobShopSolver::new(config).solve(&p);
        match result.status {
            SolveStatus::Feasible | SolveStatus::Optimal => {
                let s = result.schedule.unwrap();
                assert!(s.is_valid(&p));
                assert!(result.stats.max_depth > 1000);
            }
            SolveStatus::TimedOut => assert!(result.stats.budget_exhausted),
            SolveStatus::Infeasible => panic!("generated instance reported infeasible"),
        }
    }

    #[test]
    fn test_large_durations_near_limit() {
        let p = JobShopProblem::new(vec![vec![(0, MAX_HORIZON - 1)], vec![(1, 1)]]).unwrap();
        let result = JobShopSolver::default().solve(&p);
        assert_eq!(result.status, SolveStatus::Optimal);
        assert_eq!(result.makespan(), Some(MAX_HORIZON - 1));
    }

    #[test]
    fn test_empty_problem() {
        let p = JobShopProblem::new(vec![]).unwrap();
        let result = JobShopSolver::default().solve(&p);
        assert_eq!(result.status, SolveStatus::Optimal);
        assert_eq!(result.makespan(), Some(0));
    }

    #[test]
    fn test_idempotent() {
        let p = scenario_a();
        let solver = JobShopSolver::default();
        let first = solver.solve(&p);
        let second = solver.solve(&p);
        assert_eq!(first.status, second.status);
        assert_eq!(first.schedule, second.schedule);
    }

    #[test]
    fn test_monotone_in_durations() {
        let longer = JobShopProblem::new(vec![
            vec![(0, 3), (1, 5), (2, 2)],
            vec![(0, 2), (2, 1), (1, 4)],
            vec![(1, 4), (2, 3)],
        ])
        .unwrap();
        let result = JobShopSolver::default().solve(&longer);
        assert_eq!(result.status, SolveStatus::Optimal);
        assert!(result.makespan().unwrap() >= 11);
    }

    #[test]
    fn test_stop_after_first() {
        let p = scenario_a();
        let solver = JobShopSolver::new(SolverConfig::default().with_stop_after_first(true));
        let result = solver.solve(&p);
        assert_eq!(result.status, SolveStatus::Feasible);
        assert_eq!(result.stats.leaves, 1);
        assert_eq!(result.stats.warm_start_makespan, None);
        assert!(result.schedule.unwrap().is_valid(&p));
    }

    #[test]
    fn test_node_limit_without_schedule_times_out() {
        let p = scenario_a();
        let config = SolverConfig::default()
            .with_warm_start(false)
            .with_node_limit(1);
        let result = JobShopSolver::new(config).solve(&p);
        assert_eq!(result.status, SolveStatus::TimedOut);
        assert!(result.schedule.is_none());
        assert!(result.stats.budget_exhausted);
    }

    #[test]
    fn test_node_limit_keeps_warm_start() {
        let p = scenario_a();
        let result = JobShopSolver::new(SolverConfig::default().with_node_limit(1)).solve(&p);
        assert_eq!(result.status, SolveStatus::Feasible);
        assert!(result.stats.budget_exhausted);
        let s = result.schedule.unwrap();
        assert!(s.is_valid(&p));
        assert_eq!(Some(s.makespan), result.stats.warm_start_makespan);
    }

    #[test]
    fn test_cancelled_before_start() {
        let p = scenario_a();
        let flag = Arc::new(AtomicBool::new(true));
        let solver = JobShopSolver::new(SolverConfig::default().with_warm_start(false));
        let result = solver.solve_with_cancel(&p, Some(flag));
        assert_eq!(result.status, SolveStatus::TimedOut);
    }

    #[test]
    fn test_with_config_validates() {
        assert!(JobShopSolver::with_config(SolverConfig::default().with_num_workers(0)).is_err());
        let solver = JobShopSolver::with_config(SolverConfig::default().with_num_workers(2)).unwrap();
        assert_eq!(solver.config().num_workers, 2);
    }

    #[test]
    fn test_multiple_workers() {
        let p = scenario_a();
        let solver = JobShopSolver::new(SolverConfig::default().with_num_workers(4));
        let result = solver.solve(&p);
        assert_eq!(result.status, SolveStatus::Optimal);
        assert_eq!(result.makespan(), Some(11));
        assert!(result.schedule.unwrap().is_valid(&p));
    }

    #[test]
    fn test_prefix_depth() {
        assert_eq!(prefix_depth(1, 10), 2);
        assert_eq!(prefix_depth(2, 10), 3);
        assert_eq!(prefix_depth(3, 10), 4);
        assert_eq!(prefix_depth(8, 3), 3);
        assert_eq!(prefix_depth(4, 0), 0);
    }

    #[test]
    fn test_merge_outcomes_prefers_lower_index_on_tie() {
        let p = JobShopProblem::new(vec![vec![(0, 2)], vec![(1, 1)]]).unwrap();
        let early = Schedule::from_starts(&p, &[0, 0]);
        let late = Schedule::from_starts(&p, &[0, 1]);
        let worse = Schedule::from_starts(&p, &[1, 0]);
        assert_eq!(early.makespan, late.makespan);
        assert_ne!(early, late);
        let outcomes = vec![
            WorkerOutcome {
                best: Some(worse),
                ..Default::default()
            },
            WorkerOutcome {
                best: Some(early.clone()),
                exhausted: true,
                ..Default::default()
            },
            WorkerOutcome {
                best: Some(late),
                ..Default::default()
            },
        ];
        let merged = merge_outcomes(outcomes);
        assert_eq!(merged.best, Some(early));
        assert!(merged.exhausted);
    }

    #[test]
    fn test_result_serializes() {
        let p = JobShopProblem::new(vec![vec![(0, 2)]]).unwrap();
        let result = JobShopSolver::default().solve(&p);
        let json = serde_json::to_string(&result).unwrap();
        let back: SolveResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
        assert_eq!(SolveStatus::TimedOut.to_string(), "TIMED_OUT");
    }

    fn small_instance() -> impl Strategy<Value = Vec<Vec<(i64, i64)>>> {
        prop::collection::vec(prop::collection::vec((0i64..3, 1i64..6), 1..4), 1..4)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn test_solution_properties(jobs in small_instance()) {
            let p = JobShopProblem::new(jobs).unwrap();
            let result = JobShopSolver::default().solve(&p);
            prop_assert_eq!(result.status, SolveStatus::Optimal);
            let s = result.schedule.clone().unwrap();

            // job precedence and machine exclusivity
            prop_assert!(s.is_valid(&p), "{:?}", s.verify(&p));
            prop_assert_eq!(s.operation_count(), p.num_operations());
            prop_assert_eq!(recomputed_makespan(&s), s.makespan);
            prop_assert!(s.makespan >= p.trivial_lower_bound());
            prop_assert!(s.makespan <= best_dispatch(&p).1.makespan);

            let again = JobShopSolver::default().solve(&p);
            prop_assert_eq!(again.makespan(), result.makespan());

            let cold = JobShopSolver::new(SolverConfig::default().with_warm_start(false)).solve(&p);
            prop_assert_eq!(cold.makespan(), result.makespan());
        }

        #[test]
        fn test_makespan_monotone(jobs in small_instance(), job in 0usize..3, extra in 1i64..4) {
            let mut longer = jobs.clone();
            let j = job % longer.len();
            longer[j][0].1 += extra;

            let base = JobShopSolver::default().solve(&JobShopProblem::new(jobs).unwrap());
            let grown = JobShopSolver::default().solve(&JobShopProblem::new(longer).unwrap());
            prop_assert!(grown.makespan().unwrap() >= base.makespan().unwrap());
        }
    }
}
