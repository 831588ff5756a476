//! Priority-rule dispatching (Giffler-Thompson active schedules).
//!
//! # Algorithm
//!
//! 1. Among the next unscheduled operation of every job, find the one with
//!    the earliest completion time `c*`; let `m*` be its machine.
//! 2. The conflict set is every such operation on `m*` that can start
//!    before `c*`.
//! 3. Pick from the conflict set by the dispatching rule (ties: job index),
//!    start it as early as possible, and repeat.
//!
//! Every schedule produced this way is active and feasible. It is not
//! optimal in general, but gives the branch-and-bound a tight incumbent.
//!
//! # Complexity
//! O(o * j) where o = operations, j = jobs.
//!
//! # References
//! - Giffler & Thompson (1960), "Algorithms for Solving Production-Scheduling Problems"
//! - Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

use serde::{Deserialize, Serialize};

use crate::models::{JobShopProblem, Schedule};

/// Priority rule for choosing among conflicting operations.
///
/// # Score Convention
/// Lower scores win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DispatchRule {
    /// Shortest Processing Time of the candidate operation.
    Spt,
    /// Longest Processing Time of the candidate operation.
    Lpt,
    /// Most Work Remaining in the candidate's job.
    Mwkr,
    /// Least Work Remaining in the candidate's job.
    Lwkr,
    /// Earliest possible start (first come, first served).
    Fifo,
}

impl DispatchRule {
    /// Every built-in rule, in evaluation order.
    pub const ALL: [DispatchRule; 5] = [
        DispatchRule::Spt,
        DispatchRule::Lpt,
        DispatchRule::Mwkr,
        DispatchRule::Lwkr,
        DispatchRule::Fifo,
    ];

    /// Short rule name.
    pub fn name(&self) -> &'static str {
        match self {
            DispatchRule::Spt => "SPT",
            DispatchRule::Lpt => "LPT",
            DispatchRule::Mwkr => "MWKR",
            DispatchRule::Lwkr => "LWKR",
            DispatchRule::Fifo => "FIFO",
        }
    }

    /// Human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            DispatchRule::Spt => "Shortest Processing Time",
            DispatchRule::Lpt => "Longest Processing Time",
            DispatchRule::Mwkr => "Most Work Remaining",
            DispatchRule::Lwkr => "Least Work Remaining",
            DispatchRule::Fifo => "First In, First Out",
        }
    }

    fn score(&self, duration: i64, remaining: i64, earliest_start: i64) -> i64 {
        match self {
            DispatchRule::Spt => duration,
            DispatchRule::Lpt => -duration,
            DispatchRule::Mwkr => -remaining,
            DispatchRule::Lwkr => remaining,
            DispatchRule::Fifo => earliest_start,
        }
    }
}

/// Builds an active schedule with one dispatching rule.
pub fn dispatch(problem: &JobShopProblem, rule: DispatchRule) -> Schedule {
    let jobs = problem.jobs();
    let mut next = vec![0usize; jobs.len()];
    let mut job_ready = vec![0i64; jobs.len()];
    let mut machine_ready = vec![0i64; problem.num_machines()];
    let mut remaining: Vec<i64> = (0..jobs.len()).map(|j| problem.job_length(j)).collect();
    let mut starts = vec![0i64; problem.num_operations()];

    loop {
        // Earliest completion among schedulable operations.
        let mut pivot: Option<(i64, usize)> = None;
        for (j, job) in jobs.iter().enumerate() {
            let Some(&op) = job.operations.get(next[j]) else {
                continue;
            };
            let operation = problem.operation(op);
            let est = job_ready[j].max(machine_ready[operation.machine]);
            let ect = est + operation.duration;
            if pivot.is_none_or(|(best, _)| ect < best) {
                pivot = Some((ect, operation.machine));
            }
        }
        let Some((completion, machine)) = pivot else {
            break;
        };

        let mut chosen: Option<(i64, usize, i64)> = None;
        for (j, job) in jobs.iter().enumerate() {
            let Some(&op) = job.operations.get(next[j]) else {
                continue;
            };
            let operation = problem.operation(op);
            if operation.machine != machine {
                continue;
            }
            let est = job_ready[j].max(machine_ready[machine]);
            if est >= completion {
                continue;
            }
            let score = rule.score(operation.duration, remaining[j], est);
            if chosen.is_none_or(|(best, _, _)| score < best) {
                chosen = Some((score, j, est));
            }
        }
        let Some((_, j, start)) = chosen else {
            break;
        };

        let op = jobs[j].operations[next[j]];
        let end = start + problem.duration(op);
        starts[op] = start;
        job_ready[j] = end;
        machine_ready[machine] = end;
        remaining[j] -= problem.duration(op);
        next[j] += 1;
    }

    Schedule::from_starts(problem, &starts)
}

/// Runs every rule and keeps the schedule with the smallest makespan.
///
/// Ties go to the rule listed first in [`DispatchRule::ALL`].
pub fn best_dispatch(problem: &JobShopProblem) -> (DispatchRule, Schedule) {
    let mut best = (DispatchRule::ALL[0], dispatch(problem, DispatchRule::ALL[0]));
    for &rule in &DispatchRule::ALL[1..] {
        let schedule = dispatch(problem, rule);
        if schedule.makespan < best.1.makespan {
            best = (rule, schedule);
        }
    }
    best
}
