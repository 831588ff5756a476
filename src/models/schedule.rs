//! Schedule (solution) model.
//!
//! A schedule fixes a start time for every operation. Records are grouped
//! per machine and ordered by start time. A schedule can re-check itself
//! against its problem and report violations.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3

use serde::{Deserialize, Serialize};

use super::{JobShopProblem, OperationId};

/// A complete schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Per-machine records, each list sorted by start time.
    pub machines: Vec<Vec<ScheduledOperation>>,
    /// Latest job completion time.
    pub makespan: i64,
}

/// One operation placed in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledOperation {
    /// Operation arena id.
    pub operation_id: OperationId,
    /// Owning job.
    pub job: usize,
    /// Position within the job.
    pub operation_index: usize,
    /// Machine used.
    pub machine: usize,
    /// Start time.
    pub start: i64,
    /// End time (`start + duration`).
    pub end: i64,
    /// Processing time.
    pub duration: i64,
}

/// A constraint violation found by [`Schedule::verify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Human-readable description.
    pub message: String,
}

/// Classification of schedule violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// An operation starts before its job predecessor ends.
    PrecedenceViolation,
    /// Two operations overlap on one machine.
    MachineOverlap,
    /// Record disagrees with the problem (duration, machine, or missing).
    RecordMismatch,
    /// Reported makespan differs from the recomputed one.
    MakespanMismatch,
}

impl Violation {
    fn new(violation_type: ViolationType, message: impl Into<String>) -> Self {
        Self {
            violation_type,
            message: message.into(),
        }
    }
}

impl Schedule {
    /// Builds a schedule from one start time per operation id.
    ///
    /// # Panics
    /// If `starts.len()` differs from the problem's operation count.
    pub fn from_starts(problem: &JobShopProblem, starts: &[i64]) -> Self {
        assert_eq!(starts.len(), problem.num_operations());

        let mut machines: Vec<Vec<ScheduledOperation>> = vec![Vec::new(); problem.num_machines()];
        for op in problem.operations() {
            let start = starts[op.id];
            machines[op.machine].push(ScheduledOperation {
                operation_id: op.id,
                job: op.job,
                operation_index: op.position,
                machine: op.machine,
                start,
                end: start + op.duration,
                duration: op.duration,
            });
        }
        for list in &mut machines {
            list.sort_by_key(|r| (r.start, r.job, r.operation_index));
        }

        let makespan = problem
            .jobs()
            .iter()
            .filter_map(|job| job.last())
            .map(|op| starts[op] + problem.duration(op))
            .max()
            .unwrap_or(0);

        Self { machines, makespan }
    }

    /// Records on one machine, ordered by start time.
    pub fn machine_sequence(&self, machine: usize) -> &[ScheduledOperation] {
        self.machines.get(machine).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All records, machine by machine.
    pub fn records(&self) -> impl Iterator<Item = &ScheduledOperation> {
        self.machines.iter().flatten()
    }

    /// Records of one job, ordered by position.
    pub fn job_operations(&self, job: usize) -> Vec<&ScheduledOperation> {
        let mut ops: Vec<_> = self.records().filter(|r| r.job == job).collect();
        ops.sort_by_key(|r| r.operation_index);
        ops
    }

    /// Completion time of a job (end of its last operation).
    pub fn job_completion(&self, job: usize) -> Option<i64> {
        self.job_operations(job).last().map(|r| r.end)
    }

    /// Record for an operation id.
    pub fn record(&self, operation_id: OperationId) -> Option<&ScheduledOperation> {
        self.records().find(|r| r.operation_id == operation_id)
    }

    /// Start time per operation id. `None` if some operation is missing.
    pub fn starts(&self, num_operations: usize) -> Option<Vec<i64>> {
        let mut starts = vec![None; num_operations];
        for r in self.records() {
            *starts.get_mut(r.operation_id)? = Some(r.start);
        }
        starts.into_iter().collect()
    }

    /// Number of scheduled operations.
    pub fn operation_count(&self) -> usize {
        self.machines.iter().map(Vec::len).sum()
    }

    /// Re-checks the schedule against its problem.
    ///
    /// Verifies that every operation is present with the right machine and
    /// duration, job order holds, no two operations overlap on a machine,
    /// and the makespan equals the max job completion.
    pub fn verify(&self, problem: &JobShopProblem) -> Vec<Violation> {
        let mut violations = Vec::new();

        let mut found: Vec<Option<&ScheduledOperation>> = vec![None; problem.num_operations()];
        for r in self.records() {
            match found.get_mut(r.operation_id) {
                Some(slot) if slot.is_none() => *slot = Some(r),
                Some(_) => violations.push(Violation::new(
                    ViolationType::RecordMismatch,
                    format!("Operation {} scheduled twice", r.operation_id),
                )),
                None => violations.push(Violation::new(
                    ViolationType::RecordMismatch,
                    format!("Unknown operation {}", r.operation_id),
                )),
            }
        }

        for op in problem.operations() {
            match found[op.id] {
                None => violations.push(Violation::new(
                    ViolationType::RecordMismatch,
                    format!("Job {} operation {} is not scheduled", op.job, op.position),
                )),
                Some(r) => {
                    if r.machine != op.machine
                        || r.duration != op.duration
                        || r.end - r.start != op.duration
                        || r.start < 0
                    {
                        violations.push(Violation::new(
                            ViolationType::RecordMismatch,
                            format!(
                                "Job {} operation {} recorded as M{} [{}, {})",
                                op.job, op.position, r.machine, r.start, r.end
                            ),
                        ));
                    }
                }
            }
        }

        for job in problem.jobs() {
            for (prev, next) in job.chain() {
                if let (Some(a), Some(b)) = (found[prev], found[next]) {
                    if a.end > b.start {
                        violations.push(Violation::new(
                            ViolationType::PrecedenceViolation,
                            format!(
                                "Job {} operation {} starts at {} before operation {} ends at {}",
                                job.id, b.operation_index, b.start, a.operation_index, a.end
                            ),
                        ));
                    }
                }
            }
        }

        for (machine, list) in self.machines.iter().enumerate() {
            for (i, a) in list.iter().enumerate() {
                for b in &list[i + 1..] {
                    if a.start < b.end && b.start < a.end {
                        violations.push(Violation::new(
                            ViolationType::MachineOverlap,
                            format!(
                                "M{machine}: job {} op {} [{}, {}) overlaps job {} op {} [{}, {})",
                                a.job, a.operation_index, a.start, a.end,
                                b.job, b.operation_index, b.start, b.end,
                            ),
                        ));
                    }
                }
            }
        }

        let recomputed = problem
            .jobs()
            .iter()
            .filter_map(|job| job.last())
            .filter_map(|op| found[op].map(|r| r.end))
            .max()
            .unwrap_or(0);
        if recomputed != self.makespan {
            violations.push(Violation::new(
                ViolationType::MakespanMismatch,
                format!("Reported makespan {} but jobs complete at {}", self.makespan, recomputed),
            ));
        }

        violations
    }

    /// Whether [`verify`](Self::verify) finds nothing.
    pub fn is_valid(&self, problem: &JobShopProblem) -> bool {
        self.verify(problem).is_empty()
    }
}
