//! Job-shop problem model.
//!
//! Built once from raw job lists and never mutated. Operations live in a
//! flat arena indexed by [`OperationId`]; jobs and machines hold id lists
//! into that arena.
//!
//! # Input Format
//!
//! Each job is a list of `(machine_id, duration)` pairs in execution order.
//! The number of machines is inferred as `1 + max machine_id`.

use serde::{Deserialize, Serialize};

use super::{Job, Machine, Operation, OperationId};
use crate::error::ProblemError;
use crate::validation::validate_jobs;

/// Serializable input form of a problem.
///
/// ```
/// use u_jobshop::models::{JobShopProblem, ProblemData};
///
/// let data = ProblemData::new(vec![vec![(0, 3), (1, 2)], vec![(1, 4)]]);
/// let problem = JobShopProblem::try_from(data).unwrap();
/// assert_eq!(problem.num_machines(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProblemData {
    /// Jobs as `(machine_id, duration)` lists.
    pub jobs: Vec<Vec<(i64, i64)>>,
}

impl ProblemData {
    /// Wraps raw job lists.
    pub fn new(jobs: Vec<Vec<(i64, i64)>>) -> Self {
        Self { jobs }
    }
}

/// An immutable job-shop problem instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProblemData", into = "ProblemData")]
pub struct JobShopProblem {
    operations: Vec<Operation>,
    jobs: Vec<Job>,
    machines: Vec<Machine>,
    /// Work remaining in the job after each operation.
    tails: Vec<i64>,
    horizon: i64,
}

impl JobShopProblem {
    /// Builds a problem from `(machine_id, duration)` job lists.
    ///
    /// # Errors
    /// `ProblemError::InvalidProblem` if any job is empty, any duration is
    /// non-positive, any machine id is negative or at least
    /// [`MAX_MACHINES`](crate::validation::MAX_MACHINES), or the total
    /// duration exceeds [`MAX_HORIZON`](crate::validation::MAX_HORIZON).
    pub fn new(jobs: Vec<Vec<(i64, i64)>>) -> Result<Self, ProblemError> {
        validate_jobs(&jobs).map_err(ProblemError::InvalidProblem)?;

        let num_machines = jobs
            .iter()
            .flatten()
            .map(|&(machine, _)| machine as usize + 1)
            .max()
            .unwrap_or(0);

        let mut operations = Vec::new();
        let mut job_list = Vec::with_capacity(jobs.len());
        let mut machines: Vec<Machine> = (0..num_machines).map(Machine::new).collect();

        for (job_id, specs) in jobs.iter().enumerate() {
            let mut job = Job::new(job_id);
            for (position, &(machine, duration)) in specs.iter().enumerate() {
                let id = operations.len();
                let machine = machine as usize;
                operations.push(Operation::new(id, job_id, position, machine, duration));
                machines[machine].operations.push(id);
                job = job.with_operation(id);
            }
            job_list.push(job);
        }

        let mut tails = vec![0; operations.len()];
        for job in &job_list {
            let mut remaining = 0;
            for &op in job.operations.iter().rev() {
                tails[op] = remaining;
                remaining += operations[op].duration;
            }
        }

        let horizon = operations.iter().map(|op| op.duration).sum();

        Ok(Self {
            operations,
            jobs: job_list,
            machines,
            tails,
            horizon,
        })
    }

    /// Number of jobs.
    pub fn num_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Number of machines (`1 + max machine id`).
    pub fn num_machines(&self) -> usize {
        self.machines.len()
    }

    /// Number of operations across all jobs.
    pub fn num_operations(&self) -> usize {
        self.operations.len()
    }

    /// Sum of all durations. A safe upper bound on any optimal makespan.
    pub fn horizon(&self) -> i64 {
        self.horizon
    }

    /// All operations, indexed by id.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Operation by id.
    ///
    /// # Panics
    /// If `id` is out of range.
    pub fn operation(&self, id: OperationId) -> &Operation {
        &self.operations[id]
    }

    /// All jobs.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Job by index.
    pub fn job(&self, job: usize) -> Option<&Job> {
        self.jobs.get(job)
    }

    /// All machines.
    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    /// Machine by index.
    pub fn machine(&self, machine: usize) -> Option<&Machine> {
        self.machines.get(machine)
    }

    /// Duration of an operation.
    #[inline]
    pub fn duration(&self, id: OperationId) -> i64 {
        self.operations[id].duration
    }

    /// Processing still required by the job after `id` completes.
    #[inline]
    pub fn tail(&self, id: OperationId) -> i64 {
        self.tails[id]
    }

    /// Total processing time required on a machine.
    pub fn machine_load(&self, machine: usize) -> i64 {
        self.machines
            .get(machine)
            .map(|m| m.operations.iter().map(|&op| self.duration(op)).sum())
            .unwrap_or(0)
    }

    /// Total processing time of a job.
    pub fn job_length(&self, job: usize) -> i64 {
        self.jobs
            .get(job)
            .map(|j| j.operations.iter().map(|&op| self.duration(op)).sum())
            .unwrap_or(0)
    }

    /// Trivial makespan lower bound: the longest job or the busiest machine.
    pub fn trivial_lower_bound(&self) -> i64 {
        let jobs = (0..self.num_jobs()).map(|j| self.job_length(j)).max();
        let machines = (0..self.num_machines()).map(|m| self.machine_load(m)).max();
        jobs.into_iter().chain(machines).max().unwrap_or(0)
    }

    /// Raw `(machine_id, duration)` job lists.
    pub fn to_data(&self) -> ProblemData {
        let jobs = self
            .jobs
            .iter()
            .map(|job| {
                job.operations
                    .iter()
                    .map(|&op| {
                        let op = &self.operations[op];
                        (op.machine as i64, op.duration)
                    })
                    .collect()
            })
            .collect();
        ProblemData { jobs }
    }
}

impl TryFrom<ProblemData> for JobShopProblem {
    type Error = ProblemError;

    fn try_from(data: ProblemData) -> Result<Self, Self::Error> {
        Self::new(data.jobs)
    }
}

impl From<JobShopProblem> for ProblemData {
    fn from(problem: JobShopProblem) -> Self {
        problem.to_data()
    }
}
