//! Job-shop scheduling with constraint propagation and branch-and-bound.
//!
//! Given jobs (ordered operations, each bound to one machine for a fixed
//! duration), finds start times that respect job order, never double-book
//! a machine, and minimize the makespan.
//!
//! # Modules
//!
//! - **`models`**: Problem and solution types: `JobShopProblem`, `Job`,
//!   `Operation`, `Machine`, `Schedule`
//! - **`validation`**: Input integrity checks (empty jobs, durations, machine ids)
//! - **`cp`**: Time-domain variables, precedence propagation, disjunctive
//!   branch-and-bound, solution extraction, solver facade
//! - **`scheduler`**: Dispatching heuristics (warm start) and schedule KPIs
//! - **`generator`**: Seeded random instances
//!
//! # Example
//!
//! ```
//! use u_jobshop::cp::{JobShopSolver, SolveStatus};
//! use u_jobshop::models::JobShopProblem;
//!
//! let problem = JobShopProblem::new(vec![
//!     vec![(0, 3), (1, 2), (2, 2)],
//!     vec![(0, 2), (2, 1), (1, 4)],
//!     vec![(1, 4), (2, 3)],
//! ])
//! .unwrap();
//!
//! let result = JobShopSolver::default().solve(&problem);
//! assert_eq!(result.status, SolveStatus::Optimal);
//! assert_eq!(result.makespan(), Some(11));
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Baptiste et al. (2001), "Constraint-Based Scheduling"
//! - Brucker, Jurisch & Sievers (1994), "A branch and bound algorithm for
//!   the job-shop scheduling problem"

pub mod cp;
pub mod error;
pub mod generator;
pub mod models;
pub mod scheduler;
pub mod validation;

pub use error::ProblemError;
