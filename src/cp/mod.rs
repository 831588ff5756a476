//! Constraint-propagation formulation and exact search.
//!
//! Each operation carries a time domain (`start`/`end` bounds). Job order is
//! a fixed set of precedence arcs; machine exclusivity is a set of
//! either-order decisions resolved by branch-and-bound. Propagation tightens
//! the domains to a fixed point at every node.
//!
//! # Submodules
//!
//! - [`variables`]: flat bound arena with snapshot/restore
//! - [`propagation`]: precedence arcs and the fixed-point engine
//! - [`disjunction`]: tri-state machine ordering decisions
//! - [`search`]: depth-first branch-and-bound worker and budget
//! - [`extract`]: fixed store to [`Schedule`](crate::models::Schedule)
//! - [`config`] / [`solver`]: configuration and the solver facade
//!
//! # Reference
//! - Baptiste et al. (2001), "Constraint-Based Scheduling"
//! - Brucker, Jurisch & Sievers (1994), "A branch and bound algorithm for the
//!   job-shop scheduling problem"

pub mod config;
pub mod disjunction;
pub mod extract;
pub mod propagation;
pub mod search;
pub mod solver;
pub mod variables;

pub use config::{ConfigError, SolverConfig};
pub use disjunction::{Disjunction, DisjunctionSet, DisjunctionState};
pub use extract::{extract, Unfixed};
pub use propagation::{ConstraintEngine, Precedence, PropagationReport};
pub use search::{Budget, NodeState, SearchStats};
pub use solver::{JobShopSolver, SolveResult, SolveStats, SolveStatus};
pub use variables::{Infeasible, Snapshot, TimeBounds, VariableStore};
