//! Dispatching heuristics and KPI evaluation.
//!
//! Provides priority-rule schedule generation and schedule quality metrics.
//!
//! # Algorithm
//!
//! `dispatch` builds Giffler-Thompson active schedules driven by a
//! [`DispatchRule`]. It is not optimal, but provides fast baseline solutions
//! and the warm-start incumbent for the exact solver.
//!
//! # KPI
//!
//! `ScheduleKpi` computes standard scheduling metrics: makespan, machine
//! utilization, flow time, and idle time.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3-4
//! - Baker & Trietsch (2019), "Principles of Sequencing and Scheduling"

mod dispatch;
mod kpi;

pub use dispatch::{best_dispatch, dispatch, DispatchRule};
pub use kpi::ScheduleKpi;
