//! Schedule quality metrics (KPIs).
//!
//! Computes standard scheduling performance indicators from a completed
//! schedule and its problem.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan (C_max) | Latest completion time |
//! | Machine Utilization | Busy time / makespan, per machine |
//! | Avg Utilization | Mean of machine utilizations |
//! | Avg Flow Time | Mean job completion time (all jobs released at 0) |
//! | Total Idle Time | Sum over machines of makespan - busy time |
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use serde::{Deserialize, Serialize};

use crate::models::{JobShopProblem, Schedule};

/// Schedule performance indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleKpi {
    /// Latest completion time.
    pub makespan: i64,
    /// Utilization per machine index (0.0..1.0).
    pub utilization_by_machine: Vec<f64>,
    /// Average machine utilization (0.0..1.0).
    pub avg_utilization: f64,
    /// Mean job completion time.
    pub avg_flow_time: f64,
    /// Total idle time across machines within `[0, makespan)`.
    pub total_idle_time: i64,
}

impl ScheduleKpi {
    /// Computes KPIs from a schedule and its problem.
    pub fn calculate(schedule: &Schedule, problem: &JobShopProblem) -> Self {
        let makespan = schedule.makespan;

        let busy: Vec<i64> = (0..problem.num_machines())
            .map(|m| schedule.machine_sequence(m).iter().map(|r| r.duration).sum())
            .collect();

        let utilization_by_machine: Vec<f64> = busy
            .iter()
            .map(|&b| {
                if makespan > 0 {
                    b as f64 / makespan as f64
                } else {
                    0.0
                }
            })
            .collect();
        let avg_utilization = if utilization_by_machine.is_empty() {
            0.0
        } else {
            utilization_by_machine.iter().sum::<f64>() / utilization_by_machine.len() as f64
        };

        let completions: Vec<i64> = (0..problem.num_jobs())
            .filter_map(|j| schedule.job_completion(j))
            .collect();
        let avg_flow_time = if completions.is_empty() {
            0.0
        } else {
            completions.iter().sum::<i64>() as f64 / completions.len() as f64
        };

        let total_idle_time = busy.iter().map(|&b| (makespan - b).max(0)).sum();

        Self {
            makespan,
            utilization_by_machine,
            avg_utilization,
            avg_flow_time,
            total_idle_time,
        }
    }

    /// Whether the schedule meets the given quality thresholds.
    pub fn meets_thresholds(&self, max_makespan: i64, min_utilization: f64) -> bool {
        self.makespan <= max_makespan && self.avg_utilization >= min_utilization
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kpi_basic() {
        // J0: M0(1); J1: M0(2) -> one machine, back to back.
        let p = JobShopProblem::new(vec![vec![(0, 1)], vec![(0, 2)]]).unwrap();
        let s = Schedule::from_starts(&p, &[0, 1]);

        let kpi = ScheduleKpi::calculate(&s, &p);
        assert_eq!(kpi.makespan, 3);
        assert!((kpi.utilization_by_machine[0] - 1.0).abs() < 1e-10);
        assert!((kpi.avg_utilization - 1.0).abs() < 1e-10);
        // completions 1 and 3
        assert!((kpi.avg_flow_time - 2.0).abs() < 1e-10);
        assert_eq!(kpi.total_idle_time, 0);
    }

    #[test]
    fn test_kpi_idle_machine_time() {
        // J0: M0(3) -> M1(2); M1 idle during [0, 3).
        let p = JobShopProblem::new(vec![vec![(0, 3), (1, 2)]]).unwrap();
        let s = Schedule::from_starts(&p, &[0, 3]);

        let kpi = ScheduleKpi::calculate(&s, &p);
        assert_eq!(kpi.makespan, 5);
        assert!((kpi.utilization_by_machine[0] - 0.6).abs() < 1e-10);
        assert!((kpi.utilization_by_machine[1] - 0.4).abs() < 1e-10);
        assert!((kpi.avg_utilization - 0.5).abs() < 1e-10);
        assert_eq!(kpi.total_idle_time, 5);
    }

    #[test]
    fn test_kpi_empty_problem() {
        let p = JobShopProblem::new(vec![]).unwrap();
        let s = Schedule::from_starts(&p, &[]);
        let kpi = ScheduleKpi::calculate(&s, &p);
        assert_eq!(kpi.makespan, 0);
        assert!(kpi.utilization_by_machine.is_empty());
        assert_eq!(kpi.avg_utilization, 0.0);
        assert_eq!(kpi.avg_flow_time, 0.0);
    }

    #[test]
    fn test_meets_thresholds() {
        let p = JobShopProblem::new(vec![vec![(0, 1)], vec![(0, 2)]]).unwrap();
        let s = Schedule::from_starts(&p, &[0, 1]);
        let kpi = ScheduleKpi::calculate(&s, &p);
        assert!(kpi.meets_thresholds(3, 0.9));
        assert!(!kpi.meets_thresholds(2, 0.9));
    }
}
