/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Analytic schedulability tests.
//!
//! These never simulate.  Each one either proves a verdict or declines to
//! decide, and the engines in [`crate::uniproc`] / [`crate::multiproc`] try
//! them before falling back to simulation.
//!
//! # Theory
//! **Liu & Layland (1973)**: a set of `n` independent periodic tasks with
//! implicit deadlines is schedulable under Rate Monotonic if
//!
//! $$U = \sum_{i=1}^{n} \frac{C_i}{T_i} \leq n \left(2^{1/n} - 1\right)$$
//!
//! | n | Bound |
//! |---|---|
//! | 1 | 1.000 |
//! | 2 | 0.828 |
//! | 3 | 0.780 |
//! | ∞ | ln(2) ≈ 0.693 |
//!
//! `U ≤ 1` is necessary for every uniprocessor algorithm.
//!
//! Response-time analysis lives in [`rta`], demand-bound analysis in
//! [`demand`].

pub mod demand;
pub mod rta;

use std::collections::BTreeMap;

use crate::task::{Task, TaskId};
use crate::timing::utilization;

pub use demand::{demand_horizon, first_demand_overflow};
pub use rta::{response_time, response_times_in_order};

/// Slack applied to floating-point utilisation comparisons so that sets such
/// as `1/3 + 2/3` are not rejected by rounding.
pub const UTILIZATION_EPSILON: f64 = 1e-9;

// ── Utilisation bounds ────────────────────────────────────────────────────────

/// `n × (2^(1/n) − 1)`; `0.0` for `n = 0`.
pub fn liu_layland_bound(n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let nf = n as f64;
    nf * (2.0_f64.powf(1.0 / nf) - 1.0)
}

/// `true` if every deadline is implicit and `U` is within the Liu & Layland
/// bound.  Constrained or arbitrary deadlines always return `false`.
pub fn within_liu_layland_bound(tasks: &[Task]) -> bool {
    if tasks.is_empty() || !tasks.iter().all(Task::has_implicit_deadline) {
        return false;
    }
    utilization(tasks) <= liu_layland_bound(tasks.len()) + UTILIZATION_EPSILON
}

/// `U > 1`: no uniprocessor algorithm can schedule the set.
pub fn exceeds_unit_utilization(tasks: &[Task]) -> bool {
    utilization(tasks) > 1.0 + UTILIZATION_EPSILON
}

// ── Priority assignment ───────────────────────────────────────────────────────

/// Side table of fixed priorities: level `1` is the highest.
///
/// Kept apart from [`Task`] so a search can build it without mutating the
/// task set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorityAssignment {
    levels: BTreeMap<TaskId, u32>,
}

impl PriorityAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give `task` priority `level`, replacing any earlier level.
    pub fn assign(&mut self, task: TaskId, level: u32) {
        self.levels.insert(task, level);
    }

    pub fn level(&self, task: TaskId) -> Option<u32> {
        self.levels.get(&task).copied()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// `true` if every task in `tasks` has a level and no two share one.
    pub fn is_complete_for(&self, tasks: &[Task]) -> bool {
        let mut seen = std::collections::HashSet::new();
        tasks
            .iter()
            .all(|t| self.level(t.id()).is_some_and(|lvl| seen.insert(lvl)))
    }

    /// `tasks` sorted highest priority first.  Unassigned tasks sort last,
    /// by identifier.
    pub fn order<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        let mut ordered: Vec<&Task> = tasks.iter().collect();
        ordered.sort_by_key(|t| (self.level(t.id()).unwrap_or(u32::MAX), t.id()));
        ordered
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskSet;

    #[test]
    fn bound_values() {
        assert_eq!(liu_layland_bound(0), 0.0);
        assert!((liu_layland_bound(1) - 1.0).abs() < 1e-10);
        assert!((liu_layland_bound(2) - 0.828_427).abs() < 1e-5);
        assert!((liu_layland_bound(1000) - std::f64::consts::LN_2).abs() < 1e-3);
    }

    #[test]
    fn bound_decreases_with_n() {
        let bounds: Vec<f64> = (1..=10).map(liu_layland_bound).collect();
        assert!(bounds.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn liu_layland_requires_implicit_deadlines() {
        let implicit = TaskSet::from_params(&[(0, 1, 4, 4), (0, 1, 5, 5)]).unwrap();
        assert!(within_liu_layland_bound(implicit.tasks()));

        let constrained = TaskSet::from_params(&[(0, 1, 3, 4), (0, 1, 5, 5)]).unwrap();
        assert!(!within_liu_layland_bound(constrained.tasks()));
    }

    #[test]
    fn exact_unit_utilization_is_not_an_overload() {
        let ts = TaskSet::from_params(&[(0, 1, 3, 3), (0, 2, 3, 3)]).unwrap();
        assert!(!exceeds_unit_utilization(ts.tasks()));

        let ts = TaskSet::from_params(&[(0, 2, 3, 3), (0, 2, 3, 3)]).unwrap();
        assert!(exceeds_unit_utilization(ts.tasks()));
    }

    #[test]
    fn assignment_orders_and_checks_completeness() {
        let ts = TaskSet::from_params(&[(0, 1, 4, 4), (0, 1, 5, 5), (0, 1, 6, 6)]).unwrap();
        let mut pa = PriorityAssignment::new();
        pa.assign(TaskId(3), 1);
        pa.assign(TaskId(1), 2);
        assert!(!pa.is_complete_for(ts.tasks()));

        let order: Vec<TaskId> = pa.order(ts.tasks()).iter().map(|t| t.id()).collect();
        assert_eq!(order, vec![TaskId(3), TaskId(1), TaskId(2)]);

        pa.assign(TaskId(2), 2);
        assert!(!pa.is_complete_for(ts.tasks()), "duplicate level");
        pa.assign(TaskId(2), 3);
        assert!(pa.is_complete_for(ts.tasks()));
    }
}
