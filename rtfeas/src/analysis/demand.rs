/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Processor-demand test.
//!
//! For a synchronous set, if the demand of jobs with both release and
//! deadline inside `[0, t]` exceeds the capacity `p·t` of `p` processors,
//! some deadline is missed under every algorithm.

use tracing::debug;

use crate::task::{Task, Time};
use crate::timing::{deadline_points, hyperperiod, total_demand_bound, TimingError};

/// `H + max D`: every distinct demand step of a synchronous set appears in
/// `[0, H + max D]`.
pub fn demand_horizon(tasks: &[Task]) -> Result<Time, TimingError> {
    let h = hyperperiod(tasks)?;
    let d_max = tasks.iter().map(Task::deadline).max().unwrap_or(0);
    h.checked_add(d_max)
        .ok_or(TimingError::Overflow { a: h, b: d_max })
}

/// First absolute deadline `t ≤ horizon` where `Σ dbf(t) > processors·t`,
/// scanning at most `max_points` deadlines.
///
/// Only meaningful for synchronous sets; callers decide when to apply it.
pub fn first_demand_overflow(
    tasks: &[Task],
    processors: usize,
    horizon: Time,
    max_points: usize,
) -> Option<Time> {
    let capacity_per_unit = processors as Time;
    let violation = deadline_points(tasks, horizon, max_points)
        .into_iter()
        .find(|&t| total_demand_bound(tasks, t) > t.saturating_mul(capacity_per_unit));
    if let Some(t) = violation {
        debug!(
            at = t,
            demand = total_demand_bound(tasks, t),
            processors,
            "processor demand exceeds capacity"
        );
    }
    violation
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskSet;

    #[test]
    fn constrained_deadlines_can_overflow_with_low_utilization() {
        // U = 0.4 + 0.4 but both jobs are due by t = 3 with 4 units of demand.
        let ts = TaskSet::from_params(&[(0, 2, 3, 5), (0, 2, 3, 5)]).unwrap();
        assert_eq!(first_demand_overflow(ts.tasks(), 1, 10, 100), Some(3));
        assert_eq!(first_demand_overflow(ts.tasks(), 2, 10, 100), None);
    }

    #[test]
    fn horizon_is_hyperperiod_plus_largest_deadline() {
        let ts = TaskSet::from_params(&[(0, 1, 3, 4), (0, 1, 9, 6)]).unwrap();
        assert_eq!(demand_horizon(ts.tasks()).unwrap(), 12 + 9);
    }

    #[test]
    fn feasible_set_has_no_overflow() {
        let ts = TaskSet::from_params(&[(0, 1, 4, 4), (0, 2, 6, 6), (0, 3, 12, 12)]).unwrap();
        assert_eq!(first_demand_overflow(ts.tasks(), 1, 24, 1_000), None);
    }
}
