/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Scheduling policies plugged into [`crate::sim::simulate`].
//!
//! | Policy | Priority | Horizon |
//! |--------|----------|---------|
//! | [`FixedPriority`] (RM, DM, Audsley order) | static rank | feasibility interval, busy period plus largest offset as fallback |
//! | [`EarliestDeadlineFirst`] | earliest absolute deadline of the head job | first idle point (synchronous) or feasibility interval |
//! | [`RoundRobin`] | rotating queue, initially by deadline | feasibility interval, busy period plus largest offset as fallback |

use std::collections::{HashMap, VecDeque};

use crate::config::Limits;
use crate::sim::{interval_or_busy_period, Policy, ReadyQueue};
use crate::task::{Task, TaskId, Time};
use crate::timing::{
    feasibility_interval, first_idle_point, is_synchronous, max_offset, time_step, TimingError,
};

// ── Fixed priority ────────────────────────────────────────────────────────────

/// Static priorities: the task with the lowest rank runs.
#[derive(Debug, Clone)]
pub struct FixedPriority {
    name: &'static str,
    /// Rank of each task of the simulated slice, by position.
    rank: Vec<usize>,
}

impl FixedPriority {
    /// Build from `ordered` (highest priority first), a permutation of
    /// `tasks`.  Tasks missing from `ordered` rank below every listed one.
    pub fn from_order(name: &'static str, tasks: &[Task], ordered: &[&Task]) -> Self {
        let position: HashMap<TaskId, usize> = ordered
            .iter()
            .enumerate()
            .map(|(rank, t)| (t.id(), rank))
            .collect();
        let rank = tasks
            .iter()
            .map(|t| position.get(&t.id()).copied().unwrap_or(usize::MAX))
            .collect();
        Self { name, rank }
    }
}

impl Policy for FixedPriority {
    fn name(&self) -> &'static str {
        self.name
    }

    fn horizon(&self, tasks: &[Task], limits: &Limits) -> Result<Time, TimingError> {
        interval_or_busy_period(tasks, limits, max_offset(tasks))
    }

    fn select_next(&mut self, ready: &ReadyQueue<'_>) -> Option<usize> {
        ready
            .active()
            .iter()
            .copied()
            .min_by_key(|&i| (self.rank[i], i))
    }
}

// ── EDF ───────────────────────────────────────────────────────────────────────

/// How an [`EarliestDeadlineFirst`] run is bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdfHorizon {
    /// First idle point plus one step for synchronous sets; feasibility
    /// interval (busy period plus largest offset as fallback) otherwise.
    FirstIdlePoint,
    /// Always the feasibility interval.
    FeasibilityInterval,
}

/// Job-level dynamic priority: earliest absolute deadline first, ties to the
/// lower task identifier.
///
/// On several processors the `n` earliest head jobs run in parallel.
#[derive(Debug, Clone)]
pub struct EarliestDeadlineFirst {
    horizon: EdfHorizon,
}

impl EarliestDeadlineFirst {
    pub fn uniprocessor() -> Self {
        Self {
            horizon: EdfHorizon::FirstIdlePoint,
        }
    }

    pub fn clustered() -> Self {
        Self {
            horizon: EdfHorizon::FeasibilityInterval,
        }
    }

    fn key(ready: &ReadyQueue<'_>, index: usize) -> (Time, TaskId) {
        let deadline = ready
            .head(index)
            .map_or(Time::MAX, |job| job.absolute_deadline());
        (deadline, ready.task(index).id())
    }
}

impl Policy for EarliestDeadlineFirst {
    fn name(&self) -> &'static str {
        "edf"
    }

    fn horizon(&self, tasks: &[Task], limits: &Limits) -> Result<Time, TimingError> {
        match self.horizon {
            EdfHorizon::FeasibilityInterval => feasibility_interval(tasks),
            EdfHorizon::FirstIdlePoint if is_synchronous(tasks) => {
                let idle = first_idle_point(tasks, limits.fixpoint_cap)?;
                let step = time_step(tasks)?;
                idle.checked_add(step)
                    .ok_or(TimingError::Overflow { a: idle, b: step })
            }
            EdfHorizon::FirstIdlePoint => {
                interval_or_busy_period(tasks, limits, max_offset(tasks))
            }
        }
    }

    fn select_next(&mut self, ready: &ReadyQueue<'_>) -> Option<usize> {
        ready
            .active()
            .iter()
            .copied()
            .min_by_key(|&i| Self::key(ready, i))
    }

    fn select_top(&mut self, ready: &ReadyQueue<'_>, slots: usize) -> Vec<usize> {
        let mut candidates: Vec<usize> = ready.active().to_vec();
        candidates.sort_by_key(|&i| Self::key(ready, i));
        candidates.truncate(slots);
        candidates
    }
}

// ── Round Robin ───────────────────────────────────────────────────────────────

/// Fully preemptive time slicing at the simulation step.
#[derive(Debug, Clone)]
pub struct RoundRobin {
    queue: VecDeque<usize>,
}

impl RoundRobin {
    /// Queue every task of `tasks` by ascending deadline, ties by identifier.
    pub fn new(tasks: &[Task]) -> Self {
        let mut order: Vec<usize> = (0..tasks.len()).collect();
        order.sort_by_key(|&i| (tasks[i].deadline(), tasks[i].id()));
        Self {
            queue: order.into(),
        }
    }
}

impl Policy for RoundRobin {
    fn name(&self) -> &'static str {
        "rr"
    }

    fn horizon(&self, tasks: &[Task], limits: &Limits) -> Result<Time, TimingError> {
        interval_or_busy_period(tasks, limits, max_offset(tasks))
    }

    fn select_next(&mut self, ready: &ReadyQueue<'_>) -> Option<usize> {
        let pos = self.queue.iter().position(|&i| ready.is_active(i))?;
        let chosen = self.queue.remove(pos)?;
        self.queue.push_back(chosen);
        Some(chosen)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::rta::{deadline_monotonic_order, rate_monotonic_order};
    use crate::sim::{simulate, SimOutcome};
    use crate::task::{Job, TaskSet};

    fn set(params: &[(Time, Time, Time, Time)]) -> TaskSet {
        TaskSet::from_params(params).unwrap()
    }

    fn run(policy: &mut dyn Policy, ts: &TaskSet) -> SimOutcome {
        simulate(ts.tasks(), policy, 1, &Limits::default(), false)
    }

    // ── Fixed priority ────────────────────────────────────────────────────────

    #[test]
    fn rate_monotonic_meets_every_deadline_of_the_classic_set() {
        let ts = set(&[(0, 1, 4, 4), (0, 2, 6, 6), (0, 3, 12, 12)]);
        let mut rm = FixedPriority::from_order("rm", ts.tasks(), &rate_monotonic_order(ts.tasks()));
        assert_eq!(run(&mut rm, &ts), SimOutcome::Schedulable);
    }

    #[test]
    fn deadline_monotonic_beats_rate_monotonic_on_constrained_deadlines() {
        // T1 has the shorter period, T2 the shorter deadline.
        let ts = set(&[(0, 2, 5, 5), (0, 2, 2, 10)]);
        let mut rm = FixedPriority::from_order("rm", ts.tasks(), &rate_monotonic_order(ts.tasks()));
        assert!(matches!(
            run(&mut rm, &ts),
            SimOutcome::DeadlineMiss { task: TaskId(2), .. }
        ));

        let mut dm =
            FixedPriority::from_order("dm", ts.tasks(), &deadline_monotonic_order(ts.tasks()));
        assert_eq!(run(&mut dm, &ts), SimOutcome::Schedulable);
    }

    #[test]
    fn busy_period_fallback_reaches_late_releases() {
        // O_max + 2H = 100 is over the limit; 2L + O_max = 14 + 20 is not.
        // T3 cannot fit C = 3 before D = 2.
        let ts = set(&[(0, 1, 4, 4), (0, 1, 5, 5), (20, 3, 2, 8)]);
        let limits = Limits {
            max_iterations: 60,
            ..Limits::default()
        };

        let mut rm = FixedPriority::from_order("rm", ts.tasks(), &rate_monotonic_order(ts.tasks()));
        assert_eq!(rm.horizon(ts.tasks(), &limits).unwrap(), 34);
        assert!(matches!(
            simulate(ts.tasks(), &mut rm, 1, &limits, false),
            SimOutcome::DeadlineMiss { task: TaskId(3), .. }
        ));

        let mut rr = RoundRobin::new(ts.tasks());
        assert_eq!(rr.horizon(ts.tasks(), &limits).unwrap(), 34);
        assert!(matches!(
            simulate(ts.tasks(), &mut rr, 1, &limits, false),
            SimOutcome::DeadlineMiss { task: TaskId(3), .. }
        ));
    }

    // ── EDF ───────────────────────────────────────────────────────────────────

    #[test]
    fn edf_schedules_full_utilization() {
        // U = 1/2 + 2/4 = 1
        let ts = set(&[(0, 1, 2, 2), (0, 2, 4, 4)]);
        assert_eq!(
            run(&mut EarliestDeadlineFirst::uniprocessor(), &ts),
            SimOutcome::Schedulable
        );
    }

    #[test]
    fn edf_horizon_depends_on_offsets() {
        let limits = Limits::default();
        let sync = set(&[(0, 1, 4, 4), (0, 2, 6, 6)]);
        // first idle point 3, step 1
        assert_eq!(
            EarliestDeadlineFirst::uniprocessor()
                .horizon(sync.tasks(), &limits)
                .unwrap(),
            4
        );

        let offset = set(&[(2, 1, 4, 4), (0, 2, 6, 6)]);
        assert_eq!(
            EarliestDeadlineFirst::uniprocessor()
                .horizon(offset.tasks(), &limits)
                .unwrap(),
            2 + 24
        );
        assert_eq!(
            EarliestDeadlineFirst::clustered()
                .horizon(sync.tasks(), &limits)
                .unwrap(),
            24
        );
    }

    #[test]
    fn edf_top_picks_earliest_deadlines_with_id_tie_break() {
        let ts = set(&[(0, 1, 5, 10), (0, 1, 3, 10), (0, 1, 5, 10)]);
        let pending: Vec<VecDeque<Job>> = ts
            .iter()
            .enumerate()
            .map(|(i, t)| t.release_job(0, i as u32 + 1).into_iter().collect())
            .collect();
        let active = [0, 1, 2];
        let ready = ReadyQueue::new(ts.tasks(), &pending, &active);

        let mut edf = EarliestDeadlineFirst::clustered();
        assert_eq!(edf.select_top(&ready, 2), vec![1, 0]);
        assert_eq!(edf.select_next(&ready), Some(1));
    }

    // ── Round Robin ───────────────────────────────────────────────────────────

    #[test]
    fn round_robin_rotates_between_active_tasks() {
        let ts = set(&[(0, 2, 8, 8), (0, 2, 4, 8)]);
        let pending: Vec<VecDeque<Job>> = ts
            .iter()
            .map(|t| t.release_job(0, 1).into_iter().collect())
            .collect();
        let active = [0, 1];
        let ready = ReadyQueue::new(ts.tasks(), &pending, &active);

        let mut rr = RoundRobin::new(ts.tasks());
        // Queue starts at the shorter deadline.
        assert_eq!(rr.select_next(&ready), Some(1));
        assert_eq!(rr.select_next(&ready), Some(0));
        assert_eq!(rr.select_next(&ready), Some(1));
    }

    #[test]
    fn round_robin_slicing_can_miss_where_edf_does_not() {
        // Alternating slices finish T1 at t = 5, past its deadline of 4.
        let ts = set(&[(0, 3, 4, 8), (0, 3, 8, 8)]);
        assert_eq!(
            run(&mut RoundRobin::new(ts.tasks()), &ts),
            SimOutcome::DeadlineMiss {
                task: TaskId(1),
                job: 1,
                deadline: 4,
                detected_at: 5
            }
        );
        assert_eq!(
            run(&mut EarliestDeadlineFirst::uniprocessor(), &ts),
            SimOutcome::Schedulable
        );
    }
}
