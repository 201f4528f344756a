/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Worst-case response-time analysis for fixed-priority scheduling.
//!
//! For a task `i` with higher-priority set `hp(i)` the response time of its
//! `q`-th job in a level-`i` busy period is the smallest fixpoint of
//!
//! ```text
//! w = (q + 1)·Cᵢ + Σ_{j ∈ hp(i)} ⌈w / Tⱼ⌉ · Cⱼ        R(q) = w − q·Tᵢ
//! ```
//!
//! With `D ≤ T` only `q = 0` matters.  With `D > T` every job released in the
//! level-`i` busy period is checked.  The result is exact for synchronous
//! sets and an upper bound for sets with offsets.

use tracing::trace;

use super::{PriorityAssignment, UTILIZATION_EPSILON};
use crate::task::{Task, TaskId, Time};
use crate::timing::math::lcm;

/// A task whose worst-case response time exceeds its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineOverrun {
    pub task: TaskId,
}

/// Worst-case response time of `task` when every task in `higher` has a
/// higher priority.
///
/// Returns `None` when the response time exceeds the deadline (including the
/// case where the level utilisation is above 1).
pub fn response_time(task: &Task, higher: &[&Task]) -> Option<Time> {
    let level_u = task.utilization() + higher.iter().map(|t| t.utilization()).sum::<f64>();
    if level_u > 1.0 + UTILIZATION_EPSILON {
        return None;
    }

    if task.deadline() <= task.period() {
        return job_response_time(task, higher, 0);
    }

    let busy = level_busy_period(task, higher)?;
    let jobs = busy.div_ceil(task.period()).max(1);
    let mut worst = 0;
    for q in 0..jobs {
        worst = worst.max(job_response_time(task, higher, q)?);
    }
    Some(worst)
}

/// Response time of job `q` (0-based) of the level-`i` busy period, or `None`
/// once its completion passes `q·T + D`.
fn job_response_time(task: &Task, higher: &[&Task], q: Time) -> Option<Time> {
    let own = (q + 1).checked_mul(task.computation_time())?;
    let release = q.checked_mul(task.period())?;
    let limit = release.checked_add(task.deadline())?;

    let mut w = own;
    loop {
        let next = higher.iter().fold(own, |acc: Time, hp| {
            acc.saturating_add(w.div_ceil(hp.period()).saturating_mul(hp.computation_time()))
        });
        if next > limit {
            trace!(task = %task.id(), job = q, w = next, limit, "response time exceeds deadline");
            return None;
        }
        if next == w {
            return Some(w - release);
        }
        w = next;
    }
}

/// Length of the synchronous level-`i` busy period, capped at the level
/// hyperperiod.
fn level_busy_period(task: &Task, higher: &[&Task]) -> Option<Time> {
    let level: Vec<&Task> = std::iter::once(task).chain(higher.iter().copied()).collect();
    let cap = level
        .iter()
        .try_fold(1, |acc, t| lcm(acc, t.period()))
        .unwrap_or(Time::MAX);

    let mut l = level
        .iter()
        .fold(0, |acc: Time, t| acc.saturating_add(t.computation_time()));
    loop {
        if l > cap {
            return None;
        }
        let next = level.iter().fold(0, |acc: Time, t| {
            acc.saturating_add(l.div_ceil(t.period()).saturating_mul(t.computation_time()))
        });
        if next == l {
            return Some(l);
        }
        l = next;
    }
}

/// Response times of `ordered` (highest priority first), each task suffering
/// interference from every task before it.
pub fn response_times_in_order(ordered: &[&Task]) -> Result<Vec<Time>, DeadlineOverrun> {
    ordered
        .iter()
        .enumerate()
        .map(|(i, task)| {
            response_time(task, &ordered[..i]).ok_or(DeadlineOverrun { task: task.id() })
        })
        .collect()
}

/// Response time of `task` under an explicit priority table.  Tasks without
/// a level are treated as higher priority.
pub fn response_time_with_priorities(
    task: &Task,
    tasks: &[Task],
    priorities: &PriorityAssignment,
) -> Option<Time> {
    let own = priorities.level(task.id());
    let higher: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.id() != task.id())
        .filter(|t| match (priorities.level(t.id()), own) {
            (Some(theirs), Some(mine)) => theirs < mine,
            (None, _) => true,
            (Some(_), None) => false,
        })
        .collect();
    response_time(task, &higher)
}

// ── Orderings ─────────────────────────────────────────────────────────────────

/// Shorter period first; ties by identifier.
pub fn rate_monotonic_order(tasks: &[Task]) -> Vec<&Task> {
    let mut ordered: Vec<&Task> = tasks.iter().collect();
    ordered.sort_by_key(|t| (t.period(), t.id()));
    ordered
}

/// Shorter deadline first; ties by period, then identifier.
pub fn deadline_monotonic_order(tasks: &[Task]) -> Vec<&Task> {
    let mut ordered: Vec<&Task> = tasks.iter().collect();
    ordered.sort_by_key(|t| (t.deadline(), t.period(), t.id()));
    ordered
}

// ── Tests ─────────────────────────────────────────────────────────────────────
