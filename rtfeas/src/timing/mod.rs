/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Time-domain quantities of a task set.
//!
//! | Quantity | Definition |
//! |----------|------------|
//! | utilization | `Σ C/T` |
//! | hyperperiod `H` | `lcm(T₁ … Tₙ)` |
//! | feasibility interval | `O_max + 2H` |
//! | time step | `gcd` of every `O`, `C`, `D`, `T` |
//! | busy period | `2L`, `L` the synchronous level-n busy period (capped at `H`) |
//! | first idle point | fixpoint of `w = Σ ⌈w / min(D,T)⌉ C` (capped) |
//! | demand bound | `dbf(t) = Σ max(0, ⌊(t − D)/T⌋ + 1) C` |
//!
//! Every operation takes a plain `&[Task]` so callers can pass a whole
//! [`TaskSet`](crate::task::TaskSet) or the member slice of one cluster.

pub mod math;

use thiserror::Error;
use tracing::debug;

use crate::task::{Task, Time};
use math::{gcd_of_slice, lcm_of_slice};

// ── Error type ────────────────────────────────────────────────────────────────

/// Failures of the time-domain helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimingError {
    #[error("task set is empty")]
    NoTasks,

    /// An LCM (or a quantity derived from it) overflowed [`Time`].
    #[error("time overflow combining {a} and {b}")]
    Overflow { a: Time, b: Time },

    /// A fixpoint iteration climbed past its absolute cap before converging.
    #[error("{what} did not converge below {cap}")]
    FixpointCapExceeded { what: &'static str, cap: Time },
}

fn non_empty(tasks: &[Task]) -> Result<(), TimingError> {
    if tasks.is_empty() {
        Err(TimingError::NoTasks)
    } else {
        Ok(())
    }
}

// ── Ratios ────────────────────────────────────────────────────────────────────

/// `Σ C/T`.  `0.0` for an empty slice.
pub fn utilization(tasks: &[Task]) -> f64 {
    tasks.iter().map(Task::utilization).sum()
}

/// `Σ C / min(D, T)`.  `0.0` for an empty slice.
pub fn density(tasks: &[Task]) -> f64 {
    tasks.iter().map(Task::density).sum()
}

// ── Intervals ─────────────────────────────────────────────────────────────────

/// LCM of every period.
pub fn hyperperiod(tasks: &[Task]) -> Result<Time, TimingError> {
    non_empty(tasks)?;
    let periods: Vec<Time> = tasks.iter().map(Task::period).collect();
    lcm_of_slice(&periods)
}

/// Largest offset in the slice (`0` if empty).
pub fn max_offset(tasks: &[Task]) -> Time {
    tasks.iter().map(Task::offset).max().unwrap_or(0)
}

/// `true` when every offset is zero.
pub fn is_synchronous(tasks: &[Task]) -> bool {
    tasks.iter().all(|t| t.offset() == 0)
}

/// `O_max + 2H`.
pub fn feasibility_interval(tasks: &[Task]) -> Result<Time, TimingError> {
    let h = hyperperiod(tasks)?;
    let o_max = max_offset(tasks);
    h.checked_mul(2)
        .and_then(|two_h| two_h.checked_add(o_max))
        .ok_or(TimingError::Overflow { a: o_max, b: h })
}

/// GCD of every offset, computation time, deadline and period.
///
/// Every event of the simulation (release, completion, deadline) falls on a
/// multiple of this step.
pub fn time_step(tasks: &[Task]) -> Result<Time, TimingError> {
    non_empty(tasks)?;
    let values: Vec<Time> = tasks
        .iter()
        .flat_map(|t| [t.offset(), t.computation_time(), t.deadline(), t.period()])
        .collect();
    Ok(gcd_of_slice(&values))
}

/// Workload of the slice in `[0, w)` with every task released at 0:
/// `Σ ⌈w / divisor(task)⌉ · C`, saturating.
fn workload(tasks: &[Task], w: Time, divisor: impl Fn(&Task) -> Time) -> Time {
    tasks.iter().fold(0, |acc: Time, t| {
        acc.saturating_add(w.div_ceil(divisor(t)).saturating_mul(t.computation_time()))
    })
}

/// Iterate `w ← workload(w)` from `Σ C` until it stops moving or exceeds
/// `cap`.  `Ok(w)` on convergence, `Err(last)` when the cap was crossed.
fn workload_fixpoint(
    tasks: &[Task],
    cap: Time,
    divisor: impl Fn(&Task) -> Time,
) -> Result<Time, Time> {
    let mut w = tasks
        .iter()
        .fold(0, |acc: Time, t| acc.saturating_add(t.computation_time()));
    loop {
        if w > cap {
            return Err(w);
        }
        let next = workload(tasks, w, &divisor);
        if next == w {
            return Ok(w);
        }
        w = next;
    }
}

/// Twice the length of the synchronous busy period.
///
/// The busy period `L` is the fixpoint of `L = Σ ⌈L/T⌉ · C`.  The iteration
/// is capped at the hyperperiod (or at `Time::MAX` if the hyperperiod itself
/// overflows) so it terminates for overloaded sets.
pub fn busy_period(tasks: &[Task]) -> Result<Time, TimingError> {
    non_empty(tasks)?;
    let cap = hyperperiod(tasks).unwrap_or(Time::MAX);
    let l = workload_fixpoint(tasks, cap, Task::period).unwrap_or(cap);
    debug!(busy_period = l, cap, "synchronous busy period");
    l.checked_mul(2).ok_or(TimingError::Overflow { a: l, b: 2 })
}

/// First idle point of the synchronous schedule.
///
/// Fixpoint of `w = Σ ⌈w / min(D, T)⌉ · C`.  Returns the hyperperiod if the
/// iteration climbs past it first (the schedule is periodic from there).  If
/// `cap` is hit before either, the result is
/// [`TimingError::FixpointCapExceeded`].
pub fn first_idle_point(tasks: &[Task], cap: Time) -> Result<Time, TimingError> {
    non_empty(tasks)?;
    let h = hyperperiod(tasks).ok();
    let bound = h.map_or(cap, |h| h.min(cap));
    match workload_fixpoint(tasks, bound, |t| t.deadline().min(t.period())) {
        Ok(w) => Ok(w),
        Err(_) => match h {
            Some(h) if h <= cap => Ok(h),
            _ => Err(TimingError::FixpointCapExceeded {
                what: "first idle point",
                cap,
            }),
        },
    }
}

// ── Demand ────────────────────────────────────────────────────────────────────

/// `dbf_i(t) = max(0, ⌊(t − D)/T⌋ + 1) · C` for one task released at 0.
pub fn demand_bound(task: &Task, t: Time) -> Time {
    if t < task.deadline() {
        return 0;
    }
    ((t - task.deadline()) / task.period() + 1).saturating_mul(task.computation_time())
}

/// `Σ dbf_i(t)`.
pub fn total_demand_bound(tasks: &[Task], t: Time) -> Time {
    tasks
        .iter()
        .fold(0, |acc: Time, task| acc.saturating_add(demand_bound(task, t)))
}

/// Absolute deadlines `D + jT ≤ horizon` of every task, sorted and
/// de-duplicated, truncated to the `max_points` smallest.
///
/// These are the only instants where `dbf` steps up, so they are the only
/// points a demand test needs to visit.
pub fn deadline_points(tasks: &[Task], horizon: Time, max_points: usize) -> Vec<Time> {
    let mut points: Vec<Time> = tasks
        .iter()
        .flat_map(|task| {
            (0..)
                .map_while(move |j: Time| {
                    j.checked_mul(task.period())
                        .and_then(|jt| jt.checked_add(task.deadline()))
                })
                .take_while(move |&d| d <= horizon)
                .take(max_points)
        })
        .collect();
    points.sort_unstable();
    points.dedup();
    points.truncate(max_points);
    points
}

// ── Tests ─────────────────────────────────────────────────────────────────────
