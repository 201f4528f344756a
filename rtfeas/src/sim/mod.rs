/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Discrete-event simulation of a task set under a scheduling [`Policy`].
//!
//! Time advances in steps of the task set's GCD ([`time_step`]).  Each cycle
//! at time `t` runs, in this order:
//!
//! ```text
//! 1. deadline check   any pending job with t > absolute deadline → miss
//! 2. retirement       jobs that finished during the previous cycle leave
//! 3. release          tasks with a release boundary at t emit a job
//! 4. selection        the policy picks up to `processors` active tasks
//! 5. execution        each picked head job runs for one step
//! ```
//!
//! Deadline checking happens before retirement, so a job that completes
//! after its deadline is still reported as a miss.  One last check runs at
//! the horizon itself.
//!
//! The simulation refuses to start when `horizon / step` exceeds
//! [`Limits::max_iterations`], and gives up once the wall-clock budget
//! [`Limits::max_duration`] is spent.  Both report
//! [`SimOutcome::TimedOut`].
//!
//! All run-time state (pending jobs, active tasks, the jobs executed in the
//! previous cycle) is local to one [`simulate`] call.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::config::Limits;
use crate::task::{Job, Task, TaskId, Time};
use crate::timing::{busy_period, feasibility_interval, time_step, TimingError};

// ── Outcome ───────────────────────────────────────────────────────────────────

/// Why a simulation could not reach a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeoutCause {
    /// `horizon / step` exceeds the iteration limit.
    HorizonTooLong { horizon: Time, step: Time },
    /// No horizon could be computed (e.g. the hyperperiod overflows).
    HorizonUnavailable(TimingError),
    /// The wall-clock budget ran out at simulated time `at`.
    WallClock { elapsed: Duration, at: Time },
}

impl fmt::Display for TimeoutCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutCause::HorizonTooLong { horizon, step } => write!(
                f,
                "horizon {horizon} at step {step} needs {} cycles",
                horizon.div_ceil(*step)
            ),
            TimeoutCause::HorizonUnavailable(e) => write!(f, "no usable horizon: {e}"),
            TimeoutCause::WallClock { elapsed, at } => {
                write!(f, "wall-clock budget spent after {elapsed:?} at t={at}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimOutcome {
    /// The horizon was reached without a deadline miss.
    Schedulable,
    DeadlineMiss {
        task: TaskId,
        job: u32,
        deadline: Time,
        detected_at: Time,
    },
    TimedOut(TimeoutCause),
}

// ── Policy ────────────────────────────────────────────────────────────────────

/// Read-only view of the active tasks handed to a [`Policy`] each cycle.
///
/// Indices refer to positions in the simulated task slice.
#[derive(Debug, Clone, Copy)]
pub struct ReadyQueue<'a> {
    tasks: &'a [Task],
    pending: &'a [VecDeque<Job>],
    active: &'a [usize],
}

impl<'a> ReadyQueue<'a> {
    pub(crate) fn new(tasks: &'a [Task], pending: &'a [VecDeque<Job>], active: &'a [usize]) -> Self {
        Self {
            tasks,
            pending,
            active,
        }
    }

    /// Tasks with at least one pending job, in activation order.
    pub fn active(&self) -> &'a [usize] {
        self.active
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn task(&self, index: usize) -> &'a Task {
        &self.tasks[index]
    }

    /// Oldest unfinished job of the task at `index`.
    pub fn head(&self, index: usize) -> Option<&'a Job> {
        self.pending[index].front()
    }

    pub fn is_active(&self, index: usize) -> bool {
        !self.pending[index].is_empty()
    }
}

/// A scheduling decision rule.
pub trait Policy {
    fn name(&self) -> &'static str;

    /// Simulation length for `tasks` under this policy.
    fn horizon(&self, tasks: &[Task], limits: &Limits) -> Result<Time, TimingError>;

    /// Pick the active task to run on a single processor, if any.
    fn select_next(&mut self, ready: &ReadyQueue<'_>) -> Option<usize>;

    /// Pick up to `slots` distinct active tasks.
    ///
    /// The default fills a single slot with [`select_next`](Self::select_next).
    fn select_top(&mut self, ready: &ReadyQueue<'_>, slots: usize) -> Vec<usize> {
        if slots == 0 {
            return Vec::new();
        }
        self.select_next(ready).into_iter().collect()
    }
}

// ── Horizons ──────────────────────────────────────────────────────────────────

/// `true` if `horizon` can be simulated at `step` within the iteration limit.
pub fn within_iteration_limit(horizon: Time, step: Time, limits: &Limits) -> bool {
    step > 0 && horizon.div_ceil(step) <= limits.max_iterations
}

/// The feasibility interval when it fits the iteration limit, otherwise the
/// doubled busy period plus `fallback_offset`.
pub fn interval_or_busy_period(
    tasks: &[Task],
    limits: &Limits,
    fallback_offset: Time,
) -> Result<Time, TimingError> {
    let step = time_step(tasks)?;
    match feasibility_interval(tasks) {
        Ok(fi) if within_iteration_limit(fi, step, limits) => return Ok(fi),
        Ok(fi) => debug!(feasibility_interval = fi, step, "interval too long, using busy period"),
        Err(e) => debug!(error = %e, "no feasibility interval, using busy period"),
    }
    let bp = busy_period(tasks)?;
    bp.checked_add(fallback_offset)
        .ok_or(TimingError::Overflow { a: bp, b: fallback_offset })
}

// ── Simulation loop ───────────────────────────────────────────────────────────

/// Simulate `tasks` on `processors` identical processors under `policy`.
///
/// With `verbose`, every release, execution and completion is traced.
pub fn simulate<P: Policy + ?Sized>(
    tasks: &[Task],
    policy: &mut P,
    processors: usize,
    limits: &Limits,
    verbose: bool,
) -> SimOutcome {
    if tasks.is_empty() {
        return SimOutcome::Schedulable;
    }

    let bounds = time_step(tasks).and_then(|step| policy.horizon(tasks, limits).map(|h| (step, h)));
    let (step, horizon) = match bounds {
        Ok(pair) => pair,
        Err(e) => {
            warn!(policy = policy.name(), error = %e, "cannot bound the simulation");
            return SimOutcome::TimedOut(TimeoutCause::HorizonUnavailable(e));
        }
    };
    if !within_iteration_limit(horizon, step, limits) {
        warn!(
            policy = policy.name(),
            horizon,
            step,
            max_iterations = limits.max_iterations,
            "horizon too long, refusing to simulate"
        );
        return SimOutcome::TimedOut(TimeoutCause::HorizonTooLong { horizon, step });
    }

    debug!(
        policy = policy.name(),
        tasks = tasks.len(),
        processors,
        horizon,
        step,
        "simulation start"
    );

    let started = Instant::now();
    let give_up_at = started.checked_add(limits.max_duration());

    let mut pending: Vec<VecDeque<Job>> = vec![VecDeque::new(); tasks.len()];
    let mut released = vec![0_u32; tasks.len()];
    let mut active: Vec<usize> = Vec::new();
    let mut executed: Vec<usize> = Vec::with_capacity(processors);

    let mut t: Time = 0;
    while t < horizon {
        if give_up_at.is_some_and(|limit| Instant::now() >= limit) {
            let elapsed = started.elapsed();
            warn!(policy = policy.name(), ?elapsed, at = t, "simulation wall-clock budget spent");
            return SimOutcome::TimedOut(TimeoutCause::WallClock { elapsed, at: t });
        }

        // 1. deadline check
        if let Some(miss) = first_miss(&pending, t) {
            debug!(policy = policy.name(), ?miss, "deadline miss");
            return miss;
        }

        // 2. retirement
        for &i in &executed {
            if pending[i].front().is_some_and(Job::is_finished) {
                if let Some(job) = pending[i].pop_front() {
                    if verbose {
                        trace!(job = %job, t, "completed");
                    }
                }
                if pending[i].is_empty() {
                    active.retain(|&a| a != i);
                }
            }
        }
        executed.clear();

        // 3. release
        for (i, task) in tasks.iter().enumerate() {
            if let Some(job) = task.release_job(t, released[i] + 1) {
                if verbose {
                    trace!(job = %job, t, deadline = job.absolute_deadline(), "released");
                }
                released[i] += 1;
                pending[i].push_back(job);
                if !active.contains(&i) {
                    active.push(i);
                }
            }
        }

        // 4. selection
        let chosen = {
            let ready = ReadyQueue::new(tasks, &pending, &active);
            policy.select_top(&ready, processors)
        };

        // 5. execution
        for i in chosen {
            if let Some(job) = pending[i].front_mut() {
                if verbose {
                    trace!(job = %job, t, remaining = job.computation_time_remaining(), "running");
                }
                job.execute(step);
                executed.push(i);
            }
        }

        t = match t.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }

    // Jobs due before the horizon that are still pending, or that finished
    // late in the final cycle, are misses too.
    if let Some(miss) = first_miss(&pending, t) {
        debug!(policy = policy.name(), ?miss, "deadline miss at horizon");
        return miss;
    }

    debug!(policy = policy.name(), horizon, elapsed = ?started.elapsed(), "simulation complete");
    SimOutcome::Schedulable
}

/// The head job of each task has its earliest deadline.
fn first_miss(pending: &[VecDeque<Job>], t: Time) -> Option<SimOutcome> {
    pending
        .iter()
        .filter_map(VecDeque::front)
        .find(|job| job.deadline_missed(t))
        .map(|job| SimOutcome::DeadlineMiss {
            task: job.task(),
            job: job.job_id(),
            deadline: job.absolute_deadline(),
            detected_at: t,
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
