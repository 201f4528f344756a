/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Periodic task model: [`Task`], the [`Job`]s it releases, and [`TaskSet`].
//!
//! ```text
//! task file ──(parse)──►  TaskSet  ──(evaluate)──►  FeasibilityResult
//!                           │
//!                           └─ Task ──(release_job at t)──► Job   (simulation only)
//! ```
//!
//! # Ownership model
//! A [`Task`] is an immutable value: its timing parameters are validated once
//! at construction and never change afterwards.  The jobs a task has released
//! but not yet finished belong to the simulation run that released them (see
//! [`crate::sim`]), not to the task, so the same `TaskSet` can be evaluated by
//! several algorithms without cross-run contamination.
//!
//! Priorities used by fixed-priority searches live in a side table
//! ([`crate::analysis::PriorityAssignment`]) rather than in the task.

use std::fmt;
use std::hash::{Hash, Hasher};

use thiserror::Error;

/// Simulated time, in the abstract integer units of the task file.
pub type Time = u64;

// ── Identity ──────────────────────────────────────────────────────────────────

/// Unique identifier of a task within a [`TaskSet`].
///
/// Assigned explicitly at construction (by the caller or by
/// [`TaskSetBuilder`]). There is no global counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u32);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Invalid task parameters, rejected when the task is constructed so that no
/// analysis ever divides by a zero period.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("task {id}: computation time must be greater than zero")]
    ZeroComputationTime { id: TaskId },

    #[error("task {id}: relative deadline must be greater than zero")]
    ZeroDeadline { id: TaskId },

    #[error("task {id}: period must be greater than zero")]
    ZeroPeriod { id: TaskId },
}

// ── Task ──────────────────────────────────────────────────────────────────────

/// A periodic task `(O, C, D, T)`.
///
/// Equality and hashing use the identifier only, so tasks can be used as set
/// members regardless of their parameters.
#[derive(Debug, Clone)]
pub struct Task {
    id: TaskId,
    /// First eligible release time.
    offset: Time,
    /// Worst-case execution demand of each job.
    computation_time: Time,
    /// Relative deadline, counted from each release.
    deadline: Time,
    /// Inter-release time.
    period: Time,
}

impl Task {
    /// Create a task, validating `computation_time`, `deadline` and `period`
    /// are all non-zero.  Deadlines are not required to equal the period.
    pub fn new(
        id: TaskId,
        offset: Time,
        computation_time: Time,
        deadline: Time,
        period: Time,
    ) -> Result<Self, TaskError> {
        if computation_time == 0 {
            return Err(TaskError::ZeroComputationTime { id });
        }
        if deadline == 0 {
            return Err(TaskError::ZeroDeadline { id });
        }
        if period == 0 {
            return Err(TaskError::ZeroPeriod { id });
        }
        Ok(Self {
            id,
            offset,
            computation_time,
            deadline,
            period,
        })
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn offset(&self) -> Time {
        self.offset
    }

    pub fn computation_time(&self) -> Time {
        self.computation_time
    }

    pub fn deadline(&self) -> Time {
        self.deadline
    }

    pub fn period(&self) -> Time {
        self.period
    }

    /// `C / T`.
    pub fn utilization(&self) -> f64 {
        self.computation_time as f64 / self.period as f64
    }

    /// `C / min(D, T)`.
    pub fn density(&self) -> f64 {
        self.computation_time as f64 / self.deadline.min(self.period) as f64
    }

    /// `D == T`.
    pub fn has_implicit_deadline(&self) -> bool {
        self.deadline == self.period
    }

    /// Returns `true` if a job is released at `t`: `t ≥ O` and `(t − O)` is a
    /// multiple of `T`.
    pub fn releases_at(&self, t: Time) -> bool {
        t >= self.offset && (t - self.offset) % self.period == 0
    }

    /// Release job number `job_id` at `t` if `t` is a release boundary.
    pub fn release_job(&self, t: Time, job_id: u32) -> Option<Job> {
        self.releases_at(t).then(|| Job::new(self, job_id, t))
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Task {}

impl Hash for Task {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (O={}, C={}, D={}, T={})",
            self.id, self.offset, self.computation_time, self.deadline, self.period
        )
    }
}

// ── Job ───────────────────────────────────────────────────────────────────────

/// One release of a task.
///
/// Holds the owning task's identifier (a back-reference, not ownership) and
/// the absolute deadline derived at release time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// 1-based sequence number within the owning task.
    job_id: u32,
    task: TaskId,
    release_time: Time,
    absolute_deadline: Time,
    remaining: Time,
}

impl Job {
    fn new(task: &Task, job_id: u32, release_time: Time) -> Self {
        Self {
            job_id,
            task: task.id,
            release_time,
            absolute_deadline: release_time.saturating_add(task.deadline),
            remaining: task.computation_time,
        }
    }

    pub fn job_id(&self) -> u32 {
        self.job_id
    }

    pub fn task(&self) -> TaskId {
        self.task
    }

    pub fn release_time(&self) -> Time {
        self.release_time
    }

    /// `release_time + D`.
    pub fn absolute_deadline(&self) -> Time {
        self.absolute_deadline
    }

    pub fn computation_time_remaining(&self) -> Time {
        self.remaining
    }

    /// `now` has passed the absolute deadline.
    pub fn deadline_missed(&self, now: Time) -> bool {
        now > self.absolute_deadline
    }

    /// Execute for `step` time units.
    pub fn execute(&mut self, step: Time) {
        self.remaining = self.remaining.saturating_sub(step);
    }

    pub fn is_finished(&self) -> bool {
        self.remaining == 0
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-J{}", self.task, self.job_id)
    }
}

// ── TaskSet ───────────────────────────────────────────────────────────────────

/// An ordered collection of tasks.
///
/// Order is not semantically significant: every algorithm imposes its own.
#[derive(Debug, Clone, Default)]
pub struct TaskSet {
    tasks: Vec<Task>,
}

impl TaskSet {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    /// Build a set from `(offset, computation_time, deadline, period)` tuples,
    /// assigning identifiers `1..=n` in order.
    pub fn from_params(params: &[(Time, Time, Time, Time)]) -> Result<Self, TaskError> {
        let mut builder = TaskSetBuilder::new();
        for &(o, c, d, t) in params {
            builder.push(o, c, d, t)?;
        }
        Ok(builder.build())
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }
}

impl FromIterator<Task> for TaskSet {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a TaskSet {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}

/// Hands out monotonically increasing task identifiers starting at 1.
#[derive(Debug)]
pub struct TaskSetBuilder {
    next_id: u32,
    tasks: Vec<Task>,
}

impl TaskSetBuilder {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            tasks: Vec::new(),
        }
    }

    /// Validate and append a task, returning the identifier it was given.
    ///
    /// On error the identifier is not consumed.
    pub fn push(
        &mut self,
        offset: Time,
        computation_time: Time,
        deadline: Time,
        period: Time,
    ) -> Result<TaskId, TaskError> {
        let id = TaskId(self.next_id);
        let task = Task::new(id, offset, computation_time, deadline, period)?;
        self.tasks.push(task);
        self.next_id += 1;
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn build(self) -> TaskSet {
        TaskSet::new(self.tasks)
    }
}

impl Default for TaskSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn task(id: u32, o: Time, c: Time, d: Time, t: Time) -> Task {
        Task::new(TaskId(id), o, c, d, t).unwrap()
    }

    // ── Task ──────────────────────────────────────────────────────────────────

    #[test]
    fn zero_parameters_are_rejected() {
        assert_eq!(
            Task::new(TaskId(1), 0, 0, 5, 5).unwrap_err(),
            TaskError::ZeroComputationTime { id: TaskId(1) }
        );
        assert_eq!(
            Task::new(TaskId(2), 0, 1, 0, 5).unwrap_err(),
            TaskError::ZeroDeadline { id: TaskId(2) }
        );
        assert_eq!(
            Task::new(TaskId(3), 0, 1, 5, 0).unwrap_err(),
            TaskError::ZeroPeriod { id: TaskId(3) }
        );
    }

    #[test]
    fn release_boundaries_respect_offset_and_period() {
        let t0 = task(1, 0, 2, 5, 10);
        let t1 = task(2, 1, 1, 3, 5);

        assert!(t0.release_job(0, 1).is_some());
        assert!(t0.release_job(10, 2).is_some());
        assert!(t0.release_job(5, 2).is_none());

        assert!(t1.release_job(0, 1).is_none(), "before the offset");
        assert!(t1.release_job(5, 1).is_none(), "not offset-aligned");
        assert!(t1.release_job(6, 1).is_some());
    }

    #[test]
    fn utilization_and_density() {
        let t = task(1, 0, 2, 4, 8);
        assert!((t.utilization() - 0.25).abs() < 1e-12);
        assert!((t.density() - 0.5).abs() < 1e-12);
        assert!(!t.has_implicit_deadline());
    }

    #[test]
    fn tasks_compare_by_identifier_only() {
        let a = task(7, 0, 1, 5, 5);
        let b = task(7, 3, 2, 9, 9);
        assert_eq!(a, b);

        let set: HashSet<Task> = [a, b, task(8, 0, 1, 5, 5)].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    // ── Job ───────────────────────────────────────────────────────────────────

    #[test]
    fn job_tracks_remaining_time_and_absolute_deadline() {
        let t = task(1, 2, 3, 4, 10);
        let mut job = t.release_job(12, 2).unwrap();

        assert_eq!(job.absolute_deadline(), 16);
        assert_eq!(job.computation_time_remaining(), 3);
        assert_eq!(job.to_string(), "T1-J2");

        job.execute(2);
        assert!(!job.is_finished());
        job.execute(2);
        assert!(job.is_finished(), "remaining time saturates at zero");
    }

    #[test]
    fn deadline_is_missed_strictly_after_absolute_deadline() {
        let t = task(1, 0, 1, 4, 4);
        let job = t.release_job(0, 1).unwrap();
        assert!(!job.deadline_missed(4));
        assert!(job.deadline_missed(5));
    }

    // ── TaskSet ───────────────────────────────────────────────────────────────

    #[test]
    fn from_params_assigns_sequential_ids() {
        let set = TaskSet::from_params(&[(0, 1, 3, 3), (0, 2, 4, 4)]).unwrap();
        let ids: Vec<TaskId> = set.iter().map(Task::id).collect();
        assert_eq!(ids, vec![TaskId(1), TaskId(2)]);
        assert_eq!(set.get(TaskId(2)).unwrap().computation_time(), 2);
    }

    #[test]
    fn builder_does_not_consume_ids_on_error() {
        let mut builder = TaskSetBuilder::new();
        assert_eq!(builder.push(0, 1, 5, 5).unwrap(), TaskId(1));
        assert!(builder.push(0, 1, 5, 0).is_err());
        assert_eq!(builder.push(0, 1, 5, 5).unwrap(), TaskId(2));
        assert_eq!(builder.build().len(), 2);
    }
}
