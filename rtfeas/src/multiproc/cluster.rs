/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! A fixed group of identical processors and the tasks pinned to it.

use crate::analysis::UTILIZATION_EPSILON;
use crate::task::Task;
use crate::timing::{density, utilization};

#[derive(Debug, Clone)]
pub struct Cluster {
    id: usize,
    processors: usize,
    tasks: Vec<Task>,
}

impl Cluster {
    pub fn new(id: usize, processors: usize) -> Self {
        Self {
            id,
            processors,
            tasks: Vec::new(),
        }
    }

    /// Split `processors` into `count` clusters.  The first
    /// `processors % count` clusters get one processor more than the rest.
    ///
    /// `count` must be in `1..=processors`.
    pub fn split(processors: usize, count: usize) -> Vec<Cluster> {
        if count == 0 {
            return Vec::new();
        }
        let base = processors / count;
        let remainder = processors % count;
        (0..count)
            .map(|id| Cluster::new(id, base + usize::from(id < remainder)))
            .collect()
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn processors(&self) -> usize {
        self.processors
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn utilization(&self) -> f64 {
        utilization(&self.tasks)
    }

    pub fn density(&self) -> f64 {
        density(&self.tasks)
    }

    /// `processors − U`.
    pub fn spare_capacity(&self) -> f64 {
        self.processors as f64 - self.utilization()
    }

    /// Largest single-task utilisation (`0.0` when empty).
    pub fn max_utilization(&self) -> f64 {
        self.tasks.iter().map(Task::utilization).fold(0.0, f64::max)
    }

    /// Largest single-task density (`0.0` when empty).
    pub fn max_density(&self) -> f64 {
        self.tasks.iter().map(Task::density).fold(0.0, f64::max)
    }

    /// `task` fits if it can run on one processor on its own and the total
    /// utilisation stays within the processor count.
    pub fn can_fit(&self, task: &Task) -> bool {
        let u = task.utilization();
        u <= 1.0 + UTILIZATION_EPSILON
            && self.utilization() + u <= self.processors as f64 + UTILIZATION_EPSILON
    }

    /// Add `task` if it fits; returns whether it was added.
    pub fn add_task(&mut self, task: Task) -> bool {
        if !self.can_fit(&task) {
            return false;
        }
        self.push_task(task);
        true
    }

    /// Append `task` without checking capacity; callers have already
    /// established [`can_fit`](Self::can_fit).
    pub(super) fn push_task(&mut self, task: Task) {
        self.tasks.push(task);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskSet;

    #[test]
    fn split_gives_the_remainder_to_the_first_clusters() {
        let sizes: Vec<usize> = Cluster::split(7, 3).iter().map(Cluster::processors).collect();
        assert_eq!(sizes, vec![3, 2, 2]);

        let sizes: Vec<usize> = Cluster::split(4, 4).iter().map(Cluster::processors).collect();
        assert_eq!(sizes, vec![1, 1, 1, 1]);

        assert_eq!(Cluster::split(4, 1)[0].processors(), 4);
        assert!(Cluster::split(4, 0).is_empty());
    }

    #[test]
    fn capacity_is_enforced_on_add() {
        let ts = TaskSet::from_params(&[(0, 3, 4, 4), (0, 1, 2, 2), (0, 1, 4, 4)]).unwrap();
        let mut cluster = Cluster::new(0, 1);

        assert!(cluster.add_task(ts.tasks()[0].clone()));
        assert!(!cluster.add_task(ts.tasks()[1].clone()), "0.75 + 0.5 > 1");
        assert!(cluster.add_task(ts.tasks()[2].clone()), "0.75 + 0.25 = 1");
        assert_eq!(cluster.tasks().len(), 2);
        assert!((cluster.spare_capacity()).abs() < 1e-12);
        assert!((cluster.max_utilization() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn push_task_appends_after_the_caller_checked_capacity() {
        let ts = TaskSet::from_params(&[(0, 1, 2, 2), (0, 1, 4, 4)]).unwrap();
        let mut cluster = Cluster::new(0, 1);
        for task in ts.tasks() {
            assert!(cluster.can_fit(task));
            cluster.push_task(task.clone());
        }
        assert_eq!(cluster.tasks().len(), 2);
        assert!((cluster.utilization() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn a_task_heavier_than_one_processor_never_fits() {
        let ts = TaskSet::from_params(&[(0, 5, 4, 4)]).unwrap();
        let cluster = Cluster::new(0, 8);
        assert!(!cluster.can_fit(&ts.tasks()[0]));
    }
}
