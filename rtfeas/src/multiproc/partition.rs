/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Bin-packing of tasks into clusters.
//!
//! Tasks are visited in utilisation order (increasing or decreasing, ties by
//! identifier) and each one is placed by the configured [`Heuristic`]:
//!
//! | Heuristic | Chosen cluster among those that fit |
//! |-----------|-------------------------------------|
//! | First-Fit | the first, in cluster order |
//! | Next-Fit  | the first, scanning from the cluster after the last one used |
//! | Best-Fit  | the one with the least utilisation so far |
//! | Worst-Fit | the one with the most utilisation so far |
//!
//! A task that fits nowhere ends the partitioning with a [`PlacementFailure`].

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use super::cluster::Cluster;
use super::error::{ConfigError, PlacementFailure};
use crate::task::Task;

// ── Selectors ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Heuristic {
    FirstFit,
    NextFit,
    BestFit,
    WorstFit,
}

impl Heuristic {
    pub const ALL: [Heuristic; 4] = [
        Heuristic::FirstFit,
        Heuristic::NextFit,
        Heuristic::BestFit,
        Heuristic::WorstFit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Heuristic::FirstFit => "ff",
            Heuristic::NextFit => "nf",
            Heuristic::BestFit => "bf",
            Heuristic::WorstFit => "wf",
        }
    }
}

impl fmt::Display for Heuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Heuristic {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Heuristic::ALL
            .into_iter()
            .find(|h| h.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownHeuristic(s.to_string()))
    }
}

/// Order in which tasks are offered to the heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    IncreasingUtilization,
    #[default]
    DecreasingUtilization,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::IncreasingUtilization => "iu",
            SortOrder::DecreasingUtilization => "du",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "iu" => Ok(SortOrder::IncreasingUtilization),
            "du" => Ok(SortOrder::DecreasingUtilization),
            _ => Err(ConfigError::UnknownSortOrder(s.to_string())),
        }
    }
}

// ── Partitioner ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partitioner {
    heuristic: Heuristic,
    order: SortOrder,
}

impl Partitioner {
    pub fn new(heuristic: Heuristic, order: SortOrder) -> Self {
        Self { heuristic, order }
    }

    pub fn heuristic(&self) -> Heuristic {
        self.heuristic
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    /// Place every task of `tasks` into one of `clusters`.
    ///
    /// Clusters keep their order; empty ones are left in place.
    pub fn partition(
        &self,
        tasks: &[Task],
        mut clusters: Vec<Cluster>,
    ) -> Result<Vec<Cluster>, PlacementFailure> {
        let mut last_used: Option<usize> = None;

        for task in self.sorted(tasks) {
            let chosen = match self.heuristic {
                Heuristic::FirstFit => first_fit(task, &clusters),
                Heuristic::NextFit => next_fit(task, &clusters, last_used),
                Heuristic::BestFit => best_fit(task, &clusters),
                Heuristic::WorstFit => worst_fit(task, &clusters),
            };

            let Some(index) = chosen else {
                let failure = PlacementFailure {
                    task: task.id(),
                    utilization: task.utilization(),
                    largest_spare: clusters
                        .iter()
                        .map(Cluster::spare_capacity)
                        .fold(0.0, f64::max),
                };
                debug!(
                    heuristic = %self.heuristic,
                    task = %task.id(),
                    utilization = failure.utilization,
                    "task fits no cluster"
                );
                return Err(failure);
            };

            clusters[index].push_task(task.clone());
            last_used = Some(index);
            debug!(
                heuristic = %self.heuristic,
                task = %task.id(),
                cluster = clusters[index].id(),
                cluster_utilization = clusters[index].utilization(),
                "task placed"
            );
        }

        Ok(clusters)
    }

    fn sorted<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        let mut sorted: Vec<&Task> = tasks.iter().collect();
        sorted.sort_by(|a, b| {
            let by_util = a.utilization().total_cmp(&b.utilization());
            let by_util = match self.order {
                SortOrder::IncreasingUtilization => by_util,
                SortOrder::DecreasingUtilization => by_util.reverse(),
            };
            by_util.then(a.id().cmp(&b.id()))
        });
        sorted
    }
}

// ── Heuristics ────────────────────────────────────────────────────────────────

fn first_fit(task: &Task, clusters: &[Cluster]) -> Option<usize> {
    clusters.iter().position(|c| c.can_fit(task))
}

fn next_fit(task: &Task, clusters: &[Cluster], last_used: Option<usize>) -> Option<usize> {
    let n = clusters.len();
    let start = last_used.map_or(0, |i| (i + 1) % n.max(1));
    (0..n)
        .map(|offset| (start + offset) % n)
        .find(|&i| clusters[i].can_fit(task))
}

fn best_fit(task: &Task, clusters: &[Cluster]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, cluster) in clusters.iter().enumerate() {
        if !cluster.can_fit(task) {
            continue;
        }
        let u = cluster.utilization();
        if best.map_or(true, |(_, best_u)| u < best_u) {
            best = Some((i, u));
        }
    }
    best.map(|(i, _)| i)
}

fn worst_fit(task: &Task, clusters: &[Cluster]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, cluster) in clusters.iter().enumerate() {
        if !cluster.can_fit(task) {
            continue;
        }
        let u = cluster.utilization();
        if best.map_or(true, |(_, best_u)| u > best_u) {
            best = Some((i, u));
        }
    }
    best.map(|(i, _)| i)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
