/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Multiprocessor feasibility engine: EDF over `k` clusters of processors.
//!
//! ```text
//! k = 1      Global EDF        one cluster, full migration
//! 1 < k < m  EDF(k)            migration inside a cluster only
//! k = m      Partitioned EDF   one processor per cluster, no migration
//! ```
//!
//! [`EdfK::new`] splits the processors, places the tasks ([`partition`]) and
//! drops clusters left empty.  [`EdfK::is_feasible`] then runs, in order:
//!
//! 1. placement failure (always decisive),
//! 2. density conditions,
//! 3. utilisation bound per cluster (sufficient),
//! 4. `m_min` (Global EDF only),
//! 5. processor demand per synchronous cluster,
//! 6. simulation of every cluster.
//!
//! With `force_simulation` only steps 1 and 6 run.

pub mod cluster;
pub mod error;
pub mod partition;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, info};

use crate::analysis::{demand_horizon, first_demand_overflow, UTILIZATION_EPSILON};
use crate::config::Limits;
use crate::evaluate::EvaluationOptions;
use crate::sim::{simulate, SimOutcome};
use crate::task::{Task, TaskSet};
use crate::timing::{density, is_synchronous, utilization};
use crate::uniproc::policy::EarliestDeadlineFirst;
use cluster::Cluster;
pub use error::{ConfigError, PlacementFailure};
use partition::{Heuristic, Partitioner, SortOrder};

// ── Configuration ─────────────────────────────────────────────────────────────

/// Mode keyword of the command line: `global`, `partitioned` or a cluster
/// count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiMode {
    Global,
    Partitioned,
    Clustered(usize),
}

impl fmt::Display for MultiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MultiMode::Global => f.write_str("global"),
            MultiMode::Partitioned => f.write_str("partitioned"),
            MultiMode::Clustered(k) => write!(f, "{k}"),
        }
    }
}

impl FromStr for MultiMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "global" => Ok(MultiMode::Global),
            "partitioned" => Ok(MultiMode::Partitioned),
            other => match other.parse::<usize>() {
                Ok(0) => Err(ConfigError::NoClusters),
                Ok(k) => Ok(MultiMode::Clustered(k)),
                Err(_) => Err(ConfigError::UnknownMode(s.to_string())),
            },
        }
    }
}

/// Which family of conditions applies, decided by the effective cluster
/// count alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterKind {
    Global,
    Hybrid,
    Partitioned,
}

/// A validated processor / cluster / heuristic combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiConfig {
    processors: usize,
    clusters: usize,
    partitioner: Option<Partitioner>,
}

impl MultiConfig {
    /// Validate the combination.
    ///
    /// # Errors
    /// - [`ConfigError::NoProcessors`] if `processors == 0`
    /// - [`ConfigError::TooManyClusters`] if `k > processors`
    /// - [`ConfigError::MissingHeuristic`] if `k > 1` and no heuristic is given
    pub fn new(
        processors: usize,
        mode: MultiMode,
        heuristic: Option<Heuristic>,
        order: SortOrder,
    ) -> Result<Self, ConfigError> {
        if processors == 0 {
            return Err(ConfigError::NoProcessors);
        }
        let clusters = match mode {
            MultiMode::Global => 1,
            MultiMode::Partitioned => processors,
            MultiMode::Clustered(0) => return Err(ConfigError::NoClusters),
            MultiMode::Clustered(k) => k,
        };
        if clusters > processors {
            return Err(ConfigError::TooManyClusters {
                clusters,
                processors,
            });
        }

        let partitioner = match (clusters, heuristic) {
            (1, _) => None,
            (_, Some(h)) => Some(Partitioner::new(h, order)),
            (_, None) => return Err(ConfigError::MissingHeuristic { clusters }),
        };

        Ok(Self {
            processors,
            clusters,
            partitioner,
        })
    }

    pub fn processors(&self) -> usize {
        self.processors
    }

    /// Effective cluster count `k`.
    pub fn clusters(&self) -> usize {
        self.clusters
    }

    pub fn partitioner(&self) -> Option<Partitioner> {
        self.partitioner
    }

    pub fn kind(&self) -> ClusterKind {
        if self.clusters == 1 {
            ClusterKind::Global
        } else if self.clusters == self.processors {
            ClusterKind::Partitioned
        } else {
            ClusterKind::Hybrid
        }
    }

    /// Continuous `m / k`.
    pub fn processors_per_cluster(&self) -> f64 {
        self.processors as f64 / self.clusters as f64
    }
}

impl fmt::Display for MultiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EDF(k={}) on m={}", self.clusters, self.processors)?;
        if let Some(p) = self.partitioner {
            write!(f, " [{}/{}]", p.heuristic(), p.order())?;
        }
        Ok(())
    }
}

// ── Result ────────────────────────────────────────────────────────────────────

/// Multiprocessor verdict.  The discriminant is the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiFeasibility {
    SchedulableSimulation = 0,
    SchedulableShortcut = 1,
    NotSchedulableSimulation = 2,
    NotSchedulableShortcut = 3,
    CannotTell = 4,
}

impl MultiFeasibility {
    pub const ALL: [MultiFeasibility; 5] = [
        MultiFeasibility::SchedulableSimulation,
        MultiFeasibility::SchedulableShortcut,
        MultiFeasibility::NotSchedulableSimulation,
        MultiFeasibility::NotSchedulableShortcut,
        MultiFeasibility::CannotTell,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_schedulable(self) -> bool {
        matches!(
            self,
            MultiFeasibility::SchedulableSimulation | MultiFeasibility::SchedulableShortcut
        )
    }

    pub fn is_not_schedulable(self) -> bool {
        matches!(
            self,
            MultiFeasibility::NotSchedulableSimulation | MultiFeasibility::NotSchedulableShortcut
        )
    }
}

impl fmt::Display for MultiFeasibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MultiFeasibility::SchedulableSimulation => "schedulable (had to simulate)",
            MultiFeasibility::SchedulableShortcut => "schedulable (sufficient condition holds)",
            MultiFeasibility::NotSchedulableSimulation => "not schedulable (had to simulate)",
            MultiFeasibility::NotSchedulableShortcut => {
                "not schedulable (necessary condition does not hold)"
            }
            MultiFeasibility::CannotTell => "cannot tell",
        };
        f.write_str(text)
    }
}

// ── m_min ─────────────────────────────────────────────────────────────────────

/// Smallest processor count for which the Global-EDF condition over tasks
/// sorted by decreasing utilisation holds:
/// `min over k of (k − 1) + U(τ^(k+1)) / (1 − U_k)`.
///
/// Terms whose `U_k ≥ 1` are skipped; `f64::INFINITY` if every term is.
pub fn m_min(tasks: &[Task]) -> f64 {
    let mut utilizations: Vec<f64> = tasks.iter().map(Task::utilization).collect();
    utilizations.sort_by(|a, b| b.total_cmp(a));

    let mut remaining: f64 = utilizations.iter().sum();
    let mut best = f64::INFINITY;
    for (i, &u_k) in utilizations.iter().enumerate() {
        remaining -= u_k;
        if u_k >= 1.0 {
            continue;
        }
        let candidate = i as f64 + remaining.max(0.0) / (1.0 - u_k);
        best = best.min(candidate);
    }
    best
}

// ── Engine ────────────────────────────────────────────────────────────────────

/// One EDF(k) feasibility determination over one task set.
#[derive(Debug)]
pub struct EdfK<'a> {
    task_set: &'a TaskSet,
    config: &'a MultiConfig,
    options: EvaluationOptions,
    limits: &'a Limits,
    placement: Result<Vec<Cluster>, PlacementFailure>,
}

impl<'a> EdfK<'a> {
    /// Split the processors into clusters and place the tasks.
    pub fn new(
        task_set: &'a TaskSet,
        config: &'a MultiConfig,
        options: EvaluationOptions,
        limits: &'a Limits,
    ) -> Self {
        let clusters = Cluster::split(config.processors(), config.clusters());
        let placement = match config.partitioner() {
            Some(partitioner) => partitioner.partition(task_set.tasks(), clusters),
            None => fit_single_cluster(task_set.tasks(), clusters),
        }
        .map(|clusters| {
            let before = clusters.len();
            let kept: Vec<Cluster> = clusters.into_iter().filter(|c| !c.is_empty()).collect();
            if kept.len() < before {
                debug!(dropped = before - kept.len(), "empty clusters removed");
            }
            kept
        });

        Self {
            task_set,
            config,
            options,
            limits,
            placement,
        }
    }

    /// Clusters after placement, or why placement failed.
    pub fn placement(&self) -> Result<&[Cluster], &PlacementFailure> {
        self.placement.as_deref()
    }

    pub fn is_feasible(&self) -> MultiFeasibility {
        debug!(
            config = %self.config,
            tasks = self.task_set.len(),
            utilization = utilization(self.task_set.tasks()),
            force_simulation = self.options.force_simulation,
            "multiprocessor evaluation"
        );

        let result = match &self.placement {
            Err(failure) => {
                info!(config = %self.config, %failure, "partitioning failed");
                MultiFeasibility::NotSchedulableShortcut
            }
            Ok(clusters) => self.decide(clusters),
        };
        info!(config = %self.config, code = result.code(), "{result}");
        result
    }

    fn decide(&self, clusters: &[Cluster]) -> MultiFeasibility {
        if !self.options.force_simulation {
            if !self.density_holds(clusters) {
                return MultiFeasibility::NotSchedulableShortcut;
            }
            if self.utilization_bound_holds(clusters) {
                return MultiFeasibility::SchedulableShortcut;
            }
            if self.config.kind() == ClusterKind::Global {
                let needed = m_min(self.task_set.tasks());
                if needed > self.config.processors() as f64 + UTILIZATION_EPSILON {
                    debug!(m_min = needed, m = self.config.processors(), "m_min exceeds m");
                    return MultiFeasibility::NotSchedulableShortcut;
                }
            }
            if self.demand_overflows(clusters) {
                return MultiFeasibility::NotSchedulableShortcut;
            }
        }
        self.simulate_clusters(clusters)
    }

    /// Necessary conditions on densities (and utilisations for partitioned).
    fn density_holds(&self, clusters: &[Cluster]) -> bool {
        let tasks = self.task_set.tasks();
        if let Some(task) = tasks
            .iter()
            .find(|t| t.density() > 1.0 + UTILIZATION_EPSILON)
        {
            debug!(task = %task.id(), density = task.density(), "task denser than one processor");
            return false;
        }

        match self.config.kind() {
            ClusterKind::Global => {
                let total = density(tasks);
                let m = self.config.processors() as f64;
                if total > m + UTILIZATION_EPSILON {
                    debug!(density = total, m, "total density exceeds processor count");
                    return false;
                }
            }
            ClusterKind::Hybrid => {
                if let Some(c) = clusters
                    .iter()
                    .find(|c| c.density() > c.processors() as f64 + UTILIZATION_EPSILON)
                {
                    debug!(
                        cluster = c.id(),
                        density = c.density(),
                        processors = c.processors(),
                        "cluster density exceeds its processors"
                    );
                    return false;
                }
            }
            ClusterKind::Partitioned => {
                if let Some(c) = clusters
                    .iter()
                    .find(|c| c.utilization() > 1.0 + UTILIZATION_EPSILON)
                {
                    debug!(cluster = c.id(), utilization = c.utilization(), "cluster above U = 1");
                    return false;
                }
            }
        }
        true
    }

    /// `U ≤ p − (p − 1)·max U` for every cluster, with `p` the continuous
    /// `m / k` clamped to the cluster's own processor count.  Densities
    /// replace utilisations in clusters holding a constrained deadline.
    fn utilization_bound_holds(&self, clusters: &[Cluster]) -> bool {
        let per_cluster = self.config.processors_per_cluster();
        clusters.iter().all(|c| {
            let p = per_cluster.min(c.processors() as f64);
            let implicit = c.tasks().iter().all(Task::has_implicit_deadline);
            let (load, heaviest) = if implicit {
                (c.utilization(), c.max_utilization())
            } else {
                (c.density(), c.max_density())
            };
            let bound = p - (p - 1.0) * heaviest;
            let holds = load <= bound + UTILIZATION_EPSILON;
            debug!(cluster = c.id(), load, bound, implicit, holds, "utilisation bound");
            holds
        })
    }

    fn demand_overflows(&self, clusters: &[Cluster]) -> bool {
        clusters
            .iter()
            .filter(|c| is_synchronous(c.tasks()))
            .any(|c| {
                let Ok(horizon) = demand_horizon(c.tasks()) else {
                    return false;
                };
                first_demand_overflow(c.tasks(), c.processors(), horizon, self.limits.dbf_max_points)
                    .inspect(|&at| debug!(cluster = c.id(), at, "cluster demand overflow"))
                    .is_some()
            })
    }

    /// Clusters run one after another; the first miss or timeout decides.
    fn simulate_clusters(&self, clusters: &[Cluster]) -> MultiFeasibility {
        for c in clusters {
            let outcome = simulate(
                c.tasks(),
                &mut EarliestDeadlineFirst::clustered(),
                c.processors(),
                self.limits,
                self.options.verbose,
            );
            match outcome {
                SimOutcome::Schedulable => {
                    debug!(cluster = c.id(), "cluster schedulable");
                }
                SimOutcome::DeadlineMiss { task, job, .. } => {
                    debug!(cluster = c.id(), %task, job, "cluster misses a deadline");
                    return MultiFeasibility::NotSchedulableSimulation;
                }
                SimOutcome::TimedOut(cause) => {
                    info!(cluster = c.id(), %cause, "cluster simulation inconclusive");
                    return MultiFeasibility::CannotTell;
                }
            }
        }
        MultiFeasibility::SchedulableSimulation
    }
}

/// Global case: every task goes into the one cluster if it fits.
fn fit_single_cluster(
    tasks: &[Task],
    mut clusters: Vec<Cluster>,
) -> Result<Vec<Cluster>, PlacementFailure> {
    if let Some(cluster) = clusters.first_mut() {
        for task in tasks {
            if !cluster.add_task(task.clone()) {
                return Err(PlacementFailure {
                    task: task.id(),
                    utilization: task.utilization(),
                    largest_spare: cluster.spare_capacity(),
                });
            }
        }
    }
    Ok(clusters)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
