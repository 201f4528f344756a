/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for the multiprocessor engine.
//!
//! * [`PlacementFailure`]: why partitioning could not place a task (a
//!   verdict, not an error; it ends the evaluation as "not schedulable").
//! * [`ConfigError`]: a processor / cluster / heuristic combination that
//!   cannot be evaluated at all, rejected before any analysis runs.

use thiserror::Error;

use crate::task::TaskId;

// ── Placement ─────────────────────────────────────────────────────────────────

/// A task that fits no cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementFailure {
    pub task: TaskId,
    pub utilization: f64,
    /// Spare capacity (`processors − U`) of the emptiest cluster when the
    /// task was tried.
    pub largest_spare: f64,
}

impl std::fmt::Display for PlacementFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "task {} needs {:.3} processors but the roomiest cluster has {:.3} left",
            self.task, self.utilization, self.largest_spare
        )
    }
}

// ── Configuration ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("processor count must be at least 1")]
    NoProcessors,

    #[error("cluster count must be at least 1")]
    NoClusters,

    #[error("cluster count {clusters} exceeds processor count {processors}")]
    TooManyClusters { clusters: usize, processors: usize },

    /// Partitioned EDF and EDF(k) with `k > 1` need a bin-packing heuristic.
    #[error("{clusters} clusters need a partitioning heuristic (-H ff|nf|bf|wf)")]
    MissingHeuristic { clusters: usize },

    #[error("unknown mode '{0}' (expected global, partitioned or a cluster count)")]
    UnknownMode(String),

    #[error("unknown partitioning heuristic '{0}' (expected ff, nf, bf or wf)")]
    UnknownHeuristic(String),

    #[error("unknown sort order '{0}' (expected iu or du)")]
    UnknownSortOrder(String),
}
