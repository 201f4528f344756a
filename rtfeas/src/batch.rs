/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Folder evaluation on a bounded worker pool.
//!
//! Every regular file under the folder is one task set.  Each is parsed and
//! evaluated on the blocking pool, at most `workers` at a time.  Uniprocessor
//! sets the algorithm does not schedule are evaluated again under the optimal
//! reference to tell infeasible sets from algorithm-specific failures.
//!
//! The evaluation and the cross-check each run under the per-set timeout.  A
//! cross-check that runs out only marks the reference verdict inconclusive;
//! the algorithm's own verdict is kept.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::{BatchConfig, Limits};
use crate::evaluate::{evaluate, Algorithm, EvaluationError, EvaluationOptions, FeasibilityResult};
use crate::parse::{parse_task_set, ParseError};
use crate::report::Tally;
use crate::task::TaskSet;
use crate::uniproc::UniAlgorithm;

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("cannot read folder '{}': {source}", path.display())]
    Folder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why one task set produced no result.
#[derive(Debug, Error)]
pub enum EntryFailure {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error("worker failed: {0}")]
    Worker(String),
}

#[derive(Debug)]
pub struct BatchEntry {
    pub path: PathBuf,
    pub outcome: Result<FeasibilityResult, EntryFailure>,
    /// Verdict of the optimal reference, for uniprocessor sets the algorithm
    /// did not schedule.
    pub optimal: Option<FeasibilityResult>,
}

impl BatchEntry {
    fn failed(path: PathBuf, failure: EntryFailure) -> Self {
        Self {
            path,
            outcome: Err(failure),
            optimal: None,
        }
    }
}

// ── Traversal ─────────────────────────────────────────────────────────────────

/// Every regular file below `root`, sorted.
///
/// # Errors
/// Returns [`BatchError::Folder`] if a directory cannot be listed.
pub fn collect_task_files(root: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = fs::read_dir(&dir).map_err(|source| BatchError::Folder {
            path: dir.clone(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| BatchError::Folder {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

// ── Evaluation ────────────────────────────────────────────────────────────────

/// Parse and evaluate `path` under `algorithm`.
fn evaluate_file(
    path: &Path,
    algorithm: &Algorithm,
    options: EvaluationOptions,
    limits: &Limits,
) -> Result<(TaskSet, FeasibilityResult), EntryFailure> {
    let task_set = parse_task_set(path).map_err(|e| {
        warn!(path = %path.display(), error = %e, "cannot parse task set");
        EntryFailure::from(e)
    })?;
    let result = evaluate(algorithm, &task_set, options, limits).map_err(|e| {
        warn!(path = %path.display(), error = %e, "cannot evaluate task set");
        EntryFailure::from(e)
    })?;
    Ok((task_set, result))
}

/// Optimal reference verdict for a uniprocessor set `result` rejects.
///
/// `None` when no cross-check applies; a failed reference evaluation counts
/// as inconclusive.
fn cross_check(
    algorithm: &Algorithm,
    task_set: &TaskSet,
    result: FeasibilityResult,
    options: EvaluationOptions,
    limits: &Limits,
) -> Option<FeasibilityResult> {
    let optimal = Algorithm::Uni(UniAlgorithm::OPTIMAL);
    match algorithm {
        Algorithm::Uni(a) if result.is_not_schedulable() => {
            if *a == UniAlgorithm::OPTIMAL {
                Some(result)
            } else {
                Some(
                    evaluate(&optimal, task_set, options, limits)
                        .unwrap_or_else(|_| FeasibilityResult::inconclusive_for(&optimal)),
                )
            }
        }
        _ => None,
    }
}

/// Parse, evaluate and cross-check `path` on the blocking pool, each stage
/// under its own `timeout`.
///
/// A timed-out stage leaves its blocking work running; `permit` is shared
/// with that work and returns to the pool only once all of it has ended.
async fn review_file_bounded(
    path: PathBuf,
    algorithm: Algorithm,
    options: EvaluationOptions,
    limits: Limits,
    timeout: Duration,
    permit: OwnedSemaphorePermit,
) -> BatchEntry {
    let permit = Arc::new(permit);

    let primary = {
        let (path, algorithm, limits) = (path.clone(), algorithm.clone(), limits.clone());
        let permit = Arc::clone(&permit);
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            evaluate_file(&path, &algorithm, options, &limits)
        })
    };
    let (task_set, result) = match tokio::time::timeout(timeout, primary).await {
        Ok(Ok(Ok(pair))) => pair,
        Ok(Ok(Err(failure))) => return BatchEntry::failed(path, failure),
        Ok(Err(e)) => return BatchEntry::failed(path, EntryFailure::Worker(e.to_string())),
        Err(_) => {
            warn!(path = %path.display(), ?timeout, "task set timed out");
            return BatchEntry {
                path,
                outcome: Ok(FeasibilityResult::inconclusive_for(&algorithm)),
                optimal: None,
            };
        }
    };

    let check = {
        let algorithm = algorithm.clone();
        let permit = Arc::clone(&permit);
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            cross_check(&algorithm, &task_set, result, options, &limits)
        })
    };
    let optimal = match tokio::time::timeout(timeout, check).await {
        Ok(Ok(optimal)) => optimal,
        Ok(Err(e)) => {
            warn!(path = %path.display(), error = %e, "cross-check worker failed");
            Some(FeasibilityResult::inconclusive_for(&Algorithm::Uni(UniAlgorithm::OPTIMAL)))
        }
        Err(_) => {
            warn!(path = %path.display(), ?timeout, "cross-check timed out");
            Some(FeasibilityResult::inconclusive_for(&Algorithm::Uni(UniAlgorithm::OPTIMAL)))
        }
    };

    debug!(path = %path.display(), code = result.code(), ?optimal, "task set reviewed");
    BatchEntry {
        path,
        outcome: Ok(result),
        optimal,
    }
}

/// Evaluate every task file under `root`; entries come back in path order.
///
/// # Errors
/// Returns [`BatchError::Folder`] if the folder cannot be traversed.
pub async fn review_folder(
    root: &Path,
    algorithm: &Algorithm,
    options: EvaluationOptions,
    limits: &Limits,
    batch: &BatchConfig,
) -> Result<Vec<BatchEntry>, BatchError> {
    let files = collect_task_files(root)?;
    info!(
        folder = %root.display(),
        files = files.len(),
        workers = batch.workers,
        algorithm = %algorithm,
        "batch start"
    );

    let semaphore = Arc::new(Semaphore::new(batch.workers.max(1)));
    let timeout = batch.task_set_timeout();
    let mut jobs = JoinSet::new();

    for (index, path) in files.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let algorithm = algorithm.clone();
        let limits = limits.clone();

        jobs.spawn(async move {
            let Ok(permit) = semaphore.acquire_owned().await else {
                let failure = EntryFailure::Worker("worker pool closed".into());
                return (index, BatchEntry::failed(path, failure));
            };
            let entry =
                review_file_bounded(path, algorithm, options, limits, timeout, permit).await;
            (index, entry)
        });
    }

    let mut results: Vec<(usize, BatchEntry)> = Vec::with_capacity(jobs.len());
    while let Some(joined) = jobs.join_next().await {
        match joined {
            Ok(pair) => results.push(pair),
            Err(e) => warn!(error = %e, "batch job aborted"),
        }
    }
    results.sort_by_key(|(index, _)| *index);

    info!(task_sets = results.len(), "batch complete");
    Ok(results.into_iter().map(|(_, entry)| entry).collect())
}

/// Fold batch entries into a [`Tally`].
pub fn tally(algorithm: &Algorithm, entries: &[BatchEntry]) -> Tally {
    let mut tally = Tally::new(algorithm);
    for entry in entries {
        match &entry.outcome {
            Ok(result) => {
                tally.record(*result);
                if let Some(optimal) = entry.optimal {
                    tally.record_optimal(optimal);
                }
            }
            Err(_) => tally.record_failure(),
        }
    }
    tally
}

// ── Tests ─────────────────────────────────────────────────────────────────────
