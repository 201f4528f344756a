/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Single entry point over both engines.
//!
//! [`evaluate`] takes an [`Algorithm`] (a uniprocessor policy or a validated
//! multiprocessor configuration), one task set and the per-run options, and
//! returns a [`FeasibilityResult`] whose numeric [`code`](FeasibilityResult::code)
//! is the process exit status.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::config::Limits;
use crate::multiproc::{ConfigError, EdfK, MultiConfig, MultiFeasibility};
use crate::task::TaskSet;
use crate::uniproc::{UniAlgorithm, UniFeasibility, UniprocessorScheduler};

/// Exit code for a task set that could not be parsed or evaluated.
pub const COULD_NOT_EVALUATE: u8 = 5;

// ── Inputs ────────────────────────────────────────────────────────────────────

/// Per-run switches shared by both engines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationOptions {
    /// Trace every simulation cycle.
    pub verbose: bool,
    /// Skip every analytic shortcut that would decide the verdict.
    pub force_simulation: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Algorithm {
    Uni(UniAlgorithm),
    Multi(MultiConfig),
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Uni(a) => write!(f, "{a}"),
            Algorithm::Multi(c) => write!(f, "{c}"),
        }
    }
}

// ── Result ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum FeasibilityResult {
    Uni(UniFeasibility),
    Multi(MultiFeasibility),
}

impl FeasibilityResult {
    pub fn code(self) -> u8 {
        match self {
            FeasibilityResult::Uni(r) => r.code(),
            FeasibilityResult::Multi(r) => r.code(),
        }
    }

    pub fn is_schedulable(self) -> bool {
        match self {
            FeasibilityResult::Uni(r) => r.is_schedulable(),
            FeasibilityResult::Multi(r) => r.is_schedulable(),
        }
    }

    pub fn is_not_schedulable(self) -> bool {
        match self {
            FeasibilityResult::Uni(r) => r.is_not_schedulable(),
            FeasibilityResult::Multi(r) => r.is_not_schedulable(),
        }
    }

    /// Neither verdict was reached.
    pub fn is_inconclusive(self) -> bool {
        !self.is_schedulable() && !self.is_not_schedulable()
    }

    /// The "timed out" / "cannot tell" variant of the engine behind
    /// `algorithm`.
    pub fn inconclusive_for(algorithm: &Algorithm) -> Self {
        match algorithm {
            Algorithm::Uni(_) => FeasibilityResult::Uni(UniFeasibility::TimedOut),
            Algorithm::Multi(_) => FeasibilityResult::Multi(MultiFeasibility::CannotTell),
        }
    }
}

impl fmt::Display for FeasibilityResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeasibilityResult::Uni(r) => write!(f, "{r}"),
            FeasibilityResult::Multi(r) => write!(f, "{r}"),
        }
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("task set is empty")]
    EmptyTaskSet,

    #[error("invalid multiprocessor configuration: {0}")]
    Config(#[from] ConfigError),
}

impl EvaluationError {
    pub fn code(&self) -> u8 {
        COULD_NOT_EVALUATE
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Decide whether `algorithm` schedules `task_set`.
///
/// # Errors
/// [`EvaluationError::EmptyTaskSet`] when there is nothing to evaluate.
pub fn evaluate(
    algorithm: &Algorithm,
    task_set: &TaskSet,
    options: EvaluationOptions,
    limits: &Limits,
) -> Result<FeasibilityResult, EvaluationError> {
    if task_set.is_empty() {
        return Err(EvaluationError::EmptyTaskSet);
    }
    let result = match algorithm {
        Algorithm::Uni(a) => FeasibilityResult::Uni(
            UniprocessorScheduler::new(task_set, options, limits).is_feasible(*a),
        ),
        Algorithm::Multi(config) => {
            FeasibilityResult::Multi(EdfK::new(task_set, config, options, limits).is_feasible())
        }
    };
    Ok(result)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multiproc::partition::SortOrder;
    use crate::multiproc::MultiMode;

    #[test]
    fn empty_set_cannot_be_evaluated() {
        let err = evaluate(
            &Algorithm::Uni(UniAlgorithm::EarliestDeadlineFirst),
            &TaskSet::default(),
            EvaluationOptions::default(),
            &Limits::default(),
        )
        .unwrap_err();
        assert_eq!(err, EvaluationError::EmptyTaskSet);
        assert_eq!(err.code(), COULD_NOT_EVALUATE);
    }

    #[test]
    fn both_engines_are_reachable() {
        let ts = TaskSet::from_params(&[(0, 1, 3, 3), (0, 2, 4, 4)]).unwrap();
        let limits = Limits::default();

        let uni = evaluate(
            &Algorithm::Uni(UniAlgorithm::EarliestDeadlineFirst),
            &ts,
            EvaluationOptions::default(),
            &limits,
        )
        .unwrap();
        assert_eq!(uni, FeasibilityResult::Uni(UniFeasibility::SchedulableViaShortcut));
        assert_eq!(uni.code(), 1);

        let config =
            MultiConfig::new(2, MultiMode::Global, None, SortOrder::DecreasingUtilization).unwrap();
        let multi = evaluate(
            &Algorithm::Multi(config),
            &ts,
            EvaluationOptions {
                verbose: false,
                force_simulation: true,
            },
            &limits,
        )
        .unwrap();
        assert_eq!(multi, FeasibilityResult::Multi(MultiFeasibility::SchedulableSimulation));
        assert!(multi.is_schedulable());
        assert!(!multi.is_inconclusive());
    }

    #[test]
    fn inconclusive_variant_follows_the_engine() {
        let uni = FeasibilityResult::inconclusive_for(&Algorithm::Uni(UniAlgorithm::RoundRobin));
        assert_eq!(uni.code(), 4);
        assert!(uni.is_inconclusive());

        let config = MultiConfig::new(1, MultiMode::Global, None, SortOrder::default()).unwrap();
        let multi = FeasibilityResult::inconclusive_for(&Algorithm::Multi(config));
        assert_eq!(multi, FeasibilityResult::Multi(MultiFeasibility::CannotTell));
    }
}
