/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Aggregate counts over a batch of task sets.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::evaluate::{Algorithm, FeasibilityResult};

/// Result counts for one algorithm over one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tally {
    algorithm: String,
    counts: BTreeMap<FeasibilityResult, usize>,
    could_not_evaluate: usize,
    /// Not schedulable by the algorithm nor by the optimal reference.
    infeasible: usize,
    schedulable_by_optimal_not_by_algorithm: usize,
    /// The optimal reference did not reach a verdict either.
    optimal_inconclusive: usize,
}

impl Tally {
    pub fn new(algorithm: &Algorithm) -> Self {
        Self {
            algorithm: algorithm.to_string(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, result: FeasibilityResult) {
        *self.counts.entry(result).or_insert(0) += 1;
    }

    /// A task set that could not be parsed or evaluated.
    pub fn record_failure(&mut self) {
        self.could_not_evaluate += 1;
    }

    /// Classify a set the algorithm rejected by what the optimal reference
    /// says about it.
    pub fn record_optimal(&mut self, optimal: FeasibilityResult) {
        if optimal.is_schedulable() {
            self.schedulable_by_optimal_not_by_algorithm += 1;
        } else if optimal.is_not_schedulable() {
            self.infeasible += 1;
        } else {
            self.optimal_inconclusive += 1;
        }
    }

    pub fn count(&self, result: FeasibilityResult) -> usize {
        self.counts.get(&result).copied().unwrap_or(0)
    }

    pub fn could_not_evaluate(&self) -> usize {
        self.could_not_evaluate
    }

    pub fn infeasible(&self) -> usize {
        self.infeasible
    }

    pub fn schedulable_by_optimal_not_by_algorithm(&self) -> usize {
        self.schedulable_by_optimal_not_by_algorithm
    }

    pub fn optimal_inconclusive(&self) -> usize {
        self.optimal_inconclusive
    }

    /// Every task set seen, evaluated or not.
    pub fn total(&self) -> usize {
        self.counts.values().sum::<usize>() + self.could_not_evaluate
    }

    /// `schedulable / (schedulable + not schedulable)`; inconclusive results
    /// and failures are left out.  `0.0` when nothing was decided.
    pub fn success_rate(&self) -> f64 {
        let (yes, no) = self
            .counts
            .iter()
            .fold((0, 0), |(yes, no), (result, &n)| {
                if result.is_schedulable() {
                    (yes + n, no)
                } else if result.is_not_schedulable() {
                    (yes, no + n)
                } else {
                    (yes, no)
                }
            });
        if yes + no == 0 {
            0.0
        } else {
            yes as f64 / (yes + no) as f64
        }
    }

    pub fn summary(&self) -> Summary<'_> {
        Summary {
            algorithm: &self.algorithm,
            total: self.total(),
            results: &self.counts,
            could_not_evaluate: self.could_not_evaluate,
            infeasible: self.infeasible,
            schedulable_by_optimal_not_by_algorithm: self.schedulable_by_optimal_not_by_algorithm,
            optimal_inconclusive: self.optimal_inconclusive,
            success_rate: self.success_rate(),
        }
    }

    /// YAML rendering of [`summary`](Self::summary).
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.summary())
    }
}

/// Serialisable snapshot of a [`Tally`].
#[derive(Debug, Serialize)]
pub struct Summary<'a> {
    pub algorithm: &'a str,
    pub total: usize,
    pub results: &'a BTreeMap<FeasibilityResult, usize>,
    pub could_not_evaluate: usize,
    pub infeasible: usize,
    pub schedulable_by_optimal_not_by_algorithm: usize,
    pub optimal_inconclusive: usize,
    pub success_rate: f64,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniproc::{UniAlgorithm, UniFeasibility};

    fn uni(r: UniFeasibility) -> FeasibilityResult {
        FeasibilityResult::Uni(r)
    }

    fn tally() -> Tally {
        Tally::new(&Algorithm::Uni(UniAlgorithm::RateMonotonic))
    }

    #[test]
    fn success_rate_ignores_timeouts_and_failures() {
        let mut t = tally();
        t.record(uni(UniFeasibility::SchedulableViaShortcut));
        t.record(uni(UniFeasibility::SchedulableViaSimulation));
        t.record(uni(UniFeasibility::SchedulableViaShortcut));
        t.record(uni(UniFeasibility::NotSchedulableViaSimulation));
        t.record(uni(UniFeasibility::TimedOut));
        t.record_failure();

        assert_eq!(t.count(uni(UniFeasibility::SchedulableViaShortcut)), 2);
        assert_eq!(t.count(uni(UniFeasibility::NotSchedulableViaShortcut)), 0);
        assert_eq!(t.total(), 6);
        assert!((t.success_rate() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn success_rate_is_zero_without_verdicts() {
        let mut t = tally();
        assert_eq!(t.success_rate(), 0.0);
        t.record(uni(UniFeasibility::TimedOut));
        assert_eq!(t.success_rate(), 0.0);
    }

    #[test]
    fn optimal_cross_check_splits_rejections() {
        let mut t = tally();
        t.record_optimal(uni(UniFeasibility::SchedulableViaShortcut));
        t.record_optimal(uni(UniFeasibility::NotSchedulableViaSimulation));
        t.record_optimal(uni(UniFeasibility::NotSchedulableViaShortcut));
        t.record_optimal(uni(UniFeasibility::TimedOut));
        assert_eq!(t.schedulable_by_optimal_not_by_algorithm(), 1);
        assert_eq!(t.infeasible(), 2);
    }

    #[test]
    fn summary_renders_as_yaml() {
        let mut t = tally();
        t.record(uni(UniFeasibility::SchedulableViaShortcut));
        t.record(uni(UniFeasibility::NotSchedulableViaShortcut));
        let yaml = t.to_yaml().unwrap();
        assert!(yaml.contains("algorithm: rm"), "{yaml}");
        assert!(yaml.contains("schedulable_via_shortcut: 1"), "{yaml}");
        assert!(yaml.contains("not_schedulable_via_shortcut: 1"), "{yaml}");
        assert!(yaml.contains("success_rate: 0.5"), "{yaml}");
    }
}
