/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Random periodic task sets with a fixed total utilisation.
//!
//! Utilisations are split with UUniFast (Bini & Buttazzo), which samples
//! uniformly from the simplex `Σ u_i = U`.  Each task then gets a period
//! drawn uniformly from the configured range and `C = max(1, round(u·T))`.

use clap::ValueEnum;
use rand::Rng;
use thiserror::Error;

use rtfeas::task::{TaskError, TaskSet, TaskSetBuilder, Time};

#[derive(Debug, Error)]
pub enum GenError {
    #[error("a task set needs at least one task")]
    NoTasks,

    #[error("total utilisation {0} must be positive and finite")]
    InvalidUtilization(f64),

    #[error("period range {min}..={max} is empty or contains zero")]
    InvalidPeriodRange { min: Time, max: Time },

    #[error(transparent)]
    Task(#[from] TaskError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeadlineKind {
    /// `D = T`.
    Implicit,
    /// `D` drawn uniformly from `[C, T]`.
    Constrained,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorParams {
    pub tasks: usize,
    pub utilization: f64,
    pub period_min: Time,
    pub period_max: Time,
    pub deadlines: DeadlineKind,
    pub max_offset: Time,
}

impl GeneratorParams {
    pub fn validate(&self) -> Result<(), GenError> {
        if self.tasks == 0 {
            return Err(GenError::NoTasks);
        }
        if !self.utilization.is_finite() || self.utilization <= 0.0 {
            return Err(GenError::InvalidUtilization(self.utilization));
        }
        if self.period_min == 0 || self.period_min > self.period_max {
            return Err(GenError::InvalidPeriodRange {
                min: self.period_min,
                max: self.period_max,
            });
        }
        Ok(())
    }
}

/// Split `total` into `n` non-negative shares.
pub fn uunifast<R: Rng + ?Sized>(rng: &mut R, n: usize, total: f64) -> Vec<f64> {
    let mut shares = Vec::with_capacity(n);
    let mut remaining = total;
    for i in 1..n {
        let next = remaining * rng.gen::<f64>().powf(1.0 / (n - i) as f64);
        shares.push(remaining - next);
        remaining = next;
    }
    if n > 0 {
        shares.push(remaining);
    }
    shares
}

/// Draw one task set.
pub fn generate<R: Rng + ?Sized>(rng: &mut R, params: &GeneratorParams) -> Result<TaskSet, GenError> {
    params.validate()?;

    let mut builder = TaskSetBuilder::new();
    for u in uunifast(rng, params.tasks, params.utilization) {
        let period = rng.gen_range(params.period_min..=params.period_max);
        let computation_time = ((u * period as f64).round() as Time).max(1);
        let deadline = match params.deadlines {
            DeadlineKind::Implicit => period,
            DeadlineKind::Constrained if computation_time < period => {
                rng.gen_range(computation_time..=period)
            }
            DeadlineKind::Constrained => period,
        };
        let offset = rng.gen_range(0..=params.max_offset);
        builder.push(offset, computation_time, deadline, period)?;
    }
    Ok(builder.build())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn params() -> GeneratorParams {
        GeneratorParams {
            tasks: 5,
            utilization: 0.8,
            period_min: 10,
            period_max: 100,
            deadlines: DeadlineKind::Constrained,
            max_offset: 0,
        }
    }

    #[test]
    fn uunifast_shares_sum_to_the_target() {
        let mut rng = StdRng::seed_from_u64(3);
        for n in 1..=8 {
            let shares = uunifast(&mut rng, n, 2.5);
            assert_eq!(shares.len(), n);
            assert!(shares.iter().all(|&u| u >= 0.0));
            assert!((shares.iter().sum::<f64>() - 2.5).abs() < 1e-9);
        }
        assert!(uunifast(&mut rng, 0, 1.0).is_empty());
    }

    #[test]
    fn generated_tasks_respect_the_parameters() {
        let mut rng = StdRng::seed_from_u64(11);
        let p = GeneratorParams {
            max_offset: 7,
            ..params()
        };
        for _ in 0..50 {
            let ts = generate(&mut rng, &p).unwrap();
            assert_eq!(ts.len(), 5);
            for task in &ts {
                assert!((10..=100).contains(&task.period()));
                assert!(task.computation_time() >= 1);
                assert!(task.deadline() <= task.period());
                assert!(task.deadline() >= task.computation_time().min(task.period()));
                assert!(task.offset() <= 7);
            }
        }
    }

    #[test]
    fn same_seed_same_task_set() {
        let a = generate(&mut StdRng::seed_from_u64(5), &params()).unwrap();
        let b = generate(&mut StdRng::seed_from_u64(5), &params()).unwrap();
        let shape = |ts: &TaskSet| {
            ts.iter()
                .map(|t| (t.offset(), t.computation_time(), t.deadline(), t.period()))
                .collect::<Vec<_>>()
        };
        assert_eq!(shape(&a), shape(&b));
    }

    #[test]
    fn bad_parameters_are_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let cases = [
            GeneratorParams { tasks: 0, ..params() },
            GeneratorParams { utilization: 0.0, ..params() },
            GeneratorParams { utilization: f64::NAN, ..params() },
            GeneratorParams { period_min: 0, ..params() },
            GeneratorParams { period_min: 50, period_max: 20, ..params() },
        ];
        for p in &cases {
            assert!(generate(&mut rng, p).is_err(), "{p:?}");
        }
        assert!(matches!(
            GeneratorParams { tasks: 0, ..params() }.validate(),
            Err(GenError::NoTasks)
        ));
    }
}
