/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Uniprocessor feasibility engine.
//!
//! [`UniprocessorScheduler::is_feasible`] dispatches on [`UniAlgorithm`]:
//!
//! | Algorithm | Shortcuts tried before simulating |
//! |-----------|-----------------------------------|
//! | `rm`, `dm` | `U > 1`, Liu & Layland, response-time analysis |
//! | `audsley` | `U > 1`, then the priority search itself decides |
//! | `edf` | `U > 1`, density `≤ 1`, processor demand (synchronous sets) |
//! | `rr` | `U > 1` |
//!
//! With `force_simulation` every shortcut is skipped and the verdict comes
//! from [`crate::sim::simulate`].

pub mod audsley;
pub mod policy;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::analysis::rta::{deadline_monotonic_order, rate_monotonic_order, response_times_in_order};
use crate::analysis::{
    demand_horizon, exceeds_unit_utilization, first_demand_overflow, within_liu_layland_bound,
    UTILIZATION_EPSILON,
};
use crate::config::Limits;
use crate::evaluate::EvaluationOptions;
use crate::sim::{simulate, Policy, SimOutcome};
use crate::task::{Task, TaskSet};
use crate::timing::{density, is_synchronous, utilization};
use audsley::assign_priorities;
use policy::{EarliestDeadlineFirst, FixedPriority, RoundRobin};

// ── Algorithm selector ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UniAlgorithm {
    #[serde(rename = "rm")]
    RateMonotonic,
    #[serde(rename = "dm")]
    DeadlineMonotonic,
    Audsley,
    #[serde(rename = "edf")]
    EarliestDeadlineFirst,
    #[serde(rename = "rr")]
    RoundRobin,
}

impl UniAlgorithm {
    pub const ALL: [UniAlgorithm; 5] = [
        UniAlgorithm::RateMonotonic,
        UniAlgorithm::DeadlineMonotonic,
        UniAlgorithm::Audsley,
        UniAlgorithm::EarliestDeadlineFirst,
        UniAlgorithm::RoundRobin,
    ];

    /// The reference algorithm that schedules every feasible set.
    pub const OPTIMAL: UniAlgorithm = UniAlgorithm::EarliestDeadlineFirst;

    pub fn as_str(self) -> &'static str {
        match self {
            UniAlgorithm::RateMonotonic => "rm",
            UniAlgorithm::DeadlineMonotonic => "dm",
            UniAlgorithm::Audsley => "audsley",
            UniAlgorithm::EarliestDeadlineFirst => "edf",
            UniAlgorithm::RoundRobin => "rr",
        }
    }
}

impl fmt::Display for UniAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown uniprocessor algorithm '{0}' (expected rm, dm, audsley, edf or rr)")]
pub struct UnknownAlgorithm(pub String);

impl FromStr for UniAlgorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UniAlgorithm::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownAlgorithm(s.to_string()))
    }
}

// ── Result ────────────────────────────────────────────────────────────────────

/// Uniprocessor verdict.  The discriminant is the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UniFeasibility {
    SchedulableViaSimulation = 0,
    SchedulableViaShortcut = 1,
    NotSchedulableViaSimulation = 2,
    NotSchedulableViaShortcut = 3,
    TimedOut = 4,
}

impl UniFeasibility {
    pub const ALL: [UniFeasibility; 5] = [
        UniFeasibility::SchedulableViaSimulation,
        UniFeasibility::SchedulableViaShortcut,
        UniFeasibility::NotSchedulableViaSimulation,
        UniFeasibility::NotSchedulableViaShortcut,
        UniFeasibility::TimedOut,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_schedulable(self) -> bool {
        matches!(
            self,
            UniFeasibility::SchedulableViaSimulation | UniFeasibility::SchedulableViaShortcut
        )
    }

    pub fn is_not_schedulable(self) -> bool {
        matches!(
            self,
            UniFeasibility::NotSchedulableViaSimulation | UniFeasibility::NotSchedulableViaShortcut
        )
    }

    fn from_simulation(outcome: &SimOutcome) -> Self {
        match outcome {
            SimOutcome::Schedulable => UniFeasibility::SchedulableViaSimulation,
            SimOutcome::DeadlineMiss { .. } => UniFeasibility::NotSchedulableViaSimulation,
            SimOutcome::TimedOut(_) => UniFeasibility::TimedOut,
        }
    }
}

impl fmt::Display for UniFeasibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UniFeasibility::SchedulableViaSimulation => "schedulable (had to simulate)",
            UniFeasibility::SchedulableViaShortcut => "schedulable (shortcut)",
            UniFeasibility::NotSchedulableViaSimulation => "not schedulable (had to simulate)",
            UniFeasibility::NotSchedulableViaShortcut => "not schedulable (shortcut)",
            UniFeasibility::TimedOut => "simulation timed out",
        };
        f.write_str(text)
    }
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

/// One feasibility determination over one task set.
#[derive(Debug)]
pub struct UniprocessorScheduler<'a> {
    task_set: &'a TaskSet,
    options: EvaluationOptions,
    limits: &'a Limits,
}

impl<'a> UniprocessorScheduler<'a> {
    pub fn new(task_set: &'a TaskSet, options: EvaluationOptions, limits: &'a Limits) -> Self {
        Self {
            task_set,
            options,
            limits,
        }
    }

    /// Decide whether `algorithm` schedules the task set.
    pub fn is_feasible(&self, algorithm: UniAlgorithm) -> UniFeasibility {
        let tasks = self.task_set.tasks();
        debug!(
            algorithm = %algorithm,
            tasks = tasks.len(),
            utilization = utilization(tasks),
            force_simulation = self.options.force_simulation,
            "uniprocessor evaluation"
        );

        if !self.options.force_simulation && exceeds_unit_utilization(tasks) {
            info!(algorithm = %algorithm, utilization = utilization(tasks), "U > 1");
            return UniFeasibility::NotSchedulableViaShortcut;
        }

        let result = match algorithm {
            UniAlgorithm::RateMonotonic => {
                self.fixed_priority("rm", tasks, rate_monotonic_order(tasks))
            }
            UniAlgorithm::DeadlineMonotonic => {
                self.fixed_priority("dm", tasks, deadline_monotonic_order(tasks))
            }
            UniAlgorithm::Audsley => self.audsley(tasks),
            UniAlgorithm::EarliestDeadlineFirst => self.edf(tasks),
            UniAlgorithm::RoundRobin => self.run(&mut RoundRobin::new(tasks)),
        };
        info!(algorithm = %algorithm, code = result.code(), "{result}");
        result
    }

    fn run(&self, policy: &mut dyn Policy) -> UniFeasibility {
        let outcome = simulate(
            self.task_set.tasks(),
            policy,
            1,
            self.limits,
            self.options.verbose,
        );
        if let SimOutcome::TimedOut(cause) = &outcome {
            info!(policy = policy.name(), %cause, "simulation inconclusive");
        }
        UniFeasibility::from_simulation(&outcome)
    }

    /// RM / DM: Liu & Layland, then response-time analysis.
    ///
    /// Response-time analysis assumes a synchronous release, the worst case
    /// for fixed priorities, so a pass is conclusive for any offsets while a
    /// failure with offsets falls through to simulation.
    fn fixed_priority(
        &self,
        name: &'static str,
        tasks: &[Task],
        ordered: Vec<&Task>,
    ) -> UniFeasibility {
        if !self.options.force_simulation {
            if within_liu_layland_bound(tasks) {
                debug!(policy = name, "within Liu & Layland bound");
                return UniFeasibility::SchedulableViaShortcut;
            }
            match response_times_in_order(&ordered) {
                Ok(response_times) => {
                    debug!(policy = name, ?response_times, "every response time meets its deadline");
                    return UniFeasibility::SchedulableViaShortcut;
                }
                Err(overrun) if is_synchronous(tasks) => {
                    debug!(policy = name, task = %overrun.task, "response time exceeds deadline");
                    return UniFeasibility::NotSchedulableViaShortcut;
                }
                Err(overrun) => {
                    debug!(policy = name, task = %overrun.task, "offsets present, simulating");
                }
            }
        }
        self.run(&mut FixedPriority::from_order(name, tasks, &ordered))
    }

    /// Audsley's search decides on its own; with `force_simulation` the order
    /// it finds is replayed in the simulator.
    ///
    /// The search assumes a synchronous release, so a failure with offsets
    /// only rules out the critical instant: the deadline and rate monotonic
    /// orders are then simulated and any of them meeting every deadline wins.
    fn audsley(&self, tasks: &[Task]) -> UniFeasibility {
        match assign_priorities(tasks) {
            Some(assignment) if self.options.force_simulation => {
                let ordered = assignment.order(tasks);
                self.run(&mut FixedPriority::from_order("audsley", tasks, &ordered))
            }
            Some(_) => UniFeasibility::SchedulableViaSimulation,
            None if is_synchronous(tasks) => UniFeasibility::NotSchedulableViaSimulation,
            None => {
                debug!(policy = "audsley", "no priority order for the critical instant, simulating");
                self.audsley_with_offsets(tasks)
            }
        }
    }

    fn audsley_with_offsets(&self, tasks: &[Task]) -> UniFeasibility {
        let dm = deadline_monotonic_order(tasks);
        let rm = rate_monotonic_order(tasks);
        let mut candidates = vec![dm];
        if !same_order(&candidates[0], &rm) {
            candidates.push(rm);
        }

        let mut verdict = UniFeasibility::NotSchedulableViaSimulation;
        for ordered in candidates {
            match self.run(&mut FixedPriority::from_order("audsley", tasks, &ordered)) {
                UniFeasibility::SchedulableViaSimulation => {
                    return UniFeasibility::SchedulableViaSimulation;
                }
                UniFeasibility::TimedOut => verdict = UniFeasibility::TimedOut,
                _ => {}
            }
        }
        verdict
    }

    fn edf(&self, tasks: &[Task]) -> UniFeasibility {
        if !self.options.force_simulation {
            if density(tasks) <= 1.0 + UTILIZATION_EPSILON {
                debug!(density = density(tasks), "density within one processor");
                return UniFeasibility::SchedulableViaShortcut;
            }
            if is_synchronous(tasks) {
                if let Ok(horizon) = demand_horizon(tasks) {
                    if let Some(t) =
                        first_demand_overflow(tasks, 1, horizon, self.limits.dbf_max_points)
                    {
                        debug!(at = t, "processor demand exceeds capacity");
                        return UniFeasibility::NotSchedulableViaShortcut;
                    }
                }
            }
        }
        self.run(&mut EarliestDeadlineFirst::uniprocessor())
    }
}

fn same_order(a: &[&Task], b: &[&Task]) -> bool {
    a.iter().map(|t| t.id()).eq(b.iter().map(|t| t.id()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::rta::response_time_with_priorities;
    use crate::analysis::PriorityAssignment;
    use crate::task::{TaskId, Time};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn set(params: &[(Time, Time, Time, Time)]) -> TaskSet {
        TaskSet::from_params(params).unwrap()
    }

    fn check(ts: &TaskSet, algorithm: UniAlgorithm, force_simulation: bool) -> UniFeasibility {
        let limits = Limits::default();
        let options = EvaluationOptions {
            verbose: false,
            force_simulation,
        };
        UniprocessorScheduler::new(ts, options, &limits).is_feasible(algorithm)
    }

    fn random_set(rng: &mut StdRng, n: usize, implicit: bool) -> TaskSet {
        let params: Vec<(Time, Time, Time, Time)> = (0..n)
            .map(|_| {
                let period = rng.gen_range(2..=24);
                let c = rng.gen_range(1..=period / 2);
                let d = if implicit {
                    period
                } else {
                    rng.gen_range(c..=period)
                };
                (0, c, d, period)
            })
            .collect();
        set(&params)
    }

    // ── Algorithm selector ────────────────────────────────────────────────────

    #[test]
    fn algorithm_names_round_trip() {
        for a in UniAlgorithm::ALL {
            assert_eq!(a.as_str().parse::<UniAlgorithm>().unwrap(), a);
        }
        assert_eq!("EDF".parse::<UniAlgorithm>().unwrap(), UniAlgorithm::EarliestDeadlineFirst);
        assert!("fifo".parse::<UniAlgorithm>().is_err());
    }

    #[test]
    fn result_codes_are_stable() {
        let codes: Vec<u8> = UniFeasibility::ALL.iter().map(|r| r.code()).collect();
        assert_eq!(codes, vec![0, 1, 2, 3, 4]);
    }

    // ── Shortcuts ─────────────────────────────────────────────────────────────

    #[test]
    fn liu_layland_shortcut_agrees_with_response_time_analysis() {
        // U = 1/3 + 1/4 = 0.583 ≤ 0.828
        let ts = set(&[(0, 1, 3, 3), (0, 1, 4, 4)]);
        assert!(within_liu_layland_bound(ts.tasks()));
        assert!(response_times_in_order(&rate_monotonic_order(ts.tasks())).is_ok());
        assert_eq!(
            check(&ts, UniAlgorithm::RateMonotonic, false),
            UniFeasibility::SchedulableViaShortcut
        );
    }

    #[test]
    fn overload_is_rejected_by_shortcut_and_by_simulation() {
        let ts = set(&[(0, 3, 4, 4), (0, 3, 4, 4)]);
        for algorithm in UniAlgorithm::ALL {
            assert_eq!(
                check(&ts, algorithm, false),
                UniFeasibility::NotSchedulableViaShortcut,
                "{algorithm}"
            );
        }
        assert_eq!(
            check(&ts, UniAlgorithm::RateMonotonic, true),
            UniFeasibility::NotSchedulableViaSimulation
        );
    }

    #[test]
    fn edf_schedules_implicit_sets_up_to_full_utilization() {
        // U = 1/3 + 2/4 = 0.833
        let ts = set(&[(0, 1, 3, 3), (0, 2, 4, 4)]);
        assert!(check(&ts, UniAlgorithm::EarliestDeadlineFirst, false).is_schedulable());
        assert_eq!(
            check(&ts, UniAlgorithm::EarliestDeadlineFirst, true),
            UniFeasibility::SchedulableViaSimulation
        );

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let ts = random_set(&mut rng, 3, true);
            let verdict = check(&ts, UniAlgorithm::EarliestDeadlineFirst, true);
            if utilization(ts.tasks()) <= 1.0 + UTILIZATION_EPSILON {
                assert_eq!(verdict, UniFeasibility::SchedulableViaSimulation, "{ts:?}");
            } else {
                assert_eq!(verdict, UniFeasibility::NotSchedulableViaSimulation, "{ts:?}");
            }
        }
    }

    #[test]
    fn edf_demand_check_rejects_synchronous_overload_of_short_deadlines() {
        // Density 4/3 and both jobs due at t = 3 with 4 units of demand.
        let ts = set(&[(0, 2, 3, 5), (0, 2, 3, 5)]);
        assert_eq!(
            check(&ts, UniAlgorithm::EarliestDeadlineFirst, false),
            UniFeasibility::NotSchedulableViaShortcut
        );
        assert_eq!(
            check(&ts, UniAlgorithm::EarliestDeadlineFirst, true),
            UniFeasibility::NotSchedulableViaSimulation
        );
    }

    #[test]
    fn rate_monotonic_with_offsets_falls_back_to_simulation() {
        // Synchronous analysis fails for T2, but the offset keeps the two
        // jobs apart.
        let ts = set(&[(0, 2, 2, 4), (2, 2, 2, 4)]);
        assert_eq!(
            check(&ts, UniAlgorithm::RateMonotonic, false),
            UniFeasibility::SchedulableViaSimulation
        );
    }

    // ── Simulation agrees with analysis ───────────────────────────────────────

    #[test]
    fn forced_simulation_matches_response_time_analysis_for_synchronous_sets() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let ts = random_set(&mut rng, 3, false);
            for algorithm in [UniAlgorithm::RateMonotonic, UniAlgorithm::DeadlineMonotonic] {
                let analytic = check(&ts, algorithm, false);
                let simulated = check(&ts, algorithm, true);
                assert_eq!(
                    analytic.is_schedulable(),
                    simulated.is_schedulable(),
                    "{algorithm} on {ts:?}: {analytic} vs {simulated}"
                );
            }
        }
    }

    #[test]
    fn lower_priority_tasks_never_change_a_response_time() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let ts = random_set(&mut rng, 3, false);
            let mut priorities = PriorityAssignment::new();
            for (level, task) in deadline_monotonic_order(ts.tasks()).iter().enumerate() {
                priorities.assign(task.id(), level as u32 + 1);
            }

            // Append a task at the lowest level.
            let period = rng.gen_range(2..=24);
            let extra = Task::new(TaskId(99), 0, rng.gen_range(1..=period), period, period).unwrap();
            let mut extended: Vec<Task> = ts.tasks().to_vec();
            extended.push(extra);
            priorities.assign(TaskId(99), 4);

            for task in ts.tasks() {
                let before = response_time_with_priorities(task, ts.tasks(), &priorities);
                if before.is_some() {
                    assert_eq!(
                        response_time_with_priorities(task, &extended, &priorities),
                        before,
                        "{task}"
                    );
                }
            }
        }
    }

    #[test]
    fn audsley_covers_what_deadline_monotonic_schedules() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..100 {
            let ts = random_set(&mut rng, 4, false);
            let dm = check(&ts, UniAlgorithm::DeadlineMonotonic, false);
            let audsley = check(&ts, UniAlgorithm::Audsley, false);
            if dm.is_schedulable() {
                assert!(audsley.is_schedulable(), "{ts:?}");
            }
        }
    }

    #[test]
    fn audsley_with_offsets_agrees_with_fixed_priority_simulation() {
        // Released two units apart, the tasks never compete; released
        // together one of them always misses.
        let ts = set(&[(0, 2, 2, 4), (2, 2, 2, 4)]);
        assert_eq!(
            check(&ts, UniAlgorithm::RateMonotonic, false),
            UniFeasibility::SchedulableViaSimulation
        );
        assert_eq!(
            check(&ts, UniAlgorithm::DeadlineMonotonic, false),
            UniFeasibility::SchedulableViaSimulation
        );
        assert_eq!(
            check(&ts, UniAlgorithm::Audsley, false),
            UniFeasibility::SchedulableViaSimulation
        );

        // Synchronous, the same tasks stay infeasible.
        let sync = set(&[(0, 2, 2, 4), (0, 2, 2, 4)]);
        assert_eq!(
            check(&sync, UniAlgorithm::Audsley, false),
            UniFeasibility::NotSchedulableViaSimulation
        );
    }
}
