/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Audsley's optimal priority assignment.
//!
//! Levels are filled from the lowest (`n`) up to the highest (`1`).  At each
//! level every unassigned task is tried in turn: if its worst-case response
//! time meets its deadline while all other unassigned tasks interfere with it,
//! it keeps the level.  If no task fits a level the set has no feasible
//! fixed-priority order.  At most `n(n+1)/2` response-time evaluations.

use tracing::debug;

use crate::analysis::rta::response_time;
use crate::analysis::PriorityAssignment;
use crate::task::Task;

/// Search a feasible fixed-priority order for `tasks`.
///
/// Returns `None` when some priority level cannot be filled.
pub fn assign_priorities(tasks: &[Task]) -> Option<PriorityAssignment> {
    let mut unassigned: Vec<&Task> = tasks.iter().collect();
    let mut assignment = PriorityAssignment::new();

    for level in (1..=tasks.len() as u32).rev() {
        let found = (0..unassigned.len()).find(|&i| {
            let higher: Vec<&Task> = unassigned
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, t)| *t)
                .collect();
            response_time(unassigned[i], &higher).is_some()
        });

        match found {
            Some(i) => {
                let task = unassigned.remove(i);
                debug!(task = %task.id(), level, "priority level assigned");
                assignment.assign(task.id(), level);
            }
            None => {
                debug!(level, remaining = unassigned.len(), "no task fits priority level");
                return None;
            }
        }
    }

    Some(assignment)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::rta::response_time_with_priorities;
    use crate::task::{TaskId, TaskSet, Time};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn set(params: &[(Time, Time, Time, Time)]) -> TaskSet {
        TaskSet::from_params(params).unwrap()
    }

    #[test]
    fn finds_an_order_where_rate_monotonic_fails() {
        // RM puts T1 (T = 5) first and T2 misses its deadline of 2.
        let ts = set(&[(0, 2, 5, 5), (0, 2, 2, 10)]);
        let pa = assign_priorities(ts.tasks()).unwrap();
        assert_eq!(pa.level(TaskId(2)), Some(1));
        assert_eq!(pa.level(TaskId(1)), Some(2));
    }

    #[test]
    fn overloaded_set_has_no_order() {
        let ts = set(&[(0, 3, 4, 4), (0, 3, 4, 4)]);
        assert_eq!(assign_priorities(ts.tasks()), None);
    }

    #[test]
    fn single_task_takes_level_one() {
        let ts = set(&[(0, 2, 3, 7)]);
        let pa = assign_priorities(ts.tasks()).unwrap();
        assert_eq!(pa.level(TaskId(1)), Some(1));
    }

    #[test]
    fn found_orders_pass_independent_response_time_analysis() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut found = 0;
        for _ in 0..200 {
            let n = rng.gen_range(2..=5);
            let params: Vec<(Time, Time, Time, Time)> = (0..n)
                .map(|_| {
                    let period = rng.gen_range(4..=40);
                    let c = rng.gen_range(1..=period / 3);
                    let d = rng.gen_range(c..=period + period / 2);
                    (0, c, d, period)
                })
                .collect();
            let ts = set(&params);

            if let Some(pa) = assign_priorities(ts.tasks()) {
                found += 1;
                assert!(pa.is_complete_for(ts.tasks()));
                for task in ts.tasks() {
                    assert!(
                        response_time_with_priorities(task, ts.tasks(), &pa).is_some(),
                        "{task} misses under the order it was assigned"
                    );
                }
            }
        }
        assert!(found > 0, "the sample should contain feasible sets");
    }
}
