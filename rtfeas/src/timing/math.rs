/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Integer helpers: GCD, checked LCM and their slice reductions.

use super::TimingError;
use crate::task::Time;

/// Iterative Euclidean GCD.  `gcd(0, x) == x`.
pub fn gcd(mut a: Time, mut b: Time) -> Time {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// Checked LCM computed as `(a / gcd(a, b)) * b`.
///
/// Returns `Ok(0)` when either input is `0`.
pub fn lcm(a: Time, b: Time) -> Result<Time, TimingError> {
    if a == 0 || b == 0 {
        return Ok(0);
    }
    (a / gcd(a, b))
        .checked_mul(b)
        .ok_or(TimingError::Overflow { a, b })
}

/// LCM of every value; `Ok(0)` for an empty slice.
pub fn lcm_of_slice(values: &[Time]) -> Result<Time, TimingError> {
    values
        .iter()
        .try_fold(values.first().copied().unwrap_or(0), |acc, &v| lcm(acc, v))
}

/// GCD of every value; `0` for an empty slice.
pub fn gcd_of_slice(values: &[Time]) -> Time {
    values.iter().fold(0, |acc, &v| gcd(acc, v))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gcd_basic_cases() {
        assert_eq!(gcd(12, 8), 4);
        assert_eq!(gcd(7, 3), 1);
        assert_eq!(gcd(0, 5), 5);
        assert_eq!(gcd(5, 0), 5);
    }

    #[test]
    fn lcm_overflow_is_reported() {
        let big = u64::MAX / 2 + 1;
        assert!(matches!(
            lcm(big, 3),
            Err(TimingError::Overflow { a, b: 3 }) if a == big
        ));
    }

    #[test]
    fn slice_reductions() {
        assert_eq!(lcm_of_slice(&[4, 6, 10]).unwrap(), 60);
        assert_eq!(lcm_of_slice(&[]).unwrap(), 0);
        assert_eq!(gcd_of_slice(&[12, 18, 30]), 6);
        assert_eq!(gcd_of_slice(&[]), 0);
        assert_eq!(gcd_of_slice(&[7]), 7);
    }
}
