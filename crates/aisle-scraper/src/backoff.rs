//! Randomized exponential backoff ("collision avoidance").
//!
//! The first delay handed out is always zero so the first attempt goes out
//! immediately. After that, the n-th delay (n starting at 0) is `k * step`
//! where `k` is drawn uniformly from the closed range `[0, 2^n]`. Callers
//! racing the same upstream end up spread across an exponentially growing
//! window instead of retrying in lockstep.
//!
//! | Call | Window for `k` | With `step = 1.5 ms`     |
//! |------|----------------|--------------------------|
//! | 1    | —              | 0                        |
//! | 2    | `[0, 1]`       | 0 or 1.5 ms              |
//! | 3    | `[0, 2]`       | 0, 1.5 or 3 ms           |
//! | 4    | `[0, 4]`       | 0 … 6 ms                 |
//!
//! The sequence never ends; bounding it is the caller's job (see
//! [`crate::retry`]).

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Default multiplier for each unit of `k`.
pub const DEFAULT_STEP: Duration = Duration::from_micros(1500);

/// Exponent cap; keeps `2^n` inside `u32`.
const MAX_EXPONENT: u32 = 31;

#[derive(Debug, Clone)]
pub struct CollisionBackoff<R = StdRng> {
    step: Duration,
    failures: u32,
    started: bool,
    rng: R,
}

impl CollisionBackoff<StdRng> {
    #[must_use]
    pub fn new(step: Duration) -> Self {
        Self::with_rng(step, StdRng::from_rng(&mut rand::rng()))
    }
}

impl Default for CollisionBackoff<StdRng> {
    fn default() -> Self {
        Self::new(DEFAULT_STEP)
    }
}

impl<R: Rng> CollisionBackoff<R> {
    pub fn with_rng(step: Duration, rng: R) -> Self {
        Self {
            step,
            failures: 0,
            started: false,
            rng,
        }
    }

    /// Returns the next wait.
    pub fn next_delay(&mut self) -> Duration {
        if !self.started {
            self.started = true;
            return Duration::ZERO;
        }

        let upper: u32 = 1 << self.failures.min(MAX_EXPONENT);
        let k = self.rng.random_range(0..=upper);
        self.failures = self.failures.saturating_add(1);
        self.step.saturating_mul(k)
    }

    /// Number of non-initial delays handed out so far.
    #[must_use]
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Rewinds to the initial state; the next delay is zero again.
    pub fn reset(&mut self) {
        self.failures = 0;
        self.started = false;
    }
}

impl<R: Rng> Iterator for CollisionBackoff<R> {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        Some(self.next_delay())
    }
}
