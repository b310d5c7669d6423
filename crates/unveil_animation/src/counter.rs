//! Count-up values for stat counters
//!
//! A stat such as "250+ projects" counts from zero to its number once its
//! section is revealed.

use serde::{Deserialize, Serialize};

use crate::easing::Easing;

/// Default count-up duration (ms)
pub const DEFAULT_COUNT_DURATION_MS: u32 = 2500;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CountUp {
    pub from: u64,
    pub to: u64,
    pub duration_ms: u32,
    pub easing: Easing,
}

impl CountUp {
    pub fn new(to: u64) -> Self {
        Self {
            from: 0,
            to,
            duration_ms: DEFAULT_COUNT_DURATION_MS,
            easing: Easing::EaseOut,
        }
    }

    pub fn starting_at(mut self, from: u64) -> Self {
        self.from = from;
        self
    }

    pub fn duration(mut self, duration_ms: u32) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Displayed value `elapsed_ms` after counting started
    ///
    /// Rounds down so the final number only shows once the count is done.
    pub fn value_at(&self, elapsed_ms: u64) -> u64 {
        if self.duration_ms == 0 || elapsed_ms >= self.duration_ms as u64 {
            return self.to;
        }

        let t = self.easing.apply(elapsed_ms as f32 / self.duration_ms as f32) as f64;
        let from = self.from as f64;
        let to = self.to as f64;
        let value = (from + (to - from) * t).floor();

        let (lo, hi) = if self.from <= self.to {
            (self.from, self.to)
        } else {
            (self.to, self.from)
        };
        (value.max(0.0) as u64).clamp(lo, hi)
    }

    pub fn is_complete(&self, elapsed_ms: u64) -> bool {
        elapsed_ms >= self.duration_ms as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_from_zero_to_target() {
        let count = CountUp::new(250);

        assert_eq!(count.value_at(0), 0);
        assert_eq!(count.value_at(2500), 250);
        assert_eq!(count.value_at(10_000), 250);

        let mid = count.value_at(1250);
        assert!(mid > 0 && mid < 250);
    }

    #[test]
    fn test_never_decreases() {
        let count = CountUp::new(98).duration(1000).easing(Easing::EaseInOut);

        let mut prev = 0;
        for ms in (0..=1000).step_by(10) {
            let v = count.value_at(ms);
            assert!(v >= prev);
            prev = v;
        }
        assert_eq!(prev, 98);
    }

    #[test]
    fn test_linear_halfway() {
        let count = CountUp::new(100).duration(1000).easing(Easing::Linear);
        assert_eq!(count.value_at(500), 50);
    }

    #[test]
    fn test_zero_duration_jumps() {
        let count = CountUp::new(15).duration(0);
        assert_eq!(count.value_at(0), 15);
        assert!(count.is_complete(0));
    }

    #[test]
    fn test_counts_down() {
        let count = CountUp::new(0).starting_at(10).duration(100).easing(Easing::Linear);
        assert_eq!(count.value_at(0), 10);
        assert_eq!(count.value_at(100), 0);
    }
}
