// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sliding-window frequency estimation for accepted samples.
//!
//! Tick instants are recorded on the ingress path and averaged over a
//! rolling window when a registration snapshot (or a monitoring call)
//! asks for the rate. Callers pass `Instant`s explicitly so tests can
//! drive the window deterministically.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Averaging window for the reported rate.
const FREQUENCY_WINDOW: Duration = Duration::from_secs(3);

/// Rolling-window rate estimator, reporting millihertz.
#[derive(Debug)]
pub struct FrequencyEstimator {
    ticks: VecDeque<Instant>,
}

impl FrequencyEstimator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ticks: VecDeque::new(),
        }
    }

    /// Record one accepted sample at `now`.
    pub fn tick(&mut self, now: Instant) {
        self.purge(now);
        self.ticks.push_back(now);
    }

    /// Rate of ticks over the rolling window, in millihertz.
    ///
    /// 10 samples per second sustained over the window reports 10_000.
    #[must_use]
    pub fn frequency_millihertz(&mut self, now: Instant) -> i64 {
        self.purge(now);
        if self.ticks.is_empty() {
            return 0;
        }
        let hertz = self.ticks.len() as f64 / FREQUENCY_WINDOW.as_secs_f64();
        (hertz * 1000.0).round() as i64
    }

    /// Forget all ticks (subscriber stop).
    pub fn clear(&mut self) {
        self.ticks.clear();
    }

    fn purge(&mut self, now: Instant) {
        while let Some(front) = self.ticks.front() {
            if now.saturating_duration_since(*front) >= FREQUENCY_WINDOW {
                self.ticks.pop_front();
            } else {
                break;
            }
        }
    }
}

impl Default for FrequencyEstimator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_reports_zero() {
        let mut freq = FrequencyEstimator::new();
        assert_eq!(freq.frequency_millihertz(Instant::now()), 0);
    }

    #[test]
    fn test_steady_rate() {
        let mut freq = FrequencyEstimator::new();
        let start = Instant::now();

        // 10 Hz for one second inside the 3 s window.
        for n in 0..30 {
            freq.tick(start + Duration::from_millis(n * 100));
        }
        let now = start + Duration::from_millis(2999);
        assert_eq!(freq.frequency_millihertz(now), 10_000);
    }

    #[test]
    fn test_single_tick() {
        let mut freq = FrequencyEstimator::new();
        let start = Instant::now();
        freq.tick(start);
        // One tick over a 3 s window: 1/3 Hz -> 333 mHz.
        assert_eq!(freq.frequency_millihertz(start), 333);
    }

    #[test]
    fn test_old_ticks_fall_out_of_window() {
        let mut freq = FrequencyEstimator::new();
        let start = Instant::now();

        for n in 0..30 {
            freq.tick(start + Duration::from_millis(n * 100));
        }
        // 10 s later everything has aged out.
        assert_eq!(freq.frequency_millihertz(start + Duration::from_secs(10)), 0);
    }

    #[test]
    fn test_partial_expiry() {
        let mut freq = FrequencyEstimator::new();
        let start = Instant::now();

        freq.tick(start);
        freq.tick(start + Duration::from_secs(2));
        freq.tick(start + Duration::from_secs(4));

        // At t=4s the t=0 tick has expired; two ticks remain.
        let mhz = freq.frequency_millihertz(start + Duration::from_secs(4));
        assert_eq!(mhz, 667);
    }

    #[test]
    fn test_clear() {
        let mut freq = FrequencyEstimator::new();
        let now = Instant::now();
        freq.tick(now);
        freq.clear();
        assert_eq!(freq.frequency_millihertz(now), 0);
    }
}
