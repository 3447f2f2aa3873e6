// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Consecutive-positive gate in front of camera alerts

use super::Detection;

/// Positives add one, negatives take one away (never below zero). Reaching
/// the threshold confirms and resets the counter.
#[derive(Debug, Clone)]
pub struct DetectionDebouncer {
    hits: u32,
    threshold: u32,
}

impl DetectionDebouncer {
    pub fn new(threshold: u32) -> Self {
        Self {
            hits: 0,
            threshold: threshold.max(1),
        }
    }

    pub fn observe(&mut self, positive: bool) -> Detection {
        if positive {
            self.hits += 1;
            if self.hits >= self.threshold {
                self.hits = 0;
                Detection::Confirmed
            } else {
                Detection::Pending
            }
        } else {
            self.hits = self.hits.saturating_sub(1);
            Detection::Miss
        }
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }
}

impl Default for DetectionDebouncer {
    fn default() -> Self {
        Self::new(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(sequence: &[bool]) -> (usize, u32) {
        let mut debouncer = DetectionDebouncer::default();
        let alerts = sequence
            .iter()
            .filter(|&&positive| debouncer.observe(positive) == Detection::Confirmed)
            .count();
        (alerts, debouncer.hits())
    }

    #[test]
    fn test_two_positives_confirm_once() {
        assert_eq!(run(&[true, true]), (1, 0));
    }

    #[test]
    fn test_positive_then_negative() {
        assert_eq!(run(&[true, false]), (0, 0));
    }

    #[test]
    fn test_third_positive_starts_over() {
        let mut debouncer = DetectionDebouncer::default();
        assert_eq!(debouncer.observe(true), Detection::Pending);
        assert_eq!(debouncer.observe(true), Detection::Confirmed);
        assert_eq!(debouncer.observe(true), Detection::Pending);
        assert_eq!(debouncer.hits(), 1);
    }

    #[test]
    fn test_negatives_never_underflow() {
        assert_eq!(run(&[false, false, true, false, false]), (0, 0));
    }

    #[test]
    fn test_interleaved_miss_delays_confirmation() {
        // hits: 1, 0, 1, 2 -> confirm
        assert_eq!(run(&[true, false, true, true]), (1, 0));
    }
}
