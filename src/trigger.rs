//! Hysteresis trigger detection.
//!
//! Decides whether the signal is currently "active" from the fraction of hot
//! samples in a short rolling window:
//! - Starting a recording needs `hot_ratio >= onset_ratio`
//! - Staying in one needs only `hot_ratio >= continuation_ratio`
//!
//! The gap between the two ratios keeps a signal hovering near the boundary
//! from toggling the engine on and off every sample.
//!
//! Design note: the window stores one hot flag per sample and a running hot
//! count, so each decision is O(1) instead of a rescan of raw channel data.

use crate::buffer::RollingBuffer;
use crate::types::{EngineState, Sample};

/// Tolerance for ratio comparisons, so that e.g. 3 of 10 meets a ratio of 0.3.
const RATIO_EPSILON: f64 = 1e-9;

/// True when `count / total >= ratio`, inclusive at the boundary.
pub(crate) fn meets_ratio(count: usize, total: usize, ratio: f64) -> bool {
    if total == 0 {
        return false;
    }
    count as f64 + RATIO_EPSILON >= ratio * total as f64
}

/// Thresholds for the trigger decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerConfig {
    pub threshold: u32,
    pub onset_ratio: f64,
    pub continuation_ratio: f64,
    pub window_len: usize,
}

/// Rolling hot-sample detector with onset/continuation hysteresis.
#[derive(Debug, Clone)]
pub struct TriggerDetector {
    config: TriggerConfig,
    flags: RollingBuffer<bool>,
    hot_count: usize,
}

impl TriggerDetector {
    pub fn new(config: TriggerConfig) -> Self {
        Self {
            flags: RollingBuffer::new(config.window_len),
            config,
            hot_count: 0,
        }
    }

    /// Record a sample. Returns whether the sample itself is hot.
    pub fn observe(&mut self, sample: &Sample) -> bool {
        let hot = sample.is_hot(self.config.threshold);
        if let Some(true) = self.flags.push(hot) {
            self.hot_count -= 1;
        }
        if hot {
            self.hot_count += 1;
        }
        hot
    }

    /// Fraction of hot samples, or `None` until the window is full.
    pub fn hot_ratio(&self) -> Option<f64> {
        if self.flags.is_full() {
            Some(self.hot_count as f64 / self.flags.capacity() as f64)
        } else {
            None
        }
    }

    /// Whether the signal counts as active for an engine in `state`.
    ///
    /// Always false while the window is still filling.
    pub fn is_active(&self, state: EngineState) -> bool {
        if !self.flags.is_full() {
            return false;
        }
        let ratio = match state {
            EngineState::Idle => self.config.onset_ratio,
            EngineState::Recording => self.config.continuation_ratio,
        };
        meets_ratio(self.hot_count, self.flags.capacity(), ratio)
    }

    /// Hot samples currently in the window.
    pub fn hot_count(&self) -> usize {
        self.hot_count
    }

    /// Samples currently in the window.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn reset(&mut self) {
        self.flags.clear();
        self.hot_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector(window_len: usize, onset: f64, continuation: f64) -> TriggerDetector {
        TriggerDetector::new(TriggerConfig {
            threshold: 10,
            onset_ratio: onset,
            continuation_ratio: continuation,
            window_len,
        })
    }

    fn single(value: i32) -> Sample {
        Sample::new(0.0, vec![value])
    }

    #[test]
    fn test_not_decidable_until_full() {
        let mut det = detector(4, 0.5, 0.25);
        for _ in 0..3 {
            det.observe(&single(50));
            assert!(!det.is_active(EngineState::Idle));
            assert_eq!(det.hot_ratio(), None);
        }
        det.observe(&single(50));
        assert!(det.is_active(EngineState::Idle));
    }

    #[test]
    fn test_onset_at_exact_ratio() {
        let mut det = detector(4, 0.5, 0.5);
        for value in [15, 15, 2, 2] {
            det.observe(&single(value));
        }
        assert_eq!(det.hot_ratio(), Some(0.5));
        assert!(det.is_active(EngineState::Idle));
    }

    #[test]
    fn test_below_onset_does_not_fire() {
        let mut det = detector(4, 0.5, 0.25);
        for value in [15, 2, 2, 2] {
            det.observe(&single(value));
        }
        assert!(!det.is_active(EngineState::Idle));
        // Same window is enough to stay active
        assert!(det.is_active(EngineState::Recording));
    }

    #[test]
    fn test_any_channel_makes_sample_hot() {
        let mut det = detector(1, 1.0, 1.0);
        assert!(det.observe(&Sample::new(0.0, vec![0, 0, -11])));
        assert!(!det.observe(&Sample::new(0.0, vec![10, -10, 0])));
    }

    #[test]
    fn test_running_count_follows_eviction() {
        let mut det = detector(3, 0.5, 0.3);
        for value in [20, 20, 20, 0, 0, 0] {
            det.observe(&single(value));
        }
        assert_eq!(det.hot_count(), 0);
        assert_eq!(det.len(), 3);

        det.observe(&single(20));
        assert_eq!(det.hot_count(), 1);
    }

    #[test]
    fn test_ratio_boundary_tolerates_rounding() {
        assert!(meets_ratio(3, 10, 0.3));
        assert!(!meets_ratio(2, 10, 0.3));
        assert!(meets_ratio(7, 10, 0.7));
        assert!(!meets_ratio(0, 0, 0.0));
    }

    #[test]
    fn test_reset_clears_window() {
        let mut det = detector(2, 0.5, 0.5);
        det.observe(&single(50));
        det.observe(&single(50));
        det.reset();
        assert!(det.is_empty());
        assert_eq!(det.hot_count(), 0);
        assert!(!det.is_active(EngineState::Idle));
    }
}
