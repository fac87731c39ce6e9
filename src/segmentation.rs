//! Trigger-driven segmentation engine.
//!
//! This is the state machine that ties the stages together. Every sample
//! goes through the same path:
//! 1. Reject malformed input before any buffer is touched
//! 2. Push into the raw buffer and the trigger window (lock-step)
//! 3. Evaluate the trigger with the ratio for the current state
//! 4. Idle: on onset, start a segment and capture pre-trigger context
//! 5. Recording: extract windows every `step_size` samples and check
//!    the end policy; on stop, validate and return the outcome
//!
//! Design: single-threaded and synchronous. Each call completes before the
//! next sample is accepted, so samples are observed strictly in order. The
//! engine owns all of its buffers; run one engine per sensor.

use tracing::{debug, info, trace, warn};

use crate::accumulator::{ActivityTally, SegmentAccumulator};
use crate::buffer::RollingBuffer;
use crate::config::{EndPolicy, SegmentationConfig};
use crate::error::{ConfigError, SampleError};
use crate::extractor::WindowExtractor;
use crate::trigger::{TriggerConfig, TriggerDetector};
use crate::types::{EndReason, EngineState, EngineStats, Sample, SegmentOutcome};
use crate::validator::SegmentValidator;

/// What was lost when the stream ended mid-recording.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscardedSegment {
    pub window_count: usize,
    pub start_time: f64,
    pub activity_ratio: f64,
}

pub struct SegmentationEngine {
    config: SegmentationConfig,

    // Processing stages
    raw: RollingBuffer<Sample>,
    detector: TriggerDetector,
    extractor: WindowExtractor,
    accumulator: SegmentAccumulator,
    validator: SegmentValidator,

    state: EngineState,
    last_timestamp: Option<f64>,

    // Diagnostics
    stats: EngineStats,
}

impl SegmentationEngine {
    /// Create an engine, failing on any invalid parameter.
    pub fn new(config: SegmentationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let step_size = config.step_size();
        info!(
            "Segmentation engine: {} channels, window {} samples, overlap {:.0}%, step {} samples, threshold {}",
            config.channel_count,
            config.window_size,
            config.overlap * 100.0,
            step_size,
            config.trigger_threshold
        );
        debug!(
            "Trigger window {} samples, onset {:.2}, continuation {:.2}, end policy {:?}, sample cap {}, min activity {:.2}",
            config.trigger_window_len,
            config.onset_ratio,
            config.continuation_ratio,
            config.end_policy,
            config.max_recording_samples,
            config.min_activity_ratio
        );

        Ok(Self {
            raw: RollingBuffer::new(config.raw_buffer_capacity),
            detector: TriggerDetector::new(TriggerConfig {
                threshold: config.trigger_threshold,
                onset_ratio: config.onset_ratio,
                continuation_ratio: config.continuation_ratio,
                window_len: config.trigger_window_len,
            }),
            extractor: WindowExtractor::new(config.window_size, step_size, config.timestamp_mode),
            accumulator: SegmentAccumulator::new(),
            validator: SegmentValidator::new(config.min_activity_ratio, step_size),
            state: EngineState::Idle,
            last_timestamp: None,
            stats: EngineStats::default(),
            config,
        })
    }

    /// Process one sample.
    ///
    /// Returns `Ok(Some(outcome))` when this sample ended a recording,
    /// `Ok(None)` otherwise. A malformed sample is rejected with an error
    /// and leaves the engine untouched apart from the rejection counter.
    pub fn on_sample(&mut self, sample: Sample) -> Result<Option<SegmentOutcome>, SampleError> {
        if let Err(err) = self.check_sample(&sample) {
            self.stats.samples_rejected += 1;
            warn!("Rejected sample: {}", err);
            return Err(err);
        }

        let now = sample.timestamp;
        self.last_timestamp = Some(now);
        self.stats.samples_processed += 1;

        let hot = self.detector.observe(&sample);
        self.raw.push(sample);
        let active = self.detector.is_active(self.state);

        trace!(
            "t={:.3}s hot={} active={} state={:?}",
            now,
            hot,
            active,
            self.state
        );

        match self.state {
            EngineState::Idle => {
                if active {
                    self.start_recording(now);
                }
                Ok(None)
            }
            EngineState::Recording => {
                self.accumulator.observe(hot, now);
                if let Some(window) = self.extractor.advance(&self.raw) {
                    self.stats.windows_extracted += 1;
                    self.accumulator.append(window);
                }

                match self.end_condition(active, now) {
                    Some(reason) => Ok(Some(self.stop_recording(reason))),
                    None => Ok(None),
                }
            }
        }
    }

    /// The sample source has ended.
    ///
    /// An unfinished recording is dropped without validation. The engine is
    /// left `Idle` with its counters intact.
    pub fn on_stream_end(&mut self) -> Option<DiscardedSegment> {
        if self.state != EngineState::Recording {
            debug!("Stream ended while idle");
            return None;
        }

        let activity_ratio = self.accumulator.activity().ratio();
        let window_count = self.accumulator.window_count();
        let start_time = self.accumulator.start_time();
        self.accumulator.reset();
        self.state = EngineState::Idle;
        self.stats.segments_discarded += 1;

        info!(
            "Stream ended mid-recording: discarded {} windows (started {:.2}s, activity ratio {:.3})",
            window_count, start_time, activity_ratio
        );

        Some(DiscardedSegment {
            window_count,
            start_time,
            activity_ratio,
        })
    }

    fn check_sample(&self, sample: &Sample) -> Result<(), SampleError> {
        if sample.channels.len() != self.config.channel_count {
            return Err(SampleError::ChannelCount {
                expected: self.config.channel_count,
                actual: sample.channels.len(),
            });
        }
        if !sample.timestamp.is_finite() {
            return Err(SampleError::InvalidTimestamp(sample.timestamp));
        }
        if let Some(previous) = self.last_timestamp {
            if sample.timestamp < previous {
                return Err(SampleError::NonMonotonic {
                    previous,
                    timestamp: sample.timestamp,
                });
            }
        }
        Ok(())
    }

    fn start_recording(&mut self, now: f64) {
        info!(
            "Trigger: Idle -> Recording at {:.3}s (hot ratio {:.2}, peak {})",
            now,
            self.detector.hot_ratio().unwrap_or(0.0),
            self.raw.latest().map(Sample::peak_amplitude).unwrap_or(0)
        );

        self.state = EngineState::Recording;
        self.stats.segments_started += 1;

        let seed = ActivityTally {
            observed: self.detector.len(),
            hot: self.detector.hot_count(),
        };
        self.accumulator.begin(now, seed);

        // Capture the context already in the raw buffer
        self.extractor.restart();
        if let Some(window) = self.extractor.extract_now(&self.raw) {
            self.stats.windows_extracted += 1;
            self.accumulator.append(window);
        }
    }

    fn end_condition(&mut self, active: bool, now: f64) -> Option<EndReason> {
        let elapsed = self.accumulator.elapsed(now);
        let by_policy = match self.config.end_policy {
            EndPolicy::Debounce {
                stability_samples,
                max_duration_secs,
            } => {
                let quiet = self.accumulator.note_detector(active);
                if quiet >= stability_samples {
                    Some(EndReason::Debounced)
                } else if max_duration_secs.is_some_and(|limit| elapsed >= limit) {
                    Some(EndReason::DurationElapsed)
                } else {
                    None
                }
            }
            EndPolicy::FixedDuration { max_duration_secs } => {
                (elapsed >= max_duration_secs).then_some(EndReason::DurationElapsed)
            }
        };

        // Timestamps may stall, so the sample cap backs up every policy
        by_policy.or_else(|| {
            (self.accumulator.recorded_samples() >= self.config.max_recording_samples)
                .then_some(EndReason::SampleLimit)
        })
    }

    fn stop_recording(&mut self, reason: EndReason) -> SegmentOutcome {
        let segment = self.accumulator.finish(reason);
        info!(
            "Trigger: Recording -> Idle ({:?}, {} windows, {:.2}s)",
            reason,
            segment.window_count(),
            segment.end_time - segment.start_time
        );
        self.state = EngineState::Idle;

        let outcome = self.validator.validate(segment);
        match &outcome {
            SegmentOutcome::Accepted(_) => self.stats.segments_accepted += 1,
            SegmentOutcome::Rejected { .. } => self.stats.segments_rejected += 1,
        }
        outcome
    }

    /// Current state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Lifetime counters.
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    /// Windows collected in the current recording (0 when idle).
    pub fn pending_windows(&self) -> usize {
        self.accumulator.window_count()
    }

    /// Raw samples currently retained.
    pub fn buffered_samples(&self) -> usize {
        self.raw.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SegmentationConfig {
        SegmentationConfig {
            channel_count: 1,
            window_size: 4,
            overlap: 0.5,
            trigger_threshold: 10,
            onset_ratio: 0.5,
            continuation_ratio: 0.5,
            trigger_window_len: 4,
            end_policy: EndPolicy::Debounce {
                stability_samples: 2,
                max_duration_secs: None,
            },
            min_activity_ratio: 0.0,
            raw_buffer_capacity: 16,
            ..Default::default()
        }
    }

    fn feed(engine: &mut SegmentationEngine, values: &[i32], t0: usize) -> Vec<SegmentOutcome> {
        values
            .iter()
            .enumerate()
            .filter_map(|(i, &v)| {
                let t = (t0 + i) as f64 * 0.005;
                engine.on_sample(Sample::new(t, vec![v])).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_engine_creation() {
        let engine = SegmentationEngine::new(config()).unwrap();
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(engine.stats(), EngineStats::default());
    }

    #[test]
    fn test_engine_rejects_invalid_config() {
        let bad = SegmentationConfig {
            overlap: 1.5,
            ..config()
        };
        assert!(SegmentationEngine::new(bad).is_err());
    }

    #[test]
    fn test_onset_captures_pre_trigger_window() {
        let mut engine = SegmentationEngine::new(config()).unwrap();
        feed(&mut engine, &[0, 0, 20, 20], 0);

        assert_eq!(engine.state(), EngineState::Recording);
        assert_eq!(engine.pending_windows(), 1);
        assert_eq!(engine.stats().segments_started, 1);
    }

    #[test]
    fn test_debounce_ends_recording() {
        let mut engine = SegmentationEngine::new(config()).unwrap();
        let outcomes = feed(&mut engine, &[20, 20, 20, 20, 20, 20, 0, 0, 0, 0], 0);

        assert_eq!(outcomes.len(), 1);
        assert_eq!(engine.state(), EngineState::Idle);
        match &outcomes[0] {
            SegmentOutcome::Accepted(record) => {
                assert_eq!(record.end_reason, EndReason::Debounced);
                assert!(record.window_count >= 2);
                assert!(record.windows.iter().all(|w| w.len() == 4));
            }
            other => panic!("expected acceptance, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_arity_is_rejected_before_buffers() {
        let mut engine = SegmentationEngine::new(config()).unwrap();
        let err = engine.on_sample(Sample::new(0.0, vec![1, 2])).unwrap_err();

        assert_eq!(
            err,
            SampleError::ChannelCount {
                expected: 1,
                actual: 2
            }
        );
        assert_eq!(engine.buffered_samples(), 0);
        assert_eq!(engine.stats().samples_rejected, 1);
        assert_eq!(engine.stats().samples_processed, 0);
    }

    #[test]
    fn test_non_monotonic_timestamp_is_rejected() {
        let mut engine = SegmentationEngine::new(config()).unwrap();
        engine.on_sample(Sample::new(1.0, vec![0])).unwrap();
        engine.on_sample(Sample::new(1.0, vec![0])).unwrap();

        let err = engine.on_sample(Sample::new(0.5, vec![0])).unwrap_err();
        assert!(matches!(err, SampleError::NonMonotonic { .. }));
        assert_eq!(engine.buffered_samples(), 2);

        let err = engine.on_sample(Sample::new(f64::NAN, vec![0])).unwrap_err();
        assert!(matches!(err, SampleError::InvalidTimestamp(_)));

        // Stream continues after rejection
        assert!(engine.on_sample(Sample::new(1.1, vec![0])).is_ok());
    }

    #[test]
    fn test_stream_end_discards_partial_segment() {
        let mut engine = SegmentationEngine::new(config()).unwrap();
        feed(&mut engine, &[20; 8], 0);
        assert_eq!(engine.state(), EngineState::Recording);

        let discarded = engine.on_stream_end().unwrap();
        assert!(discarded.window_count > 0);
        assert_eq!(discarded.activity_ratio, 1.0);
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(engine.pending_windows(), 0);

        let stats = engine.stats();
        assert_eq!(stats.segments_discarded, 1);
        assert_eq!(stats.segments_accepted, 0);
        assert_eq!(stats.samples_processed, 8);
    }

    #[test]
    fn test_stream_end_while_idle() {
        let mut engine = SegmentationEngine::new(config()).unwrap();
        feed(&mut engine, &[0; 8], 0);
        assert!(engine.on_stream_end().is_none());
        assert_eq!(engine.stats().segments_discarded, 0);
    }

    #[test]
    fn test_sample_limit_ends_uncapped_debounce() {
        let uncapped = SegmentationConfig {
            end_policy: EndPolicy::Debounce {
                stability_samples: 2,
                max_duration_secs: None,
            },
            max_recording_samples: 10,
            ..config()
        };
        let mut engine = SegmentationEngine::new(uncapped).unwrap();
        let outcomes = feed(&mut engine, &[20; 4 + 10], 0);

        assert_eq!(outcomes.len(), 1);
        match &outcomes[0] {
            SegmentOutcome::Accepted(record) => {
                assert_eq!(record.end_reason, EndReason::SampleLimit);
                // Onset window plus one every 2 samples over 10 samples
                assert_eq!(record.window_count, 6);
            }
            other => panic!("expected acceptance, got {:?}", other),
        }
    }

    #[test]
    fn test_sample_limit_ends_stalled_fixed_duration() {
        let fixed = SegmentationConfig {
            end_policy: EndPolicy::FixedDuration {
                max_duration_secs: 1.0,
            },
            max_recording_samples: 10,
            ..config()
        };
        let mut engine = SegmentationEngine::new(fixed).unwrap();

        // The clock never moves, so only the sample cap can stop this
        let mut reasons = Vec::new();
        for _ in 0..100 {
            if let Some(outcome) = engine.on_sample(Sample::new(3.0, vec![20])).unwrap() {
                match outcome {
                    SegmentOutcome::Accepted(record) => reasons.push(record.end_reason),
                    SegmentOutcome::Rejected { end_reason, .. } => reasons.push(end_reason),
                }
            }
            assert!(engine.pending_windows() <= 6);
        }

        assert!(!reasons.is_empty());
        assert!(reasons.iter().all(|&r| r == EndReason::SampleLimit));
    }

    #[test]
    fn test_debounce_duration_cap() {
        let capped = SegmentationConfig {
            end_policy: EndPolicy::Debounce {
                stability_samples: 100,
                max_duration_secs: Some(0.05),
            },
            ..config()
        };
        let mut engine = SegmentationEngine::new(capped).unwrap();
        let outcomes = feed(&mut engine, &[20; 40], 0);

        assert!(!outcomes.is_empty());
        match &outcomes[0] {
            SegmentOutcome::Accepted(record) => {
                assert_eq!(record.end_reason, EndReason::DurationElapsed);
                assert!(record.duration() >= 0.05 - 1e-9);
            }
            other => panic!("expected acceptance, got {:?}", other),
        }
    }
}
