//! Engine configuration.
//!
//! One flat, immutable parameter set shared by every stage of the engine.
//! Defaults reproduce the acquisition setup used for the Myo armband
//! recordings: 8 channels at 200 Hz, 50-sample windows with 60% overlap,
//! and an amplitude threshold of 30.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::TimestampMode;

/// Rule that ends an active recording.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum EndPolicy {
    /// Stop after `stability_samples` consecutive inactive detector readings.
    /// `max_duration_secs` optionally caps the recording as well.
    Debounce {
        stability_samples: usize,
        #[serde(default)]
        max_duration_secs: Option<f64>,
    },

    /// Stop unconditionally once the recording has lasted `max_duration_secs`.
    FixedDuration { max_duration_secs: f64 },
}

impl Default for EndPolicy {
    fn default() -> Self {
        EndPolicy::Debounce {
            stability_samples: 40, // 200ms at 200Hz
            max_duration_secs: Some(5.0),
        }
    }
}

/// Configuration for the trigger segmentation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Channels per sample. Typical: 8 for an EMG armband.
    pub channel_count: usize,

    /// Samples per extracted window. Typical: 50 (250ms at 200Hz).
    pub window_size: usize,

    /// Fraction of a window shared with its successor. Range: [0, 1).
    pub overlap: f64,

    /// Per-channel absolute amplitude a sample must exceed to count as hot.
    pub trigger_threshold: u32,

    /// Hot fraction of the trigger window needed to start recording. Range: (0, 1].
    pub onset_ratio: f64,

    /// Hot fraction needed to keep recording. Range: (0, onset_ratio].
    pub continuation_ratio: f64,

    /// Samples examined per trigger decision. Typical: 20.
    pub trigger_window_len: usize,

    /// How a recording ends.
    pub end_policy: EndPolicy,

    /// Hard cap on samples observed in one recording, applied under every
    /// end policy. Bounds segment memory even when timestamps stall.
    pub max_recording_samples: usize,

    /// Minimum hot fraction for a finished segment to be kept. Range: [0, 1].
    pub min_activity_ratio: f64,

    /// Raw samples retained for window extraction. Must be >= window_size.
    pub raw_buffer_capacity: usize,

    /// Timestamp layout of extracted windows.
    pub timestamp_mode: TimestampMode,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            channel_count: 8,
            window_size: 50,
            overlap: 0.6,
            trigger_threshold: 30,
            onset_ratio: 0.5,
            continuation_ratio: 0.3,
            trigger_window_len: 20,
            end_policy: EndPolicy::default(),
            max_recording_samples: 2000, // 10s at 200Hz
            min_activity_ratio: 0.3,
            raw_buffer_capacity: 2000,
            timestamp_mode: TimestampMode::PerSample,
        }
    }
}

impl SegmentationConfig {
    /// Distance in samples between consecutive window starts.
    pub fn step_size(&self) -> usize {
        (self.window_size as f64 * (1.0 - self.overlap)).round() as usize
    }

    /// Check every constraint; the first violation wins.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_count == 0 {
            return Err(ConfigError::NoChannels);
        }
        if self.window_size == 0 {
            return Err(ConfigError::EmptyWindow);
        }
        if !(0.0..1.0).contains(&self.overlap) {
            return Err(ConfigError::OverlapOutOfRange(self.overlap));
        }
        if self.step_size() == 0 {
            return Err(ConfigError::ZeroStep {
                window_size: self.window_size,
                overlap: self.overlap,
            });
        }
        if self.trigger_threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        if self.trigger_window_len == 0 {
            return Err(ConfigError::EmptyTriggerWindow);
        }
        check_ratio("onset_ratio", "(0, 1]", self.onset_ratio, |r| r > 0.0 && r <= 1.0)?;
        check_ratio("continuation_ratio", "(0, 1]", self.continuation_ratio, |r| {
            r > 0.0 && r <= 1.0
        })?;
        if self.continuation_ratio > self.onset_ratio {
            return Err(ConfigError::ContinuationAboveOnset {
                onset: self.onset_ratio,
                continuation: self.continuation_ratio,
            });
        }
        check_ratio("min_activity_ratio", "[0, 1]", self.min_activity_ratio, |r| {
            (0.0..=1.0).contains(&r)
        })?;
        if self.raw_buffer_capacity < self.window_size {
            return Err(ConfigError::RawBufferTooSmall {
                capacity: self.raw_buffer_capacity,
                window_size: self.window_size,
            });
        }

        match self.end_policy {
            EndPolicy::Debounce {
                stability_samples,
                max_duration_secs,
            } => {
                if stability_samples == 0 {
                    return Err(ConfigError::ZeroStability);
                }
                if let Some(limit) = max_duration_secs {
                    check_duration(limit)?;
                }
            }
            EndPolicy::FixedDuration { max_duration_secs } => check_duration(max_duration_secs)?,
        }
        if self.max_recording_samples == 0 {
            return Err(ConfigError::ZeroRecordingLimit);
        }

        Ok(())
    }
}

fn check_ratio(
    name: &'static str,
    range: &'static str,
    value: f64,
    in_range: impl Fn(f64) -> bool,
) -> Result<(), ConfigError> {
    // NaN fails every comparison, so it lands here too
    if in_range(value) {
        Ok(())
    } else {
        Err(ConfigError::RatioOutOfRange { name, range, value })
    }
}

fn check_duration(secs: f64) -> Result<(), ConfigError> {
    if secs.is_finite() && secs > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidDuration(secs))
    }
}
