//! Core data types for the EMG trigger engine.
//!
//! This module defines the values that flow through the segmentation
//! pipeline: raw samples in, fixed-length windows in the middle, and
//! completed segment records out.
//!
//! Design principle: if a concept exists, it gets a type. Windows and
//! segment records are immutable once built; only the accumulator may grow
//! a segment, and only by appending.

use serde::{Deserialize, Serialize};

/// A single synchronized multi-channel reading.
///
/// This is the minimal input contract: one signed integer per electrode
/// channel plus a monotonic timestamp in seconds relative to stream start.
/// The engine never modifies a sample, only copies it into windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds since stream start. Must be non-decreasing within a stream.
    pub timestamp: f64,

    /// One reading per channel. Arity is fixed per engine.
    pub channels: Vec<i32>,
}

impl Sample {
    /// Creates a new sample.
    pub fn new(timestamp: f64, channels: Vec<i32>) -> Self {
        Self {
            timestamp,
            channels,
        }
    }

    /// Largest absolute channel value.
    pub fn peak_amplitude(&self) -> u32 {
        self.channels
            .iter()
            .map(|c| c.unsigned_abs())
            .max()
            .unwrap_or(0)
    }

    /// A sample is hot when any channel's magnitude strictly exceeds the threshold.
    pub fn is_hot(&self, threshold: u32) -> bool {
        self.channels.iter().any(|c| c.unsigned_abs() > threshold)
    }
}

/// Engine state. Initial state is `Idle`; there is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    /// Waiting for the onset condition.
    Idle,
    /// Collecting windows into a segment.
    Recording,
}

/// How timestamps are attached to an extracted window.
///
/// Stored data exists in both layouts, so this is a configuration choice
/// rather than a fixed rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampMode {
    /// Every position carries its own sample's timestamp.
    #[default]
    PerSample,
    /// Every position carries the window's representative timestamp
    /// (the newest sample's), repeated `window_size` times.
    PerWindow,
}

/// A fixed-length contiguous slice of samples, oldest first.
///
/// Only the extractor builds windows and it never builds a short one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Window {
    samples: Vec<Sample>,
    timestamps: Vec<f64>,
}

impl Window {
    /// Builds a window from a full slice of samples.
    pub(crate) fn from_samples(samples: Vec<Sample>, mode: TimestampMode) -> Self {
        let timestamps = match mode {
            TimestampMode::PerSample => samples.iter().map(|s| s.timestamp).collect(),
            TimestampMode::PerWindow => {
                let stamp = samples.last().map(|s| s.timestamp).unwrap_or(0.0);
                vec![stamp; samples.len()]
            }
        };
        Self {
            samples,
            timestamps,
        }
    }

    /// Samples in arrival order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Timestamps aligned with `samples()`, per the configured mode.
    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// Number of samples (always the configured window size).
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Channel values as rows, the layout downstream readers expect.
    pub fn channel_rows(&self) -> Vec<Vec<i32>> {
        self.samples.iter().map(|s| s.channels.clone()).collect()
    }
}

/// Why a recording stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The detector stayed inactive for `stability_samples` readings.
    Debounced,
    /// The maximum recording duration elapsed.
    DurationElapsed,
    /// The recording reached `max_recording_samples`, whatever the clock says.
    SampleLimit,
}

/// An accepted segment as handed to a sink.
///
/// `windows` and `timestamps` are parallel: `timestamps[i]` is the
/// timestamp sequence of `windows[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    /// Channel rows per window: `windows[w][sample][channel]`.
    pub windows: Vec<Vec<Vec<i32>>>,
    /// Timestamp sequence per window.
    pub timestamps: Vec<Vec<f64>>,
    /// Number of windows.
    pub window_count: usize,
    /// Distance in samples between consecutive window starts.
    pub step_size: usize,
    /// Time the trigger fired.
    pub start_time: f64,
    /// Time recording stopped.
    pub end_time: f64,
    /// Fraction of hot samples over the recording's extent.
    pub activity_ratio: f64,
    pub end_reason: EndReason,
}

impl SegmentRecord {
    /// Rebuilds the contiguous sample rows covered by the segment.
    ///
    /// The first window is taken whole; each following window contributes
    /// only its newest `step_size` rows, which are the samples not already
    /// covered by its predecessor.
    pub fn stitched(&self) -> (Vec<Vec<i32>>, Vec<f64>) {
        let mut rows = Vec::new();
        let mut times = Vec::new();

        for (i, (window, stamps)) in self.windows.iter().zip(&self.timestamps).enumerate() {
            let skip = if i == 0 {
                0
            } else {
                window.len().saturating_sub(self.step_size)
            };
            rows.extend(window.iter().skip(skip).cloned());
            times.extend(stamps.iter().skip(skip).copied());
        }

        (rows, times)
    }

    /// Stitched values of one channel, or `None` if the channel does not exist.
    pub fn channel_trace(&self, channel: usize) -> Option<Vec<i32>> {
        let (rows, _) = self.stitched();
        rows.iter().map(|row| row.get(channel).copied()).collect()
    }

    /// Recording length in seconds.
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Result of a finished recording.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentOutcome {
    /// Passed validation; ready for the sink.
    Accepted(SegmentRecord),
    /// Failed validation; windows were dropped.
    Rejected {
        activity_ratio: f64,
        window_count: usize,
        end_reason: EndReason,
    },
}

/// Counters kept across the engine's whole life.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub samples_processed: u64,
    pub samples_rejected: u64,
    pub windows_extracted: u64,
    pub segments_started: u64,
    pub segments_accepted: u64,
    pub segments_rejected: u64,
    /// Recordings cut short by stream end.
    pub segments_discarded: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(start: usize, len: usize) -> Vec<Sample> {
        (start..start + len)
            .map(|i| Sample::new(i as f64 * 0.005, vec![i as i32, -(i as i32)]))
            .collect()
    }

    #[test]
    fn test_sample_hot_is_strict() {
        let sample = Sample::new(0.0, vec![3, -10, 4]);
        assert!(!sample.is_hot(10));
        assert!(sample.is_hot(9));
        assert_eq!(sample.peak_amplitude(), 10);
    }

    #[test]
    fn test_sample_hot_handles_min_value() {
        let sample = Sample::new(0.0, vec![i32::MIN]);
        assert!(sample.is_hot(u32::MAX - 1));
    }

    #[test]
    fn test_window_per_sample_timestamps() {
        let window = Window::from_samples(ramp(0, 4), TimestampMode::PerSample);
        assert_eq!(window.len(), 4);
        assert_eq!(window.timestamps(), &[0.0, 0.005, 0.01, 0.015]);
    }

    #[test]
    fn test_window_per_window_timestamps() {
        let window = Window::from_samples(ramp(0, 4), TimestampMode::PerWindow);
        assert_eq!(window.timestamps(), &[0.015; 4]);
    }

    #[test]
    fn test_record_stitching_removes_overlap() {
        let first = Window::from_samples(ramp(0, 6), TimestampMode::PerSample);
        let second = Window::from_samples(ramp(3, 6), TimestampMode::PerSample);
        let record = SegmentRecord {
            windows: vec![first.channel_rows(), second.channel_rows()],
            timestamps: vec![first.timestamps().to_vec(), second.timestamps().to_vec()],
            window_count: 2,
            step_size: 3,
            start_time: 0.0,
            end_time: 0.04,
            activity_ratio: 1.0,
            end_reason: EndReason::Debounced,
        };

        let (rows, times) = record.stitched();
        assert_eq!(rows.len(), 9);
        assert_eq!(times.len(), 9);
        assert_eq!(record.channel_trace(0), Some((0..9).collect::<Vec<i32>>()));
        assert_eq!(record.channel_trace(5), None);
    }
}
