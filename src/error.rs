//! Error types for the segmentation engine and its collaborators.
//!
//! Configuration errors are fatal and surface at construction. Everything
//! else describes a single rejected input or a failed hand-off and leaves
//! the engine in a consistent state.

use thiserror::Error;

/// Invalid engine configuration. Construction fails instead of producing an
/// engine that could misbehave silently.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("channel_count must be at least 1")]
    NoChannels,

    #[error("window_size must be at least 1")]
    EmptyWindow,

    #[error("overlap must be in [0, 1), got {0}")]
    OverlapOutOfRange(f64),

    #[error("window_size {window_size} with overlap {overlap} yields a zero step size")]
    ZeroStep { window_size: usize, overlap: f64 },

    #[error("trigger_threshold must be greater than 0")]
    ZeroThreshold,

    #[error("trigger_window_len must be at least 1")]
    EmptyTriggerWindow,

    #[error("{name} must be in {range}, got {value}")]
    RatioOutOfRange {
        name: &'static str,
        range: &'static str,
        value: f64,
    },

    #[error("continuation_ratio {continuation} exceeds onset_ratio {onset}")]
    ContinuationAboveOnset { onset: f64, continuation: f64 },

    #[error("raw_buffer_capacity {capacity} is smaller than window_size {window_size}")]
    RawBufferTooSmall { capacity: usize, window_size: usize },

    #[error("stability_samples must be at least 1")]
    ZeroStability,

    #[error("max recording duration must be a positive number of seconds, got {0}")]
    InvalidDuration(f64),

    #[error("max_recording_samples must be at least 1")]
    ZeroRecordingLimit,
}

/// A sample rejected before it reached any buffer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    #[error("expected {expected} channels, got {actual}")]
    ChannelCount { expected: usize, actual: usize },

    #[error("timestamp {0} is not a finite number")]
    InvalidTimestamp(f64),

    #[error("timestamp {timestamp} precedes previous sample at {previous}")]
    NonMonotonic { previous: f64, timestamp: f64 },
}

/// Failure handing a sample to the engine's input channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// The channel is full; the sample was dropped and counted.
    #[error("sample channel full, sample dropped ({dropped} dropped so far)")]
    Backpressure { dropped: u64 },

    /// The consuming side is gone.
    #[error("sample channel closed")]
    Closed,
}

/// Failure persisting an accepted segment.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error writing segment: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize segment: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Malformed line in a recorded sample stream.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("I/O error reading stream: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}
