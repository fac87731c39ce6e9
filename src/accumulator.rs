//! In-progress segment bookkeeping.
//!
//! The accumulator owns everything about the recording currently underway:
//! the windows extracted so far, when the recording started, how many
//! consecutive quiet readings have been seen, and the hot/observed sample
//! tally the validator needs. Windows can only be appended; the whole
//! segment is handed off by value when the recording stops.

use crate::types::{EndReason, Window};

/// Hot and total sample counts over a recording's extent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityTally {
    pub observed: usize,
    pub hot: usize,
}

impl ActivityTally {
    pub fn record(&mut self, hot: bool) {
        self.observed += 1;
        if hot {
            self.hot += 1;
        }
    }

    /// Fraction of hot samples. An empty tally has ratio 0.
    pub fn ratio(&self) -> f64 {
        if self.observed == 0 {
            0.0
        } else {
            self.hot as f64 / self.observed as f64
        }
    }
}

/// A finished recording awaiting validation.
#[derive(Debug, Clone)]
pub struct CompletedSegment {
    pub windows: Vec<Window>,
    pub start_time: f64,
    pub end_time: f64,
    pub activity: ActivityTally,
    pub end_reason: EndReason,
}

impl CompletedSegment {
    pub fn window_count(&self) -> usize {
        self.windows.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SegmentAccumulator {
    windows: Vec<Window>,
    start_time: f64,
    last_time: f64,
    stability_counter: usize,
    activity: ActivityTally,
    recorded_samples: usize,
}

impl SegmentAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop any contents and start a recording at `start_time`.
    ///
    /// `seed` is the activity already observed in the trigger window, i.e.
    /// the samples that caused the onset.
    pub fn begin(&mut self, start_time: f64, seed: ActivityTally) {
        self.reset();
        self.start_time = start_time;
        self.last_time = start_time;
        self.activity = seed;
    }

    pub fn append(&mut self, window: Window) {
        self.windows.push(window);
    }

    /// Count one sample observed while recording.
    pub fn observe(&mut self, hot: bool, timestamp: f64) {
        self.activity.record(hot);
        self.recorded_samples += 1;
        self.last_time = timestamp;
    }

    /// Feed one detector reading into the debounce counter.
    ///
    /// An active reading resets the counter; returns the updated count.
    pub fn note_detector(&mut self, active: bool) -> usize {
        if active {
            self.stability_counter = 0;
        } else {
            self.stability_counter += 1;
        }
        self.stability_counter
    }

    /// Seconds since the recording started, measured on sample timestamps.
    pub fn elapsed(&self, now: f64) -> f64 {
        now - self.start_time
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    /// Samples observed since onset, not counting the seed.
    pub fn recorded_samples(&self) -> usize {
        self.recorded_samples
    }

    pub fn stability_counter(&self) -> usize {
        self.stability_counter
    }

    pub fn activity(&self) -> ActivityTally {
        self.activity
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn reset(&mut self) {
        self.windows.clear();
        self.start_time = 0.0;
        self.last_time = 0.0;
        self.stability_counter = 0;
        self.activity = ActivityTally::default();
        self.recorded_samples = 0;
    }

    /// Hand off the recording and leave the accumulator empty.
    pub fn finish(&mut self, end_reason: EndReason) -> CompletedSegment {
        let segment = CompletedSegment {
            windows: std::mem::take(&mut self.windows),
            start_time: self.start_time,
            end_time: self.last_time,
            activity: self.activity,
            end_reason,
        };
        self.reset();
        segment
    }
}
