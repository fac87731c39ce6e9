//! Segment-level accept/reject decision.
//!
//! A short burst can start a recording that then decays into near silence
//! before the end condition fires. The validator keeps only segments whose
//! overall hot fraction reaches `min_activity_ratio` (inclusive).

use tracing::{info, warn};

use crate::accumulator::CompletedSegment;
use crate::trigger::meets_ratio;
use crate::types::{SegmentOutcome, SegmentRecord};

#[derive(Debug, Clone, Copy)]
pub struct SegmentValidator {
    min_activity_ratio: f64,
    step_size: usize,
}

impl SegmentValidator {
    pub fn new(min_activity_ratio: f64, step_size: usize) -> Self {
        Self {
            min_activity_ratio,
            step_size,
        }
    }

    /// Whether a hot/observed tally clears the acceptance threshold.
    pub fn accepts(&self, hot: usize, observed: usize) -> bool {
        if observed == 0 {
            return self.min_activity_ratio <= 0.0;
        }
        meets_ratio(hot, observed, self.min_activity_ratio)
    }

    /// Consume a finished recording and decide its fate.
    ///
    /// A segment without a single window has nothing to persist and is
    /// rejected whatever its activity.
    pub fn validate(&self, segment: CompletedSegment) -> SegmentOutcome {
        let activity_ratio = segment.activity.ratio();
        let window_count = segment.window_count();

        if window_count == 0 {
            warn!(
                "Segment rejected: no complete window (activity ratio {:.3}, {:.2}s)",
                activity_ratio,
                segment.end_time - segment.start_time
            );
            return SegmentOutcome::Rejected {
                activity_ratio,
                window_count,
                end_reason: segment.end_reason,
            };
        }

        if !self.accepts(segment.activity.hot, segment.activity.observed) {
            info!(
                "Segment rejected: activity ratio {:.3} < {:.3} ({} windows, {}/{} hot samples)",
                activity_ratio,
                self.min_activity_ratio,
                window_count,
                segment.activity.hot,
                segment.activity.observed
            );
            return SegmentOutcome::Rejected {
                activity_ratio,
                window_count,
                end_reason: segment.end_reason,
            };
        }

        info!(
            "Segment accepted: {} windows, activity ratio {:.3}, {:.2}s-{:.2}s",
            window_count, activity_ratio, segment.start_time, segment.end_time
        );

        let mut windows = Vec::with_capacity(window_count);
        let mut timestamps = Vec::with_capacity(window_count);
        for window in &segment.windows {
            windows.push(window.channel_rows());
            timestamps.push(window.timestamps().to_vec());
        }

        SegmentOutcome::Accepted(SegmentRecord {
            windows,
            timestamps,
            window_count,
            step_size: self.step_size,
            start_time: segment.start_time,
            end_time: segment.end_time,
            activity_ratio,
            end_reason: segment.end_reason,
        })
    }
}
