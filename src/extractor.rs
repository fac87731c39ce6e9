//! Overlapping window extraction.
//!
//! While the engine records, the extractor copies the newest `window_size`
//! raw samples into a window every `step_size` samples. Consecutive windows
//! therefore share `window_size - step_size` samples.
//!
//! The consumption position is tracked as a counter of samples seen since
//! the last extraction; the raw buffer itself is never trimmed here, it only
//! evicts through its own capacity.

use crate::buffer::RollingBuffer;
use crate::types::{Sample, TimestampMode, Window};

#[derive(Debug, Clone)]
pub struct WindowExtractor {
    window_size: usize,
    step_size: usize,
    timestamp_mode: TimestampMode,

    // Samples arrived since the last extraction
    since_last: usize,
    extracted_any: bool,
}

impl WindowExtractor {
    pub fn new(window_size: usize, step_size: usize, timestamp_mode: TimestampMode) -> Self {
        Self {
            window_size,
            step_size: step_size.max(1),
            timestamp_mode,
            since_last: 0,
            extracted_any: false,
        }
    }

    /// Start a new segment. The next `extract_now` call is unconditional.
    pub fn restart(&mut self) {
        self.since_last = 0;
        self.extracted_any = false;
    }

    /// Extract the newest `window_size` samples if the buffer holds enough.
    ///
    /// Returns `None` (no-op) when the buffer is short. A successful call
    /// resets the step counter.
    pub fn extract_now(&mut self, raw: &RollingBuffer<Sample>) -> Option<Window> {
        if raw.len() < self.window_size {
            return None;
        }
        let samples = raw.snapshot(self.window_size);
        self.since_last = 0;
        self.extracted_any = true;
        Some(Window::from_samples(samples, self.timestamp_mode))
    }

    /// Account for one newly arrived sample and extract if a step completed.
    ///
    /// Before the first extraction of a segment this waits only for the
    /// buffer to hold a full window; afterwards it waits for `step_size`
    /// new samples.
    pub fn advance(&mut self, raw: &RollingBuffer<Sample>) -> Option<Window> {
        self.since_last += 1;
        if self.extracted_any && self.since_last < self.step_size {
            return None;
        }
        self.extract_now(raw)
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn step_size(&self) -> usize {
        self.step_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(i: usize) -> Sample {
        Sample::new(i as f64 * 0.005, vec![i as i32])
    }

    fn first_channel(window: &Window) -> Vec<i32> {
        window.samples().iter().map(|s| s.channels[0]).collect()
    }

    /// Feed `count` samples with extraction running from the first one.
    fn run(extractor: &mut WindowExtractor, capacity: usize, count: usize) -> Vec<Window> {
        let mut raw = RollingBuffer::new(capacity);
        let mut windows = Vec::new();
        extractor.restart();
        for i in 0..count {
            raw.push(sample(i));
            let window = if i == 0 {
                extractor.extract_now(&raw)
            } else {
                extractor.advance(&raw)
            };
            windows.extend(window);
        }
        windows
    }

    #[test]
    fn test_short_buffer_is_noop() {
        let mut extractor = WindowExtractor::new(10, 5, TimestampMode::PerSample);
        let mut raw = RollingBuffer::new(100);
        for i in 0..9 {
            raw.push(sample(i));
        }
        assert!(extractor.extract_now(&raw).is_none());
    }

    #[test]
    fn test_overlapping_positions() {
        let mut extractor = WindowExtractor::new(10, 5, TimestampMode::PerSample);
        let windows = run(&mut extractor, 100, 20);

        assert_eq!(windows.len(), 3);
        assert_eq!(first_channel(&windows[0]), (0..10).collect::<Vec<_>>());
        assert_eq!(first_channel(&windows[1]), (5..15).collect::<Vec<_>>());
        assert_eq!(first_channel(&windows[2]), (10..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_partial_step_never_emits_short_window() {
        let mut extractor = WindowExtractor::new(10, 5, TimestampMode::PerSample);
        let windows = run(&mut extractor, 100, 24);
        assert_eq!(windows.len(), 3);
        assert!(windows.iter().all(|w| w.len() == 10));

        let windows = run(&mut extractor, 100, 25);
        assert_eq!(windows.len(), 4);
        assert_eq!(first_channel(&windows[3]), (15..25).collect::<Vec<_>>());
    }

    #[test]
    fn test_overlap_consistency() {
        let mut extractor = WindowExtractor::new(8, 3, TimestampMode::PerSample);
        let windows = run(&mut extractor, 8, 60);
        assert!(windows.len() > 5);

        for pair in windows.windows(2) {
            let older = first_channel(&pair[0]);
            let newer = first_channel(&pair[1]);
            assert_eq!(&newer[..8 - 3], &older[3..]);
        }
    }

    #[test]
    fn test_extract_captures_existing_context() {
        let mut extractor = WindowExtractor::new(4, 2, TimestampMode::PerSample);
        let mut raw = RollingBuffer::new(16);
        for i in 0..12 {
            raw.push(sample(i));
        }

        let window = extractor.extract_now(&raw).unwrap();
        assert_eq!(first_channel(&window), vec![8, 9, 10, 11]);

        raw.push(sample(12));
        assert!(extractor.advance(&raw).is_none());
        raw.push(sample(13));
        let window = extractor.advance(&raw).unwrap();
        assert_eq!(first_channel(&window), vec![10, 11, 12, 13]);
    }

    #[test]
    fn test_per_window_timestamps() {
        let mut extractor = WindowExtractor::new(5, 5, TimestampMode::PerWindow);
        let windows = run(&mut extractor, 10, 10);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].timestamps(), &[sample(4).timestamp; 5]);
        assert_eq!(windows[1].timestamps(), &[sample(9).timestamp; 5]);
    }
}
