//! EMG Trigger Segmentation Engine
//!
//! A streaming engine that watches a multi-channel integer sample stream
//! (e.g. an 8-channel EMG armband at 200 Hz) and cuts out the spans worth
//! keeping: muscle activation bursts, delivered as sets of fixed-length,
//! overlapping windows.
//!
//! # Design Philosophy
//!
//! - **Bounded memory**: rolling buffers for raw samples and trigger state,
//!   per-segment accumulation only, finished segments handed off at once.
//! - **Hysteresis**: starting a recording is harder than staying in one, so
//!   a signal at the boundary does not flicker.
//! - **Fail-loud**: bad configuration fails construction; malformed samples
//!   are rejected and counted, never silently absorbed.
//! - **Order-preserving**: one sample at a time, single-threaded, no
//!   reordering. Cross-thread sources go through a bounded SPSC channel.
//!
//! # Example
//!
//! ```no_run
//! use emg_trigger::{Sample, SegmentOutcome, SegmentationConfig, SegmentationEngine};
//!
//! let mut engine = SegmentationEngine::new(SegmentationConfig::default())?;
//!
//! for i in 0..400 {
//!     let sample = Sample::new(i as f64 / 200.0, vec![0; 8]);
//!     if let Ok(Some(SegmentOutcome::Accepted(record))) = engine.on_sample(sample) {
//!         println!("segment with {} windows", record.window_count);
//!     }
//! }
//! engine.on_stream_end();
//! # Ok::<(), emg_trigger::ConfigError>(())
//! ```

pub mod accumulator;
pub mod buffer;
pub mod config;
pub mod error;
pub mod export;
pub mod extractor;
pub mod pipeline;
pub mod replay;
pub mod segmentation;
pub mod trigger;
pub mod types;
pub mod validator;


// Re-export commonly used types
pub use buffer::RollingBuffer;
pub use config::{EndPolicy, SegmentationConfig};
pub use error::{ConfigError, FeedError, ReplayError, SampleError, SinkError};
pub use export::{JsonLinesExporter, MemorySink, SegmentSink};
pub use pipeline::{run_stream, sample_channel, SampleReceiver, SampleSender, StreamReport, StreamRunner};
pub use replay::SampleReader;
pub use segmentation::{DiscardedSegment, SegmentationEngine};
pub use types::{
    EndReason, EngineState, EngineStats, Sample, SegmentOutcome, SegmentRecord, TimestampMode,
    Window,
};
