//! Stream plumbing between a sample source and the engine.
//!
//! The source (a device callback thread, a file replay, ...) pushes samples
//! into a bounded single-producer/single-consumer channel; the consuming side
//! drives one `SegmentationEngine` and hands accepted segments straight to a
//! sink, so nothing accumulates beyond the segment in progress.
//!
//! # Drops
//!
//! A full channel never blocks the source silently and never swallows a
//! sample: `SampleSender::offer` fails with `FeedError::Backpressure` and the
//! drop is counted. The count is shared with the receiver and ends up in the
//! `StreamReport`.
//!
//! # Stream end
//!
//! Dropping the sender ends the stream. The runner then calls
//! `on_stream_end`, which discards any unfinished recording.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{FeedError, SinkError};
use crate::export::SegmentSink;
use crate::segmentation::{DiscardedSegment, SegmentationEngine};
use crate::types::{EngineStats, Sample, SegmentOutcome};

/// Producer half of the sample channel.
pub struct SampleSender {
    tx: SyncSender<Sample>,
    dropped: Arc<AtomicU64>,
}

impl SampleSender {
    /// Enqueue without blocking. A full channel drops the sample and reports it.
    pub fn offer(&self, sample: Sample) -> Result<(), FeedError> {
        match self.tx.try_send(sample) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!("Sample channel full, dropped sample ({} total)", dropped);
                Err(FeedError::Backpressure { dropped })
            }
            Err(TrySendError::Disconnected(_)) => Err(FeedError::Closed),
        }
    }

    /// Enqueue, waiting for space. For sources that can afford to stall.
    pub fn send(&self, sample: Sample) -> Result<(), FeedError> {
        self.tx.send(sample).map_err(|_| FeedError::Closed)
    }

    /// Samples dropped by `offer` so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Consumer half of the sample channel.
pub struct SampleReceiver {
    rx: Receiver<Sample>,
    dropped: Arc<AtomicU64>,
}

impl SampleReceiver {
    /// Samples the producer had to drop so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Create a bounded sample channel holding at most `capacity` samples.
pub fn sample_channel(capacity: usize) -> (SampleSender, SampleReceiver) {
    let (tx, rx) = mpsc::sync_channel(capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    (
        SampleSender {
            tx,
            dropped: Arc::clone(&dropped),
        },
        SampleReceiver { rx, dropped },
    )
}

/// Summary of one complete stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamReport {
    pub stats: EngineStats,
    /// Samples lost to channel backpressure.
    pub dropped_samples: u64,
    /// Recording cut short by stream end, if any.
    pub discarded: Option<DiscardedSegment>,
}

/// Drive an engine with one stream's samples.
///
/// Per-sample processing and the sink hand-off both live on this thread, in
/// arrival order.
pub struct StreamRunner<S: SegmentSink> {
    engine: SegmentationEngine,
    sink: S,
}

impl<S: SegmentSink> StreamRunner<S> {
    pub fn new(engine: SegmentationEngine, sink: S) -> Self {
        Self { engine, sink }
    }

    /// Process one sample. Malformed samples are logged and skipped.
    pub fn push(&mut self, sample: Sample) -> Result<(), SinkError> {
        match self.engine.on_sample(sample) {
            Ok(Some(SegmentOutcome::Accepted(record))) => self.sink.accept(record),
            Ok(Some(SegmentOutcome::Rejected { .. })) | Ok(None) => Ok(()),
            Err(err) => {
                debug!("Skipping malformed sample: {}", err);
                Ok(())
            }
        }
    }

    /// Consume the channel until the producer hangs up, then finish.
    pub fn run(mut self, receiver: SampleReceiver) -> Result<(StreamReport, S), SinkError> {
        while let Ok(sample) = receiver.rx.recv() {
            self.push(sample)?;
        }
        let dropped = receiver.dropped();
        self.finish(dropped)
    }

    /// End the stream: discard any unfinished recording and flush the sink.
    pub fn finish(mut self, dropped_samples: u64) -> Result<(StreamReport, S), SinkError> {
        let discarded = self.engine.on_stream_end();
        self.sink.flush()?;

        let stats = self.engine.stats();
        if dropped_samples > 0 {
            warn!("{} samples dropped to backpressure", dropped_samples);
        }
        info!(
            "Stream finished: {} samples, {} segments accepted, {} rejected, {} discarded",
            stats.samples_processed,
            stats.segments_accepted,
            stats.segments_rejected,
            stats.segments_discarded
        );

        Ok((
            StreamReport {
                stats,
                dropped_samples,
                discarded,
            },
            self.sink,
        ))
    }

    pub fn engine(&self) -> &SegmentationEngine {
        &self.engine
    }
}

/// Convenience wrapper: run `engine` over `receiver` into `sink`.
pub fn run_stream<S: SegmentSink>(
    engine: SegmentationEngine,
    receiver: SampleReceiver,
    sink: S,
) -> Result<(StreamReport, S), SinkError> {
    StreamRunner::new(engine, sink).run(receiver)
}
