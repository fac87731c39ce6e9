//! Segment sinks.
//!
//! Accepted segments leave the engine through the `SegmentSink` trait. The
//! engine does not care about storage format; sinks own serialization.
//!
//! Two sinks ship with the crate:
//! - `MemorySink`: keeps records in a `Vec` (tests, embedding)
//! - `JsonLinesExporter`: one JSON object per accepted segment, streamable
//!   to any `io::Write`

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::SinkError;
use crate::types::SegmentRecord;

/// Receiver of accepted segments.
pub trait SegmentSink {
    /// Take ownership of one accepted segment.
    fn accept(&mut self, record: SegmentRecord) -> Result<(), SinkError>;

    /// Flush anything buffered. Called once when the stream ends.
    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Collects records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<SegmentRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[SegmentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<SegmentRecord> {
        self.records
    }
}

impl SegmentSink for MemorySink {
    fn accept(&mut self, record: SegmentRecord) -> Result<(), SinkError> {
        self.records.push(record);
        Ok(())
    }
}

/// Writes each accepted segment as a single JSON line.
pub struct JsonLinesExporter<W: Write> {
    writer: W,
    sequence: u64,
}

impl JsonLinesExporter<BufWriter<File>> {
    /// Create (or truncate) a file and export into it.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonLinesExporter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            sequence: 0,
        }
    }

    /// Number of segments written so far.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> SegmentSink for JsonLinesExporter<W> {
    fn accept(&mut self, record: SegmentRecord) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        self.sequence += 1;
        debug!(
            "Exported segment #{} ({} windows)",
            self.sequence, record.window_count
        );
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}
