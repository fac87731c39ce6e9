//! Recorded sample stream replay.
//!
//! Reads samples from text, one per line:
//!
//! ```text
//! # timestamp, ch0, ch1, ...
//! 0.000, 3, -2, 14, 0, 1, -7, 2, 5
//! 0.005  4  -1  12  0  2  -6  1  4
//! ```
//!
//! Fields may be separated by commas, whitespace, or both. Blank lines and
//! lines starting with `#` are skipped. Channel arity is not checked here;
//! the engine rejects wrong-arity samples itself.

use std::io::BufRead;

use crate::error::ReplayError;
use crate::types::Sample;

/// Iterator over the samples of a recorded stream.
pub struct SampleReader<R> {
    reader: R,
    line_number: usize,
    line: String,
}

impl<R: BufRead> SampleReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            line: String::new(),
        }
    }

    /// Lines consumed so far, including skipped ones.
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl<R: BufRead> Iterator for SampleReader<R> {
    type Item = Result<Sample, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(err) => return Some(Err(ReplayError::Io(err))),
            }
            self.line_number += 1;

            let trimmed = self.line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            return Some(parse_sample_line(trimmed, self.line_number));
        }
    }
}

/// Parse `timestamp,ch0,ch1,...` into a sample.
pub fn parse_sample_line(line: &str, line_number: usize) -> Result<Sample, ReplayError> {
    let mut fields = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|f| !f.is_empty());

    let parse_error = |message: String| ReplayError::Parse {
        line: line_number,
        message,
    };

    let timestamp = fields
        .next()
        .ok_or_else(|| parse_error("missing timestamp".to_string()))?;
    let timestamp: f64 = timestamp
        .parse()
        .map_err(|_| parse_error(format!("invalid timestamp '{}'", timestamp)))?;

    let channels = fields
        .map(|f| {
            f.parse::<i32>()
                .map_err(|_| parse_error(format!("invalid channel value '{}'", f)))
        })
        .collect::<Result<Vec<i32>, ReplayError>>()?;

    if channels.is_empty() {
        return Err(parse_error("no channel values".to_string()));
    }

    Ok(Sample::new(timestamp, channels))
}
