//! Streaming line-delimited JSON reader
//!
//! Lines are read one at a time into a reused buffer, so memory use is
//! bounded by the longest line rather than by the decompressed archive.
//! Lines that do not hold a JSON object are counted and skipped.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use bzip2::read::MultiBzDecoder;
use serde_json::Value;

use crate::app::models::Record;
use crate::constants::files;

/// Reader over a bzip2-compressed archive file
pub type Bz2RecordReader = RecordReader<BufReader<MultiBzDecoder<File>>>;

/// Iterator of parsed records from newline-delimited JSON
///
/// Yields `Err` once on an I/O or decompression failure and then stops.
#[derive(Debug)]
pub struct RecordReader<R> {
    inner: R,
    buffer: Vec<u8>,
    lines_read: u64,
    malformed_lines: u64,
    failed: bool,
}

impl RecordReader<BufReader<MultiBzDecoder<File>>> {
    /// Open a `.bz2` archive for streaming
    ///
    /// Concatenated bzip2 streams are decoded back to back.
    pub fn open_bz2(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let decoder = MultiBzDecoder::new(file);
        Ok(Self::new(BufReader::with_capacity(
            files::DECOMPRESS_BUFFER_SIZE,
            decoder,
        )))
    }
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            lines_read: 0,
            malformed_lines: 0,
            failed: false,
        }
    }

    /// Non-blank lines consumed so far
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    /// Lines skipped because they did not parse as a JSON object
    pub fn malformed_lines(&self) -> u64 {
        self.malformed_lines
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = io::Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            self.buffer.clear();
            match self.inner.read_until(b'\n', &mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {
                    let line = trim_ascii_whitespace(&self.buffer);
                    if line.is_empty() {
                        continue;
                    }
                    self.lines_read += 1;
                    match parse_record(line) {
                        Some(record) => return Some(Ok(record)),
                        None => self.malformed_lines += 1,
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Parse one line as a self-contained JSON object
pub fn parse_record(line: &[u8]) -> Option<Record> {
    match serde_json::from_slice::<Value>(line) {
        Ok(Value::Object(record)) => Some(record),
        _ => None,
    }
}

fn trim_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}
