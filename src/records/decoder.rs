//! Line decoder for raw input files
//!
//! Every non-blank line is decoded on its own. Lines that fail, including
//! lines that are not valid UTF-8, are turned into [`Error::RecordParse`]
//! values and kept aside for counting.

use super::types::RawRecord;
use crate::error::Error;
use std::ops::AddAssign;

/// Result of decoding one raw file
#[derive(Debug)]
pub struct DecodedFile<R> {
    /// Records that decoded cleanly, in file order
    pub records: Vec<R>,
    /// One entry per rejected line
    pub failures: Vec<Error>,
}

impl<R> DecodedFile<R> {
    /// Counters for this file
    pub fn stats(&self) -> DecodeStats {
        DecodeStats {
            files: 1,
            records: self.records.len(),
            failures: self.failures.len(),
        }
    }
}

/// Decode counters, summed across files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub files: usize,
    pub records: usize,
    pub failures: usize,
}

impl AddAssign for DecodeStats {
    fn add_assign(&mut self, rhs: Self) {
        self.files += rhs.files;
        self.records += rhs.records;
        self.failures += rhs.failures;
    }
}

/// Decode newline-delimited JSON into typed records
///
/// `path` is only used to label failures.
pub fn decode_lines<R: RawRecord>(path: &str, body: impl AsRef<[u8]>) -> DecodedFile<R> {
    let mut records = Vec::new();
    let mut failures = Vec::new();

    for (line_num, raw) in body.as_ref().split(|&b| b == b'\n').enumerate() {
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line.trim(),
            Err(e) => {
                failures.push(Error::record_parse(
                    path,
                    line_num + 1,
                    format!("invalid UTF-8: {e}"),
                ));
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<R>(line) {
            Ok(record) => records.push(record),
            Err(e) => failures.push(Error::record_parse(path, line_num + 1, e.to_string())),
        }
    }

    DecodedFile { records, failures }
}
