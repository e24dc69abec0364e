//! Random-access index of the lines that match the active filter.
//!
//! The index stores byte offsets only; line contents are read back on demand
//! by the page loader.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::Range;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::ViewerError;
use crate::filter::Filter;

/// Ordered byte offsets of matching lines in the source file
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogIndex {
    /// Start offset of each matching line, strictly increasing
    offsets: Vec<u64>,
    /// Byte position just past the last newline-terminated line scanned
    scanned_to: u64,
    /// Whether the last entry is an unterminated final line
    partial_tail: bool,
}

impl LogIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty index whose live tail resumes at `scanned_to`
    #[cfg(test)]
    pub fn starting_at(scanned_to: u64) -> Self {
        Self {
            scanned_to,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    #[cfg(test)]
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    pub fn last(&self) -> Option<u64> {
        self.offsets.last().copied()
    }

    pub fn scanned_to(&self) -> u64 {
        self.scanned_to
    }

    /// Number of pages, zero for an empty index
    pub fn total_pages(&self, page_size: usize) -> usize {
        let page_size = page_size.max(1);
        self.offsets.len().div_ceil(page_size)
    }

    /// Index positions covered by `page`, empty when the page is out of range
    pub fn page_range(&self, page: usize, page_size: usize) -> Range<usize> {
        let page_size = page_size.max(1);
        let start = page.saturating_mul(page_size).min(self.offsets.len());
        let end = start.saturating_add(page_size).min(self.offsets.len());
        start..end
    }

    /// Offsets for one page
    pub fn page(&self, page: usize, page_size: usize) -> &[u64] {
        &self.offsets[self.page_range(page, page_size)]
    }

    /// Append `offset` if `line` matches `filter`.
    ///
    /// Returns whether an entry was added. Offsets that would break the
    /// strictly increasing order are refused.
    pub fn append_if_match(&mut self, line: &str, filter: &Filter, offset: u64) -> bool {
        if !filter.matches(line) {
            return false;
        }
        if let Some(last) = self.last() {
            if offset <= last {
                warn!(offset, last, "refusing out-of-order index append");
                return false;
            }
        }
        self.offsets.push(offset);
        true
    }

    /// Record that bytes up to `position` are covered by the index
    pub fn advance_scanned_to(&mut self, position: u64) {
        self.scanned_to = self.scanned_to.max(position);
    }

    /// Forget an indexed unterminated final line.
    ///
    /// A live tail only emits complete lines and resumes at `scanned_to`, so
    /// the partial line will be delivered again once its writer finishes it.
    pub fn drop_partial_tail(&mut self) {
        if self.partial_tail {
            self.offsets.pop();
            self.partial_tail = false;
        }
    }
}

/// Scan `path` once and index every line matching `filter`.
///
/// Reads a line at a time; the file is never buffered whole. Any read error
/// fails the whole build.
pub fn build_index(path: &Path, filter: &Filter) -> Result<LogIndex, ViewerError> {
    let file = File::open(path).map_err(|e| ViewerError::io("unable to open", path, e))?;
    let index = scan_index(BufReader::new(file), filter)
        .map_err(|e| ViewerError::io("error reading", path, e))?;
    debug!(
        path = %path.display(),
        matches = index.len(),
        scanned_to = index.scanned_to,
        "built index"
    );
    Ok(index)
}

/// The indexing algorithm over any buffered reader
pub fn scan_index<R: BufRead>(mut reader: R, filter: &Filter) -> std::io::Result<LogIndex> {
    let mut index = LogIndex::new();
    let mut buf = Vec::new();
    let mut cursor: u64 = 0;

    loop {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf)?;
        if read == 0 {
            break;
        }
        let terminated = buf.last() == Some(&b'\n');
        let line = String::from_utf8_lossy(trim_line(&buf));
        if filter.matches(&line) {
            index.offsets.push(cursor);
            index.partial_tail = !terminated;
        }
        cursor += read as u64;
        if terminated {
            index.scanned_to = cursor;
        }
    }

    Ok(index)
}

/// Strip a trailing `\n` or `\r\n`
pub fn trim_line(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}
