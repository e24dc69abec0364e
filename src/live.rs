use std::collections::VecDeque;

use tracing::warn;

use crate::filter::Filter;
use crate::format::{DisplayLine, LineFormatter};
use crate::index::LogIndex;
use crate::sources::RawLine;

/// Merges live-tailed lines into the index and keeps the newest ones on hand.
///
/// Offsets come from the merger's own byte cursor, which starts where the
/// index scan stopped. The position a source reports is only cross-checked.
#[derive(Debug)]
pub struct LiveMerger {
    /// Offset of the next line to arrive
    cursor: u64,
    /// Most recent formatted matching lines, oldest first
    buffer: VecDeque<DisplayLine>,
    /// Maximum buffered lines (one page)
    capacity: usize,
}

impl LiveMerger {
    pub fn new(cursor: u64, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            cursor,
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Restart at `cursor` with `seed` as the buffered lines
    pub fn reset(&mut self, cursor: u64, seed: impl IntoIterator<Item = DisplayLine>) {
        self.cursor = cursor;
        self.buffer.clear();
        for line in seed {
            self.push(line);
        }
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Buffered lines, oldest first
    pub fn lines(&self) -> impl Iterator<Item = &DisplayLine> {
        self.buffer.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Merge one arrived line.
    ///
    /// Returns whether the line matched and was appended to `index`.
    pub fn merge(
        &mut self,
        line: &RawLine,
        index: &mut LogIndex,
        filter: &Filter,
        formatter: &LineFormatter,
    ) -> bool {
        if line.offset != self.cursor {
            warn!(
                expected = self.cursor,
                reported = line.offset,
                "line source position disagrees with merge cursor"
            );
        }

        let offset = self.cursor;
        self.cursor += line.len.max(1);
        let appended = index.append_if_match(&line.text, filter, offset);
        index.advance_scanned_to(self.cursor);

        if appended {
            self.push(formatter.format(&line.text));
        }
        appended
    }

    fn push(&mut self, line: DisplayLine) {
        self.buffer.push_back(line);
        // Evict the oldest line once over one page
        while self.buffer.len() > self.capacity {
            self.buffer.pop_front();
        }
    }
}
