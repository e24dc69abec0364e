use std::io::{BufRead, Seek, SeekFrom};

use tracing::debug;

use crate::error::ViewerError;
use crate::format::{DisplayLine, LineFormatter};
use crate::index::{LogIndex, trim_line};

/// Read and format the lines of `page` by seeking to each indexed offset.
///
/// An empty index yields an empty page. A page outside a non-empty index is
/// an `InvalidPage` error. A line cut short by end-of-file is returned as-is,
/// but an offset at or past the end of the file is a `StaleOffset`.
pub fn load_page<R: BufRead + Seek>(
    reader: &mut R,
    index: &LogIndex,
    page: usize,
    page_size: usize,
    formatter: &LineFormatter,
) -> Result<Vec<DisplayLine>, ViewerError> {
    if index.is_empty() {
        return Ok(Vec::new());
    }

    let total = index.total_pages(page_size);
    if page >= total {
        return Err(ViewerError::InvalidPage { page, total });
    }

    let offsets = index.page(page, page_size);
    let mut lines = Vec::with_capacity(offsets.len());
    let mut buf = Vec::new();
    for &offset in offsets {
        let raw = read_line_at(reader, offset, &mut buf)?;
        lines.push(formatter.format(&raw));
    }

    debug!(page, total, lines = lines.len(), "loaded page");
    Ok(lines)
}

/// Read the single line starting at `offset`
pub fn read_line_at<R: BufRead + Seek>(
    reader: &mut R,
    offset: u64,
    buf: &mut Vec<u8>,
) -> Result<String, ViewerError> {
    reader
        .seek(SeekFrom::Start(offset))
        .map_err(|source| ViewerError::Read { offset, source })?;

    buf.clear();
    let read = reader
        .read_until(b'\n', buf)
        .map_err(|source| ViewerError::Read { offset, source })?;
    if read == 0 {
        return Err(ViewerError::StaleOffset { offset });
    }

    Ok(String::from_utf8_lossy(trim_line(buf)).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;
    use crate::format::LogLevel;
    use crate::index::scan_index;
    use std::io::Cursor;

    const SAMPLE: &str = "2024-01-01 10:00:00 INFO start\n\
                          2024-01-01 10:00:01 ERROR fail\n\
                          2024-01-01 10:00:02 INFO done\n";

    fn numbered(count: usize) -> String {
        (0..count)
            .map(|i| format!("2024-01-01 10:00:{:02} INFO line {}\n", i, i))
            .collect()
    }

    #[test]
    fn test_error_page() {
        let filter = Filter::new(Some("ERROR".to_string()), None);
        let index = scan_index(Cursor::new(SAMPLE), &filter).unwrap();
        let mut reader = Cursor::new(SAMPLE);
        let page = load_page(&mut reader, &index, 0, 15, &LineFormatter::default()).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].message, "fail");
        assert_eq!(page[0].level, LogLevel::Error);
    }

    #[test]
    fn test_empty_index_gives_empty_page() {
        let index = LogIndex::new();
        let mut reader = Cursor::new("");
        let page = load_page(&mut reader, &index, 0, 15, &LineFormatter::default()).unwrap();
        assert!(page.is_empty());
        // Any page of an empty index is empty, not invalid
        let page = load_page(&mut reader, &index, 4, 15, &LineFormatter::default()).unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn test_out_of_range_page_is_invalid() {
        let data = numbered(5);
        let index = scan_index(Cursor::new(&data), &Filter::default()).unwrap();
        let mut reader = Cursor::new(&data);
        let err = load_page(&mut reader, &index, 3, 2, &LineFormatter::default()).unwrap_err();
        assert!(matches!(err, ViewerError::InvalidPage { page: 3, total: 3 }));
    }

    #[test]
    fn test_pages_partition_the_file() {
        let data = numbered(5);
        let index = scan_index(Cursor::new(&data), &Filter::default()).unwrap();
        let mut reader = Cursor::new(&data);
        let formatter = LineFormatter::default();

        let mut all = Vec::new();
        for page in 0..index.total_pages(2) {
            all.extend(load_page(&mut reader, &index, page, 2, &formatter).unwrap());
        }
        let messages: Vec<_> = all.iter().map(|l| l.message.as_str()).collect();
        assert_eq!(messages, ["line 0", "line 1", "line 2", "line 3", "line 4"]);

        let last = load_page(&mut reader, &index, 2, 2, &formatter).unwrap();
        assert_eq!(last.len(), 1);
    }

    #[test]
    fn test_loading_twice_is_identical() {
        let data = numbered(7);
        let index = scan_index(Cursor::new(&data), &Filter::default()).unwrap();
        let mut reader = Cursor::new(&data);
        let formatter = LineFormatter::default();
        let first = load_page(&mut reader, &index, 1, 3, &formatter).unwrap();
        let second = load_page(&mut reader, &index, 1, 3, &formatter).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_truncated_last_line_is_tolerated() {
        let data = "INFO one\nINFO two without newline";
        let index = scan_index(Cursor::new(data), &Filter::default()).unwrap();
        let mut reader = Cursor::new(data);
        let page = load_page(&mut reader, &index, 0, 10, &LineFormatter::default()).unwrap();
        assert_eq!(page[1].raw, "INFO two without newline");
    }

    #[test]
    fn test_offset_past_end_is_stale() {
        let data = numbered(4);
        let index = scan_index(Cursor::new(&data), &Filter::default()).unwrap();
        // File truncated after indexing
        let mut reader = Cursor::new(&data[..40]);
        let err = load_page(&mut reader, &index, 1, 2, &LineFormatter::default()).unwrap_err();
        assert!(matches!(err, ViewerError::StaleOffset { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_crlf_is_trimmed() {
        let data = "a INFO x\r\nb INFO y\r\n";
        let index = scan_index(Cursor::new(data), &Filter::default()).unwrap();
        let mut reader = Cursor::new(data);
        let page = load_page(&mut reader, &index, 0, 10, &LineFormatter::default()).unwrap();
        assert_eq!(page[1].raw, "b INFO y");
    }
}
