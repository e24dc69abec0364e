//! The viewer session: page navigation, search and live merge over one file.
//!
//! The session owns the file handle and the index. Everything reaches it as a
//! [`Message`] on the event loop, so reads and index updates never overlap.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::PageSize;
use crate::error::ViewerError;
use crate::filter::Filter;
use crate::format::{DisplayLine, LineFormatter};
use crate::index::{LogIndex, build_index};
use crate::live::LiveMerger;
use crate::pager::load_page;
use crate::sources::RawLine;

/// What the user asked for
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    NextPage,
    PrevPage,
    Home,
    End,
    StartSearch,
    CommitSearch(String),
    CancelSearch,
    Quit,
}

/// Everything the event loop feeds into the session
#[derive(Debug)]
pub enum Message {
    Intent(Intent),
    LineArrived(RawLine),
    Error(ViewerError),
    Resize { width: u16, height: u16 },
}

/// Input mode of the session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Browsing,
    /// Typing a search term; page navigation is suspended
    Searching,
}

/// What is currently on screen
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    /// Lines of `current_page`, read from the file
    Page,
    /// The live buffer of most recently streamed lines
    LiveTail,
}

/// What the event loop must do after a message
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Continue,
    /// Drop the current tail and start a new one at this byte position
    RestartLive { from: u64 },
    /// Drop the current tail; live mode is over
    StopLive,
    /// Leave the event loop
    Close,
}

/// Startup options for a session
#[derive(Clone, Debug)]
pub struct SessionOptions {
    pub path: PathBuf,
    pub filter: Filter,
    pub page_size: PageSize,
    pub live: bool,
    pub formatter: LineFormatter,
}

pub struct ViewerSession {
    path: PathBuf,
    reader: BufReader<File>,
    filter: Filter,
    index: LogIndex,
    page_size: usize,
    current_page: usize,
    live: bool,
    mode: Mode,
    view: View,
    closed: bool,
    /// Lines of the last successfully loaded page
    page_lines: Vec<DisplayLine>,
    merger: LiveMerger,
    formatter: LineFormatter,
    /// Non-fatal problem to show the user
    notice: Option<String>,
    /// Fatal error that closed the session
    error: Option<ViewerError>,
}

impl ViewerSession {
    /// Index the file and load the first page to show.
    ///
    /// Live sessions start on the last page with the live buffer seeded from it.
    pub fn open(options: SessionOptions) -> Result<Self, ViewerError> {
        let SessionOptions {
            path,
            filter,
            page_size,
            live,
            formatter,
        } = options;
        let page_size = page_size.get();
        let (index, reader) = open_indexed(&path, &filter, live)?;

        let mut session = Self {
            merger: LiveMerger::new(index.scanned_to(), page_size),
            path,
            reader,
            filter,
            index,
            page_size,
            current_page: 0,
            live,
            mode: Mode::Browsing,
            view: View::Page,
            closed: false,
            page_lines: Vec::new(),
            formatter,
            notice: None,
            error: None,
        };

        if live {
            session.current_page = session.last_page();
            session.page_lines = session.read_page(session.current_page)?;
            session
                .merger
                .reset(session.index.scanned_to(), session.page_lines.iter().cloned());
            session.view = View::LiveTail;
        } else {
            session.page_lines = session.read_page(0)?;
        }

        info!(
            path = %session.path.display(),
            matches = session.index.len(),
            pages = session.total_pages(),
            live,
            "session opened"
        );
        Ok(session)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn index(&self) -> &LogIndex {
        &self.index
    }

    #[cfg(test)]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.index.total_pages(self.page_size)
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[cfg(test)]
    pub fn view(&self) -> View {
        self.view
    }

    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn formatter(&self) -> &LineFormatter {
        &self.formatter
    }

    /// Where a live tail should resume reading
    pub fn live_resume_offset(&self) -> u64 {
        self.merger.cursor()
    }

    /// Take the pending non-fatal notice, if any
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    /// Take the error that closed the session, if any
    pub fn take_error(&mut self) -> Option<ViewerError> {
        self.error.take()
    }

    /// The formatted lines currently on screen
    pub fn held_lines(&self) -> Vec<&DisplayLine> {
        match self.view {
            View::Page => self.page_lines.iter().collect(),
            View::LiveTail => self.merger.lines().collect(),
        }
    }

    /// Apply one message
    pub fn handle(&mut self, message: Message) -> Transition {
        if self.closed {
            return Transition::Close;
        }
        match message {
            Message::Intent(intent) => self.handle_intent(intent),
            Message::LineArrived(line) => {
                self.on_line(&line);
                Transition::Continue
            }
            Message::Error(err) => self.on_error(err),
            Message::Resize { width, height } => {
                debug!(width, height, "terminal resized");
                Transition::Continue
            }
        }
    }

    fn handle_intent(&mut self, intent: Intent) -> Transition {
        match (self.mode, intent) {
            (_, Intent::Quit) => {
                info!("session closed by user");
                self.closed = true;
                Transition::Close
            }
            (Mode::Browsing, Intent::NextPage) => {
                if self.current_page + 1 < self.total_pages() {
                    self.go_to(self.current_page + 1)
                } else {
                    Transition::Continue
                }
            }
            (Mode::Browsing, Intent::PrevPage) => {
                if self.current_page > 0 {
                    self.go_to(self.current_page - 1)
                } else {
                    Transition::Continue
                }
            }
            (Mode::Browsing, Intent::Home) => self.go_to(0),
            (Mode::Browsing, Intent::End) => {
                if self.live {
                    self.follow()
                } else {
                    self.go_to(self.last_page())
                }
            }
            (Mode::Browsing, Intent::StartSearch) => {
                self.mode = Mode::Searching;
                Transition::Continue
            }
            (Mode::Searching, Intent::CommitSearch(term)) => {
                self.mode = Mode::Browsing;
                self.commit_search(term)
            }
            (Mode::Searching, Intent::CancelSearch) => {
                self.mode = Mode::Browsing;
                Transition::Continue
            }
            // Navigation while searching, or search keys while browsing
            _ => Transition::Continue,
        }
    }

    fn last_page(&self) -> usize {
        self.total_pages().saturating_sub(1)
    }

    /// Show `page`, reloading it from the file
    fn go_to(&mut self, page: usize) -> Transition {
        let page = page.min(self.last_page());
        if page == self.current_page && self.view == View::Page {
            return Transition::Continue;
        }
        match self.read_page(page) {
            Ok(lines) => {
                self.current_page = page;
                self.page_lines = lines;
                self.view = View::Page;
                Transition::Continue
            }
            Err(err) => self.on_error(err),
        }
    }

    /// Jump to the newest lines and keep following them
    fn follow(&mut self) -> Transition {
        self.current_page = self.last_page();
        self.view = View::LiveTail;
        Transition::Continue
    }

    fn read_page(&mut self, page: usize) -> Result<Vec<DisplayLine>, ViewerError> {
        load_page(
            &mut self.reader,
            &self.index,
            page,
            self.page_size,
            &self.formatter,
        )
    }

    /// Rebuild the index for a new search term.
    ///
    /// The old index and handle are kept until the new ones are complete.
    fn commit_search(&mut self, term: String) -> Transition {
        let filter = self.filter.with_search(Some(term));
        let (index, reader) = match open_indexed(&self.path, &filter, self.live) {
            Ok(built) => built,
            Err(err) => return self.on_error(err),
        };
        info!(filter = %filter.describe(), matches = index.len(), "search applied");

        self.filter = filter;
        self.index = index;
        self.reader = reader;
        self.current_page = 0;
        self.view = View::Page;

        if let Err(err) = self.reload_after_rebuild() {
            return self.on_error(err);
        }

        if self.live {
            Transition::RestartLive {
                from: self.merger.cursor(),
            }
        } else {
            Transition::Continue
        }
    }

    fn reload_after_rebuild(&mut self) -> Result<(), ViewerError> {
        if self.live {
            // Seed the live buffer with the newest lines under the new filter
            let last = self.read_page(self.last_page())?;
            self.merger.reset(self.index.scanned_to(), last);
        }
        self.page_lines = self.read_page(0)?;
        Ok(())
    }

    fn on_line(&mut self, line: &RawLine) {
        if !self.live {
            return;
        }
        let appended = self
            .merger
            .merge(line, &mut self.index, &self.filter, &self.formatter);
        if appended {
            // Newest matching line is always visible in live mode
            self.current_page = self.last_page();
            self.view = View::LiveTail;
        }
    }

    fn on_error(&mut self, err: ViewerError) -> Transition {
        match err {
            ViewerError::Stream(_) | ViewerError::StreamClosed => {
                warn!(error = %err, "live mode stopped");
                self.notice = Some(format!("{}; live mode stopped", err));
                if !self.live {
                    return Transition::Continue;
                }
                self.live = false;
                if self.view == View::LiveTail {
                    // The live buffer can straddle two pages; show the one the status names
                    self.page_lines = match self.read_page(self.current_page) {
                        Ok(lines) => lines,
                        Err(reload) => {
                            warn!(error = %reload, "reload after live stop failed");
                            self.merger.lines().cloned().collect()
                        }
                    };
                    self.view = View::Page;
                }
                Transition::StopLive
            }
            err if err.is_recoverable() => {
                warn!(error = %err, "page load failed");
                self.notice = Some(format!("Error: {}", err));
                Transition::Continue
            }
            err => {
                warn!(error = %err, "session closed by fatal error");
                self.closed = true;
                self.error = Some(err);
                Transition::Close
            }
        }
    }
}

/// Index `path` under `filter` and open a handle for page loads
fn open_indexed(
    path: &Path,
    filter: &Filter,
    live: bool,
) -> Result<(LogIndex, BufReader<File>), ViewerError> {
    let mut index = build_index(path, filter)?;
    if live {
        index.drop_partial_tail();
    }
    let file = File::open(path).map_err(|e| ViewerError::io("unable to open", path, e))?;
    Ok((index, BufReader::new(file)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::LogLevel;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn log_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn numbered(count: usize, level: &str) -> String {
        (0..count)
            .map(|i| format!("2024-01-01 10:00:{:02} {} line {}\n", i, level, i))
            .collect()
    }

    fn open(file: &NamedTempFile, level: Option<&str>, page_size: i64, live: bool) -> ViewerSession {
        ViewerSession::open(SessionOptions {
            path: file.path().to_path_buf(),
            filter: Filter::new(level.map(str::to_string), None),
            page_size: PageSize::new(page_size),
            live,
            formatter: LineFormatter::default(),
        })
        .unwrap()
    }

    fn intent(session: &mut ViewerSession, intent: Intent) -> Transition {
        session.handle(Message::Intent(intent))
    }

    fn messages(session: &ViewerSession) -> Vec<String> {
        session.held_lines().iter().map(|l| l.message.clone()).collect()
    }

    #[test]
    fn test_error_filter_scenario() {
        let file = log_file(
            "2024-01-01 10:00:00 INFO start\n\
             2024-01-01 10:00:01 ERROR fail\n\
             2024-01-01 10:00:02 INFO done\n",
        );
        let session = open(&file, Some("ERROR"), 15, false);
        assert_eq!(session.index().len(), 1);
        let lines = session.held_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].message, "fail");
        assert_eq!(lines[0].level, LogLevel::Error);
        assert!(lines[0].level_style().fg.is_some());
    }

    #[test]
    fn test_five_lines_three_pages() {
        let file = log_file(&numbered(5, "INFO"));
        let mut session = open(&file, None, 2, false);
        assert_eq!(session.total_pages(), 3);
        intent(&mut session, Intent::End);
        assert_eq!(session.current_page(), 2);
        assert_eq!(messages(&session), ["line 4"]);
    }

    #[test]
    fn test_navigation_is_clamped() {
        let file = log_file(&numbered(5, "INFO"));
        let mut session = open(&file, None, 2, false);

        intent(&mut session, Intent::PrevPage);
        assert_eq!(session.current_page(), 0);

        intent(&mut session, Intent::NextPage);
        intent(&mut session, Intent::NextPage);
        assert_eq!(session.current_page(), 2);
        intent(&mut session, Intent::NextPage);
        assert_eq!(session.current_page(), 2);

        intent(&mut session, Intent::Home);
        assert_eq!(session.current_page(), 0);
        assert_eq!(messages(&session), ["line 0", "line 1"]);
        assert!(!session.is_closed());
    }

    #[test]
    fn test_empty_file_has_no_pages() {
        let file = log_file("");
        let mut session = open(&file, None, 15, false);
        assert_eq!(session.total_pages(), 0);
        assert!(session.held_lines().is_empty());
        for i in [Intent::NextPage, Intent::PrevPage, Intent::End, Intent::Home] {
            assert_eq!(intent(&mut session, i), Transition::Continue);
            assert_eq!(session.current_page(), 0);
        }
        assert!(!session.is_closed());
    }

    #[test]
    fn test_invalid_page_size_uses_default() {
        let file = log_file(&numbered(20, "INFO"));
        let session = open(&file, None, 0, false);
        assert_eq!(session.page_size(), 15);
        assert_eq!(session.total_pages(), 2);
    }

    #[test]
    fn test_search_rebuilds_index_from_scratch() {
        let file = log_file(
            "2024-01-01 10:00:00 INFO user login\n\
             2024-01-01 10:00:01 INFO db timeout\n\
             2024-01-01 10:00:02 INFO user logout\n\
             2024-01-01 10:00:03 INFO db retry\n",
        );
        let mut session = open(&file, None, 1, false);
        intent(&mut session, Intent::End);
        assert_eq!(session.current_page(), 3);
        let before: Vec<u64> = session.index().offsets().to_vec();

        intent(&mut session, Intent::StartSearch);
        assert_eq!(session.mode(), Mode::Searching);
        let t = intent(&mut session, Intent::CommitSearch("DB".to_string()));
        assert_eq!(t, Transition::Continue);

        assert_eq!(session.mode(), Mode::Browsing);
        assert_eq!(session.current_page(), 0);
        assert_eq!(session.total_pages(), 2);
        assert_ne!(session.index().offsets(), before.as_slice());
        assert_eq!(messages(&session), ["db timeout"]);
        intent(&mut session, Intent::NextPage);
        assert_eq!(messages(&session), ["db retry"]);
    }

    #[test]
    fn test_search_keeps_level_filter() {
        let file = log_file(
            "2024-01-01 10:00:00 INFO db up\n\
             2024-01-01 10:00:01 ERROR db down\n\
             2024-01-01 10:00:02 ERROR disk full\n",
        );
        let mut session = open(&file, Some("error"), 10, false);
        intent(&mut session, Intent::StartSearch);
        intent(&mut session, Intent::CommitSearch("db".to_string()));
        assert_eq!(messages(&session), ["db down"]);
    }

    #[test]
    fn test_cancel_search_changes_nothing() {
        let file = log_file(&numbered(6, "INFO"));
        let mut session = open(&file, None, 2, false);
        intent(&mut session, Intent::NextPage);
        let offsets = session.index().offsets().to_vec();

        intent(&mut session, Intent::StartSearch);
        intent(&mut session, Intent::CancelSearch);
        assert_eq!(session.mode(), Mode::Browsing);
        assert_eq!(session.current_page(), 1);
        assert_eq!(session.index().offsets(), offsets.as_slice());
    }

    #[test]
    fn test_navigation_suspended_while_searching() {
        let file = log_file(&numbered(6, "INFO"));
        let mut session = open(&file, None, 2, false);
        intent(&mut session, Intent::StartSearch);
        intent(&mut session, Intent::NextPage);
        intent(&mut session, Intent::End);
        assert_eq!(session.current_page(), 0);
    }

    #[test]
    fn test_live_auto_follow_with_bounded_buffer() {
        let file = log_file("");
        let mut session = open(&file, Some("INFO"), 2, true);
        assert_eq!(session.total_pages(), 0);

        let mut offset = 0;
        for i in 0..3 {
            let line = RawLine::at(offset, format!("2024-01-01 10:00:0{} INFO live {}", i, i));
            offset += line.len;
            assert_eq!(session.handle(Message::LineArrived(line)), Transition::Continue);
            assert_eq!(session.current_page(), session.total_pages() - 1);
            assert!(session.held_lines().len() <= session.page_size());
        }
        assert_eq!(session.total_pages(), 2);
        assert_eq!(messages(&session), ["live 1", "live 2"]);
    }

    #[test]
    fn test_live_ignores_non_matching_lines() {
        let file = log_file("");
        let mut session = open(&file, Some("ERROR"), 5, true);
        session.handle(Message::LineArrived(RawLine::at(0, "INFO quiet")));
        session.handle(Message::LineArrived(RawLine::at(11, "ERROR loud")));
        assert_eq!(session.index().offsets(), &[11]);
        assert_eq!(session.live_resume_offset(), 22);
    }

    #[test]
    fn test_lines_ignored_when_not_live() {
        let file = log_file(&numbered(2, "INFO"));
        let mut session = open(&file, None, 5, false);
        session.handle(Message::LineArrived(RawLine::at(64, "INFO late")));
        assert_eq!(session.index().len(), 2);
    }

    #[test]
    fn test_live_starts_on_last_page_and_skips_partial_tail() {
        let mut content = numbered(5, "INFO");
        content.push_str("2024-01-01 10:00:09 INFO half");
        let file = log_file(&content);
        let session = open(&file, None, 2, true);

        assert_eq!(session.index().len(), 5);
        assert_eq!(session.current_page(), 2);
        assert_eq!(session.view(), View::LiveTail);
        assert_eq!(messages(&session), ["line 4"]);
        assert_eq!(session.live_resume_offset(), numbered(5, "INFO").len() as u64);
    }

    #[test]
    fn test_live_search_restarts_tail() {
        let file = log_file(&numbered(4, "INFO"));
        let mut session = open(&file, None, 2, true);
        intent(&mut session, Intent::StartSearch);
        let t = intent(&mut session, Intent::CommitSearch("line 3".to_string()));
        let end = numbered(4, "INFO").len() as u64;
        assert_eq!(t, Transition::RestartLive { from: end });
        assert_eq!(session.index().len(), 1);
        assert_eq!(session.current_page(), 0);
    }

    #[test]
    fn test_stream_error_stops_live_only() {
        let file = log_file(&numbered(3, "INFO"));
        let mut session = open(&file, None, 2, true);
        let t = session.handle(Message::Error(ViewerError::Stream("gone".to_string())));
        assert_eq!(t, Transition::StopLive);
        assert!(!session.is_live());
        assert!(!session.is_closed());
        assert!(session.take_notice().unwrap().contains("gone"));

        // Historical browsing still works
        intent(&mut session, Intent::Home);
        assert_eq!(messages(&session), ["line 0", "line 1"]);
    }

    #[test]
    fn test_stopping_live_shows_the_current_page() {
        let mut file = log_file("");
        let mut session = open(&file, None, 2, true);

        let appended = numbered(3, "INFO");
        file.write_all(appended.as_bytes()).unwrap();
        file.flush().unwrap();
        let mut offset = 0;
        for text in appended.lines() {
            let line = RawLine::at(offset, text);
            offset += line.len;
            session.handle(Message::LineArrived(line));
        }
        // Buffer spans the end of page 0 and page 1
        assert_eq!(messages(&session), ["line 1", "line 2"]);

        let t = session.handle(Message::Error(ViewerError::StreamClosed));
        assert_eq!(t, Transition::StopLive);
        assert_eq!(session.view(), View::Page);
        assert_eq!(session.current_page(), 1);
        assert_eq!(messages(&session), ["line 2"]);
    }

    #[test]
    fn test_stale_offset_is_not_fatal() {
        let file = log_file(&numbered(6, "INFO"));
        let mut session = open(&file, None, 2, false);
        file.as_file().set_len(10).unwrap();

        let t = intent(&mut session, Intent::NextPage);
        assert_eq!(t, Transition::Continue);
        assert!(!session.is_closed());
        assert_eq!(session.current_page(), 0);
        assert!(session.take_notice().unwrap().contains("rotated or truncated"));
    }

    #[test]
    fn test_fatal_error_closes() {
        let file = log_file(&numbered(2, "INFO"));
        let mut session = open(&file, None, 2, false);
        let err = ViewerError::io(
            "error reading",
            file.path(),
            std::io::Error::other("disk on fire"),
        );
        assert_eq!(session.handle(Message::Error(err)), Transition::Close);
        assert!(session.is_closed());
        assert!(session.take_error().is_some());
        // Closed sessions stay closed
        assert_eq!(intent(&mut session, Intent::Home), Transition::Close);
    }

    #[test]
    fn test_quit_keeps_held_lines_for_export() {
        let file = log_file(&numbered(3, "INFO"));
        let mut session = open(&file, None, 2, false);
        assert_eq!(intent(&mut session, Intent::Quit), Transition::Close);
        assert!(session.is_closed());
        assert!(session.take_error().is_none());
        assert_eq!(session.held_lines().len(), 2);
    }

    #[test]
    fn test_search_on_deleted_file_is_fatal() {
        let file = log_file(&numbered(3, "INFO"));
        let mut session = open(&file, None, 2, false);
        let path = file.path().to_path_buf();
        drop(file);
        assert!(!path.exists());

        intent(&mut session, Intent::StartSearch);
        let t = intent(&mut session, Intent::CommitSearch("x".to_string()));
        assert_eq!(t, Transition::Close);
        assert!(matches!(session.take_error(), Some(ViewerError::Io { .. })));
    }
}
