use ratatui::style::{Color, Style};
use tui_textarea::TextArea;

use crate::session::{Intent, Message, Mode, Transition, ViewerSession};

/// Maximum length of a search term
const SEARCH_CHAR_LIMIT: usize = 100;

/// Main application state: the session plus everything only the UI needs
pub struct AppState<'a> {
    /// The paging and live-merge session
    pub session: ViewerSession,
    /// Display name of the file
    pub source_name: String,
    /// Search text input widget
    pub search_textarea: TextArea<'a>,
    /// Whether the app should quit
    pub should_quit: bool,
    /// Status message to display
    pub status_message: Option<String>,
    /// Whether to show help overlay
    pub show_help: bool,
    /// Whether to wrap long lines
    pub line_wrap: bool,
}

impl<'a> AppState<'a> {
    pub fn new(session: ViewerSession, source_name: String) -> Self {
        Self {
            session,
            source_name,
            search_textarea: new_search_textarea(String::new()),
            should_quit: false,
            status_message: None,
            show_help: false,
            line_wrap: true,
        }
    }

    /// Whether the search box has focus
    pub fn is_searching(&self) -> bool {
        self.session.mode() == Mode::Searching
    }

    /// Feed a message to the session and pick up its notices
    pub fn dispatch(&mut self, message: Message) -> Transition {
        let transition = self.session.handle(message);
        if let Some(notice) = self.session.take_notice() {
            self.status_message = Some(notice);
        }
        if transition == Transition::Close {
            self.should_quit = true;
        }
        transition
    }

    pub fn intent(&mut self, intent: Intent) -> Transition {
        self.dispatch(Message::Intent(intent))
    }

    /// Open the search box, prefilled with the active term
    pub fn start_search(&mut self) -> Transition {
        let current = self.session.filter().search.clone().unwrap_or_default();
        self.search_textarea = new_search_textarea(current);
        self.search_textarea.move_cursor(tui_textarea::CursorMove::End);
        self.status_message = None;
        self.intent(Intent::StartSearch)
    }

    /// Current search input text
    pub fn search_input(&self) -> String {
        self.search_textarea.lines().join(" ")
    }

    /// Apply the typed search term
    pub fn commit_search(&mut self) -> Transition {
        let mut term = self.search_input();
        if term.chars().count() > SEARCH_CHAR_LIMIT {
            term = term.chars().take(SEARCH_CHAR_LIMIT).collect();
        }
        let transition = self.intent(Intent::CommitSearch(term));
        if !self.should_quit {
            let total = self.session.index().len();
            self.status_message = Some(match self.session.filter().search.as_deref() {
                Some(term) => format!("{} lines match \"{}\"", total, term),
                None => format!("Search cleared, {} lines", total),
            });
        }
        transition
    }

    /// Leave the search box without changing anything
    pub fn cancel_search(&mut self) -> Transition {
        self.intent(Intent::CancelSearch)
    }

    /// Toggle line wrapping
    pub fn toggle_line_wrap(&mut self) {
        self.line_wrap = !self.line_wrap;
        self.status_message = Some(format!(
            "Line wrap: {}",
            if self.line_wrap { "on" } else { "off" }
        ));
    }
}

fn new_search_textarea<'a>(initial: String) -> TextArea<'a> {
    let mut textarea = TextArea::new(vec![initial]);
    textarea.set_cursor_line_style(Style::default());
    textarea.set_placeholder_text("Search...");
    textarea.set_placeholder_style(Style::default().fg(Color::DarkGray));
    textarea
}
