use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
};

use crate::app::AppState;
use crate::theme::Theme;

/// Draw the entire UI
pub fn draw(frame: &mut Frame, state: &mut AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(3),    // Log view
            Constraint::Length(1), // Status bar
            Constraint::Length(1), // Search bar
        ])
        .split(frame.area());

    let theme = state.session.formatter().theme().clone();

    draw_header(frame, state, &theme, chunks[0]);
    draw_log_view(frame, state, &theme, chunks[1]);
    draw_status_bar(frame, state, &theme, chunks[2]);
    draw_search_bar(frame, state, &theme, chunks[3]);

    if state.show_help {
        draw_help_overlay(frame, &theme);
    }
}

/// Draw the header showing the file name
fn draw_header(frame: &mut Frame, state: &AppState, theme: &Theme, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " cml ",
            Style::default()
                .fg(theme.header_title)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("| "),
        Span::styled(state.source_name.as_str(), Style::default().fg(theme.header_source)),
    ]))
    .style(Style::default().bg(theme.header_bg));

    frame.render_widget(header, area);
}

/// Draw the lines of the current page, or the live buffer
fn draw_log_view(frame: &mut Frame, state: &AppState, theme: &Theme, area: Rect) {
    let height = area.height as usize;
    if height == 0 {
        return;
    }

    let session = &state.session;
    if session.total_pages() == 0 {
        let (text, color) = if session.filter().is_empty() && session.is_live() {
            ("Waiting for log lines...", theme.empty_state)
        } else if session.filter().is_empty() {
            ("No logs", theme.empty_state)
        } else {
            ("No logs match the current filter", theme.warning_message)
        };
        frame.render_widget(Paragraph::new(text).style(Style::default().fg(color)), area);
        return;
    }

    let lines: Vec<Line<'static>> = session
        .held_lines()
        .into_iter()
        .map(|line| line.to_line())
        .collect();

    let mut paragraph = Paragraph::new(lines);
    if state.line_wrap {
        paragraph = paragraph.wrap(Wrap { trim: false });
    }
    frame.render_widget(paragraph, area);

    // Scrollbar tracks the page position within the file
    let total_pages = session.total_pages();
    if total_pages > 1 {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("▲"))
            .end_symbol(Some("▼"));
        let mut scrollbar_state = ScrollbarState::new(total_pages).position(session.current_page());
        frame.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
    }
}

/// Draw the status bar
fn draw_status_bar(frame: &mut Frame, state: &AppState, theme: &Theme, area: Rect) {
    let session = &state.session;
    let mode_str = if state.is_searching() { "SEARCH" } else { "NORMAL" };

    let total_pages = session.total_pages();
    let page_str = if total_pages == 0 {
        "Page 0/0".to_string()
    } else {
        format!("Page {}/{}", session.current_page() + 1, total_pages)
    };

    let filter = session.filter().describe();
    let filter_str = if filter.is_empty() {
        String::new()
    } else {
        format!(" | {}", filter)
    };

    let help_text = if state.is_searching() {
        " Enter:apply  Esc:cancel "
    } else {
        " ?:help  /:search  q:quit "
    };

    let mut spans = vec![
        Span::styled(
            format!(" {} ", mode_str),
            Style::default().bg(theme.status_mode_bg).fg(theme.status_mode_fg),
        ),
        Span::raw(format!(
            " {} | {} lines{} ",
            page_str,
            session.index().len(),
            filter_str
        )),
    ];
    if session.is_live() {
        spans.push(Span::styled(
            "[LIVE] ",
            Style::default()
                .fg(theme.status_live)
                .add_modifier(Modifier::BOLD),
        ));
    }
    if state.line_wrap {
        spans.push(Span::raw("[W] "));
    }
    spans.push(Span::styled(help_text, Style::default().fg(theme.status_help)));

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(theme.status_bg));
    frame.render_widget(paragraph, area);
}

/// Draw the search input, or the last status message
fn draw_search_bar(frame: &mut Frame, state: &mut AppState, theme: &Theme, area: Rect) {
    const PREFIX: &str = "Search: ";

    if state.is_searching() {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(PREFIX.len() as u16), Constraint::Min(1)])
            .split(area);

        let prefix = Paragraph::new(PREFIX).style(Style::default().fg(theme.search_prefix));
        frame.render_widget(prefix, chunks[0]);
        frame.render_widget(&state.search_textarea, chunks[1]);
    } else if let Some(msg) = &state.status_message {
        let color = if msg.starts_with("Error") {
            theme.error_message
        } else {
            theme.warning_message
        };
        let content = Line::from(Span::styled(msg.as_str(), Style::default().fg(color)));
        frame.render_widget(Paragraph::new(content), area);
    }
}

/// Draw the help overlay
fn draw_help_overlay(frame: &mut Frame, theme: &Theme) {
    let area = frame.area();

    // Center the help box
    let width = 50.min(area.width.saturating_sub(4));
    let height = 22.min(area.height.saturating_sub(4));
    let x = (area.width - width) / 2;
    let y = (area.height - height) / 2;
    let help_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, help_area);

    let help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Pages:"),
        Line::from("  Enter, Space   Next page"),
        Line::from("  j, ↓           Next page"),
        Line::from("  k, ↑           Previous page"),
        Line::from("  PgDn/PgUp      Next/previous page"),
        Line::from("  g, Home        First page"),
        Line::from("  G, End         Last page (follow when live)"),
        Line::from("  Mouse wheel    Next/previous page"),
        Line::from(""),
        Line::from("Search:"),
        Line::from("  Ctrl+S, /      Edit search term"),
        Line::from("  Enter          Apply (empty clears)"),
        Line::from("  Esc            Cancel"),
        Line::from(""),
        Line::from("Display:"),
        Line::from("  w              Toggle line wrapping"),
        Line::from("  ?              Toggle this help"),
        Line::from("  q, Ctrl+C      Quit"),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.help_border))
        .style(Style::default().bg(theme.help_bg));

    let paragraph = Paragraph::new(help_text).block(block);
    frame.render_widget(paragraph, help_area);
}
