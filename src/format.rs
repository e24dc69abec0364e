use std::fmt::{self, Write as _};
use std::sync::LazyLock;

use ansi_to_tui::IntoText;
use chrono::NaiveDateTime;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use regex::Regex;

use crate::theme::Theme;

/// Timestamp layout expected at the start of a log line
pub const INPUT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").expect("valid ANSI escape regex"));

/// Detected log level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
    None,
}

impl LogLevel {
    /// Level named by a single token such as `ERROR` or `warn`
    pub fn from_token(token: &str) -> Self {
        match token.to_uppercase().as_str() {
            "ERROR" | "ERR" | "FATAL" => LogLevel::Error,
            "WARNING" | "WARN" => LogLevel::Warn,
            "INFO" => LogLevel::Info,
            "DEBUG" | "DBG" => LogLevel::Debug,
            "TRACE" | "TRC" => LogLevel::Trace,
            _ => LogLevel::None,
        }
    }

    /// Detect log level from a line of text
    pub fn detect(line: &str) -> Self {
        let upper = line.to_uppercase();
        // Check for common log level patterns
        if upper.contains("ERROR") || upper.contains("[E]") || upper.contains("ERR]") {
            LogLevel::Error
        } else if upper.contains("WARN") || upper.contains("[W]") || upper.contains("WRN]") {
            LogLevel::Warn
        } else if upper.contains("INFO") || upper.contains("[I]") || upper.contains("INF]") {
            LogLevel::Info
        } else if upper.contains("DEBUG") || upper.contains("[D]") || upper.contains("DBG]") {
            LogLevel::Debug
        } else if upper.contains("TRACE") || upper.contains("[T]") || upper.contains("TRC]") {
            LogLevel::Trace
        } else {
            LogLevel::None
        }
    }
}

/// Render `timestamp` with a strftime `format`.
///
/// `None` when chrono cannot render it, e.g. `%Z` needs an offset that a
/// naive timestamp does not have.
pub fn render_timestamp(timestamp: &NaiveDateTime, format: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", timestamp.format(format)).ok()?;
    Some(out)
}

/// Remove ANSI escape sequences from `text`
pub fn strip_ansi(text: &str) -> String {
    ANSI_ESCAPE.replace_all(text, "").into_owned()
}

/// A formatted line ready for display or export
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayLine {
    /// The raw line as read from the file
    pub raw: String,
    /// Reformatted timestamp, if the line starts with `date time level`
    pub timestamp: Option<String>,
    /// The level token as written in the line
    pub level_token: Option<String>,
    /// Detected log level
    pub level: LogLevel,
    /// Message text after the level token, or the whole line
    pub message: String,
    timestamp_style: Style,
    level_style: Style,
    message_style: Style,
}

impl DisplayLine {
    /// Whether the raw line contains ANSI escape codes
    pub fn has_ansi(&self) -> bool {
        self.raw.contains('\x1b')
    }

    /// Style applied to the level token
    #[cfg(test)]
    pub fn level_style(&self) -> Style {
        self.level_style
    }

    /// Styled ratatui line for the log view
    pub fn to_line(&self) -> Line<'static> {
        if self.has_ansi() {
            // Line carries its own colors
            return self
                .raw
                .as_bytes()
                .into_text()
                .ok()
                .and_then(|text| text.lines.into_iter().next())
                .unwrap_or_else(|| Line::raw(strip_ansi(&self.raw)));
        }

        match (&self.timestamp, &self.level_token) {
            (Some(timestamp), Some(level)) => Line::from(vec![
                Span::styled(timestamp.clone(), self.timestamp_style),
                Span::raw(" "),
                Span::styled(level.clone(), self.level_style),
                Span::raw(": "),
                Span::styled(self.message.clone(), self.message_style),
            ]),
            _ => Line::from(Span::styled(self.message.clone(), self.message_style)),
        }
    }
}

impl fmt::Display for DisplayLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.timestamp, &self.level_token) {
            (Some(timestamp), Some(level)) => {
                write!(f, "{} {}: {}", timestamp, level, self.message)
            }
            _ => write!(f, "{}", strip_ansi(&self.message)),
        }
    }
}

/// Turns raw log lines into display lines using a theme
#[derive(Clone, Debug)]
pub struct LineFormatter {
    theme: Theme,
    level_colors: bool,
    timestamp_format: String,
}

impl Default for LineFormatter {
    fn default() -> Self {
        Self::new(Theme::default(), true, INPUT_TIMESTAMP_FORMAT)
    }
}

impl LineFormatter {
    pub fn new(theme: Theme, level_colors: bool, timestamp_format: impl Into<String>) -> Self {
        Self {
            theme,
            level_colors,
            timestamp_format: timestamp_format.into(),
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    fn level_style(&self, level: LogLevel) -> Style {
        match self.theme.level_color(level) {
            Some(color) if self.level_colors => Style::default().fg(color),
            _ => Style::default(),
        }
    }

    /// Format one raw line.
    ///
    /// Lines shaped like `<date> <time> <LEVEL> <message>` are split into parts
    /// with the level highlighted; anything else is kept whole and colored by
    /// the level it mentions.
    pub fn format(&self, raw: &str) -> DisplayLine {
        let message_style = Style::default().fg(self.theme.message);
        let parts: Vec<&str> = raw.splitn(4, ' ').collect();

        if raw.contains('\x1b') || parts.len() < 4 {
            let level = LogLevel::detect(raw);
            return DisplayLine {
                raw: raw.to_string(),
                timestamp: None,
                level_token: None,
                level,
                message: raw.to_string(),
                timestamp_style: Style::default(),
                level_style: self.level_style(level),
                message_style: match self.theme.level_color(level) {
                    Some(color) if self.level_colors => Style::default().fg(color),
                    _ => message_style,
                },
            };
        }

        let date = format!("{} {}", parts[0], parts[1]);
        let timestamp = match NaiveDateTime::parse_from_str(&date, INPUT_TIMESTAMP_FORMAT) {
            Ok(parsed) => render_timestamp(&parsed, &self.timestamp_format).unwrap_or(date),
            Err(_) => date,
        };
        let level = LogLevel::from_token(parts[2]);
        let mut level_style = self.level_style(level);
        if level != LogLevel::None && self.level_colors {
            level_style = level_style.add_modifier(Modifier::BOLD);
        }

        DisplayLine {
            raw: raw.to_string(),
            timestamp: Some(timestamp),
            level_token: Some(parts[2].to_string()),
            level,
            message: parts[3].to_string(),
            timestamp_style: Style::default().fg(self.theme.timestamp),
            level_style,
            message_style,
        }
    }
}
