use ratatui::style::Color;

use crate::format::LogLevel;

/// All themeable colors in the viewer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Theme {
    // Log levels
    pub level_error: Color,
    pub level_warn: Color,
    pub level_info: Color,
    pub level_debug: Color,
    pub level_trace: Color,

    // Line parts
    pub timestamp: Color,
    pub message: Color,

    // Header
    pub header_title: Color,
    pub header_source: Color,
    pub header_bg: Color,

    // Status bar
    pub status_mode_bg: Color,
    pub status_mode_fg: Color,
    pub status_live: Color,
    pub status_help: Color,
    pub status_bg: Color,

    // Search prompt
    pub search_prefix: Color,

    // Empty states / messages
    pub empty_state: Color,
    pub warning_message: Color,
    pub error_message: Color,

    // Help overlay
    pub help_border: Color,
    pub help_bg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_theme()
    }
}

impl Theme {
    /// The default theme
    pub fn default_theme() -> Self {
        Self {
            level_error: Color::Red,
            level_warn: Color::Yellow,
            level_info: Color::Green,
            level_debug: Color::Blue,
            level_trace: Color::DarkGray,

            timestamp: Color::DarkGray,
            message: Color::White,

            header_title: Color::Green,
            header_source: Color::Cyan,
            header_bg: Color::DarkGray,

            status_mode_bg: Color::Blue,
            status_mode_fg: Color::White,
            status_live: Color::LightMagenta,
            status_help: Color::DarkGray,
            status_bg: Color::Black,

            search_prefix: Color::Yellow,

            empty_state: Color::DarkGray,
            warning_message: Color::Yellow,
            error_message: Color::Red,

            help_border: Color::Cyan,
            help_bg: Color::Black,
        }
    }

    /// Kawaii theme - cute pastel colors
    pub fn kawaii() -> Self {
        Self {
            level_error: Color::Rgb(255, 121, 162), // Soft pink
            level_warn: Color::Rgb(255, 200, 152),  // Soft peach
            level_info: Color::Rgb(152, 255, 200),  // Soft mint
            level_debug: Color::Rgb(162, 200, 255), // Soft lavender-blue
            level_trace: Color::Rgb(180, 180, 200), // Soft gray-lavender

            timestamp: Color::Rgb(180, 180, 200),
            message: Color::Rgb(240, 230, 250),

            header_title: Color::Rgb(255, 182, 214),
            header_source: Color::Rgb(182, 214, 255),
            header_bg: Color::Rgb(60, 50, 70),

            status_mode_bg: Color::Rgb(214, 182, 255),
            status_mode_fg: Color::Rgb(40, 30, 50),
            status_live: Color::Rgb(255, 150, 200),
            status_help: Color::Rgb(180, 180, 200),
            status_bg: Color::Rgb(40, 30, 50),

            search_prefix: Color::Rgb(255, 182, 214),

            empty_state: Color::Rgb(180, 180, 200),
            warning_message: Color::Rgb(255, 200, 152),
            error_message: Color::Rgb(255, 121, 162),

            help_border: Color::Rgb(255, 182, 214),
            help_bg: Color::Rgb(40, 30, 50),
        }
    }

    /// Cyber theme - neon on dark
    pub fn cyber() -> Self {
        Self {
            level_error: Color::Rgb(255, 50, 100),
            level_warn: Color::Rgb(255, 200, 0),
            level_info: Color::Rgb(0, 255, 150),
            level_debug: Color::Rgb(0, 200, 255),
            level_trace: Color::Rgb(100, 100, 120),

            timestamp: Color::Rgb(100, 100, 120),
            message: Color::Rgb(220, 220, 235),

            header_title: Color::Rgb(255, 0, 255),
            header_source: Color::Rgb(0, 255, 255),
            header_bg: Color::Rgb(20, 20, 35),

            status_mode_bg: Color::Rgb(255, 0, 255),
            status_mode_fg: Color::Rgb(0, 0, 0),
            status_live: Color::Rgb(0, 255, 150),
            status_help: Color::Rgb(100, 100, 120),
            status_bg: Color::Rgb(10, 10, 20),

            search_prefix: Color::Rgb(0, 255, 255),

            empty_state: Color::Rgb(100, 100, 120),
            warning_message: Color::Rgb(255, 200, 0),
            error_message: Color::Rgb(255, 50, 100),

            help_border: Color::Rgb(0, 255, 255),
            help_bg: Color::Rgb(10, 10, 20),
        }
    }

    /// Dracula theme
    pub fn dracula() -> Self {
        Self {
            level_error: Color::Rgb(255, 85, 85),   // Red
            level_warn: Color::Rgb(255, 184, 108),  // Orange
            level_info: Color::Rgb(80, 250, 123),   // Green
            level_debug: Color::Rgb(139, 233, 253), // Cyan
            level_trace: Color::Rgb(98, 114, 164),  // Comment gray

            timestamp: Color::Rgb(98, 114, 164),
            message: Color::Rgb(248, 248, 242), // Foreground

            header_title: Color::Rgb(255, 121, 198),
            header_source: Color::Rgb(139, 233, 253),
            header_bg: Color::Rgb(40, 42, 54),

            status_mode_bg: Color::Rgb(189, 147, 249),
            status_mode_fg: Color::Rgb(40, 42, 54),
            status_live: Color::Rgb(255, 121, 198),
            status_help: Color::Rgb(98, 114, 164),
            status_bg: Color::Rgb(33, 34, 44),

            search_prefix: Color::Rgb(255, 184, 108),

            empty_state: Color::Rgb(98, 114, 164),
            warning_message: Color::Rgb(255, 184, 108),
            error_message: Color::Rgb(255, 85, 85),

            help_border: Color::Rgb(189, 147, 249),
            help_bg: Color::Rgb(40, 42, 54),
        }
    }

    /// Monochrome theme - grayscale only
    pub fn monochrome() -> Self {
        Self {
            level_error: Color::Rgb(255, 255, 255), // White (stands out)
            level_warn: Color::Rgb(200, 200, 200),
            level_info: Color::Rgb(170, 170, 170),
            level_debug: Color::Rgb(140, 140, 140),
            level_trace: Color::Rgb(100, 100, 100),

            timestamp: Color::Rgb(120, 120, 120),
            message: Color::Rgb(210, 210, 210),

            header_title: Color::Rgb(255, 255, 255),
            header_source: Color::Rgb(180, 180, 180),
            header_bg: Color::Rgb(50, 50, 50),

            status_mode_bg: Color::Rgb(200, 200, 200),
            status_mode_fg: Color::Rgb(0, 0, 0),
            status_live: Color::Rgb(255, 255, 255),
            status_help: Color::Rgb(120, 120, 120),
            status_bg: Color::Rgb(30, 30, 30),

            search_prefix: Color::Rgb(180, 180, 180),

            empty_state: Color::Rgb(120, 120, 120),
            warning_message: Color::Rgb(200, 200, 200),
            error_message: Color::Rgb(255, 255, 255),

            help_border: Color::Rgb(180, 180, 180),
            help_bg: Color::Rgb(20, 20, 20),
        }
    }

    /// Get a theme by name
    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "kawaii" => Self::kawaii(),
            "cyber" | "futuristic" => Self::cyber(),
            "monochrome" | "mono" => Self::monochrome(),
            "dracula" => Self::dracula(),
            _ => Self::default_theme(),
        }
    }

    /// Color used to highlight a log level token
    pub fn level_color(&self, level: LogLevel) -> Option<Color> {
        match level {
            LogLevel::Error => Some(self.level_error),
            LogLevel::Warn => Some(self.level_warn),
            LogLevel::Info => Some(self.level_info),
            LogLevel::Debug => Some(self.level_debug),
            LogLevel::Trace => Some(self.level_trace),
            LogLevel::None => None,
        }
    }
}
