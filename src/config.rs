use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDateTime;
use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::format::{INPUT_TIMESTAMP_FORMAT, render_timestamp};

/// Lines per page when none (or an invalid size) is given
pub const DEFAULT_PAGE_SIZE: usize = 15;
/// How often the live tail checks the file for growth
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
/// Capacity of the line-arrival channel
pub const DEFAULT_CHANNEL_BUFFER: usize = 1000;

/// Number of lines per page, always positive
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageSize(usize);

impl Default for PageSize {
    fn default() -> Self {
        Self(DEFAULT_PAGE_SIZE)
    }
}

impl PageSize {
    /// Page size from user input; zero or negative falls back to the default
    pub fn new(raw: i64) -> Self {
        if raw <= 0 {
            warn!(
                requested = raw,
                default = DEFAULT_PAGE_SIZE,
                "invalid page size, using default"
            );
            return Self::default();
        }
        Self(usize::try_from(raw).unwrap_or(DEFAULT_PAGE_SIZE))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

/// Errors that can occur while loading the config file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// TOML config file; every field is optional
#[derive(Debug, Default, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub page_size: Option<i64>,
    pub poll_interval_ms: Option<u64>,
    pub channel_buffer: Option<usize>,
    pub theme: Option<String>,
    pub level_colors: Option<bool>,
    pub timestamp_format: Option<String>,
    pub log_file: Option<PathBuf>,
}

/// Configuration for cml
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Lines per page, also the size of the live buffer
    pub page_size: PageSize,
    /// Live tail polling interval
    pub poll_interval: Duration,
    /// Capacity of the line-arrival channel
    pub channel_buffer: usize,
    /// Theme name (see `Theme::by_name`)
    pub theme: String,
    /// Whether to color lines by log level
    pub level_colors: bool,
    /// Output format for reformatted timestamps
    pub timestamp_format: String,
    /// Where tracing output goes
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: PageSize::default(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            channel_buffer: DEFAULT_CHANNEL_BUFFER,
            theme: "default".to_string(),
            level_colors: true,
            timestamp_format: INPUT_TIMESTAMP_FORMAT.to_string(),
            log_file: default_log_file(),
        }
    }
}

impl Config {
    /// Defaults, then the config file, then `CML_*` environment variables.
    ///
    /// A missing file at the default location is not an error; a missing
    /// file given explicitly is.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let path = explicit.map(Path::to_path_buf).or_else(default_config_path);
        if let Some(path) = path {
            match std::fs::read_to_string(&path) {
                Ok(text) => config.apply_file(parse_config_file(&text, &path)?),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound && explicit.is_none() => {}
                Err(source) => return Err(ConfigError::Read { path, source }),
            }
        }

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_file(&mut self, file: ConfigFile) {
        if let Some(size) = file.page_size {
            self.page_size = PageSize::new(size);
        }
        if let Some(ms) = file.poll_interval_ms {
            self.poll_interval = Duration::from_millis(ms.max(1));
        }
        if let Some(buffer) = file.channel_buffer {
            self.channel_buffer = buffer.max(1);
        }
        if let Some(theme) = file.theme {
            self.theme = theme;
        }
        if let Some(level_colors) = file.level_colors {
            self.level_colors = level_colors;
        }
        if let Some(format) = file.timestamp_format {
            self.set_timestamp_format(format);
        }
        if let Some(log_file) = file.log_file {
            self.log_file = log_file;
        }
    }

    /// Apply overrides looked up by variable name
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(size) = lookup("CML_PAGE_SIZE").and_then(|s| s.parse::<i64>().ok()) {
            self.page_size = PageSize::new(size);
        }
        if let Some(ms) = lookup("CML_POLL_INTERVAL_MS").and_then(|s| s.parse::<u64>().ok()) {
            self.poll_interval = Duration::from_millis(ms.max(1));
        }
        if let Some(theme) = lookup("CML_THEME") {
            self.theme = theme;
        }
        if let Some(format) = lookup("CML_TIMESTAMP_FORMAT") {
            self.set_timestamp_format(format);
        }
        if let Some(log_file) = lookup("CML_LOG_FILE") {
            self.log_file = PathBuf::from(log_file);
        }
    }

    /// Use `format` for timestamps unless chrono cannot render it
    pub fn set_timestamp_format(&mut self, format: String) {
        if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error))
            || render_timestamp(&NaiveDateTime::default(), &format).is_none()
        {
            warn!(format = %format, "invalid timestamp format, keeping {}", self.timestamp_format);
            return;
        }
        self.timestamp_format = format;
    }
}

pub fn parse_config_file(text: &str, path: &Path) -> Result<ConfigFile, ConfigError> {
    toml::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// `<config dir>/cml/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cml").join("config.toml"))
}

fn default_log_file() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("cml")
        .join("cml.log")
}
