//! Line-arrival sources for live mode.
//!
//! A source runs as a background task and pushes raw lines over a channel to
//! the event loop. It never touches the session's file handle or index.

pub mod file;
pub mod stream;

pub use file::FileTail;
pub use stream::LineStream;

/// A newly appended line as read by a source
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawLine {
    /// Line text without its terminator
    pub text: String,
    /// Where the source read the line from
    pub offset: u64,
    /// Bytes consumed, terminator included
    pub len: u64,
}

impl RawLine {
    /// Build a line the way a file source would report it at `offset`
    #[cfg(test)]
    pub fn at(offset: u64, text: impl Into<String>) -> Self {
        let text = text.into();
        let len = text.len() as u64 + 1;
        Self { text, offset, len }
    }
}

/// Events emitted by line sources
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineEvent {
    Line(RawLine),
    Error(String),
}

/// Trait for line sources
#[async_trait::async_trait]
pub trait LineSource: Send + Sync {
    /// Start streaming line events
    async fn stream(&self) -> LineStream;

    /// Get the display name for this source
    fn name(&self) -> String;
}
