use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the indexing, paging and live-merge engine
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Opening, seeking, reading or writing a file failed
    #[error("{context} {path:?}: {source}")]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Seeking to or reading an indexed line failed
    #[error("error reading line at offset {offset}: {source}")]
    Read {
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    /// An indexed offset no longer points inside the file (rotated or truncated)
    #[error("offset {offset} is past the end of the file (was it rotated or truncated?)")]
    StaleOffset { offset: u64 },

    /// Requested page lies outside a non-empty index
    #[error("invalid page {page} (total pages: {total})")]
    InvalidPage { page: usize, total: usize },

    /// The line-arrival stream reported an error
    #[error("live tail failed: {0}")]
    Stream(String),

    /// The line-arrival stream ended
    #[error("live tail stream closed")]
    StreamClosed,
}

impl ViewerError {
    pub fn io(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ViewerError::Io {
            context,
            path: path.into(),
            source,
        }
    }

    /// Whether the session can keep running after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ViewerError::StaleOffset { .. } | ViewerError::Stream(_) | ViewerError::StreamClosed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_names_path_and_cause() {
        let err = ViewerError::io(
            "unable to open",
            "/var/log/app.log",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        let msg = err.to_string();
        assert!(msg.contains("unable to open"));
        assert!(msg.contains("/var/log/app.log"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(ViewerError::StaleOffset { offset: 10 }.is_recoverable());
        assert!(ViewerError::StreamClosed.is_recoverable());
        assert!(ViewerError::Stream("boom".to_string()).is_recoverable());
        assert!(!ViewerError::InvalidPage { page: 3, total: 2 }.is_recoverable());
        let read = ViewerError::Read {
            offset: 4,
            source: std::io::Error::other("bad sector"),
        };
        assert!(!read.is_recoverable());
    }
}
