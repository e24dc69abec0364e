use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{LineEvent, LineSource, LineStream, RawLine};
use crate::index::trim_line;

/// A line source that polls a file for appended lines, like `tail -F`.
///
/// Reads with its own handle, starting at `start`, and only emits lines once
/// their terminator has been written.
pub struct FileTail {
    path: PathBuf,
    start: u64,
    poll_interval: Duration,
    buffer: usize,
}

impl FileTail {
    pub fn new(path: PathBuf, start: u64, poll_interval: Duration, buffer: usize) -> Self {
        Self {
            path,
            start,
            poll_interval,
            buffer: buffer.max(1),
        }
    }
}

#[async_trait::async_trait]
impl LineSource for FileTail {
    async fn stream(&self) -> LineStream {
        let (tx, rx) = mpsc::channel(self.buffer);
        let path = self.path.clone();
        let start = self.start;
        let poll_interval = self.poll_interval;

        let handle = tokio::spawn(async move {
            if let Err(msg) = tail_file(&path, start, poll_interval, &tx).await {
                warn!(path = %path.display(), error = %msg, "live tail stopped");
                let _ = tx.send(LineEvent::Error(msg)).await;
            }
        });

        LineStream::new(rx, handle)
    }

    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Follow `path` from `position` until the receiver goes away or reading fails
async fn tail_file(
    path: &Path,
    mut position: u64,
    poll_interval: Duration,
    tx: &mpsc::Sender<LineEvent>,
) -> Result<(), String> {
    let mut file = File::open(path)
        .await
        .map_err(|e| format!("error opening log file {}: {}", path.display(), e))?;
    file.seek(SeekFrom::Start(position))
        .await
        .map_err(|e| format!("error seeking log file: {}", e))?;
    debug!(path = %path.display(), position, "live tail started");

    let mut reader = BufReader::new(file);
    let mut pending = Vec::new();

    loop {
        let read = reader
            .read_until(b'\n', &mut pending)
            .await
            .map_err(|e| format!("error reading log file: {}", e))?;

        if read == 0 || pending.last() != Some(&b'\n') {
            // At end of file, possibly holding a partial line
            let len = tokio::fs::metadata(path)
                .await
                .map_err(|e| format!("error reading log file: {}", e))?
                .len();
            if len < position + pending.len() as u64 {
                return Err(format!(
                    "log file was truncated or rotated (size {} < position {})",
                    len,
                    position + pending.len() as u64
                ));
            }

            tokio::select! {
                _ = tokio::time::sleep(poll_interval) => {}
                _ = tx.closed() => return Ok(()),
            }
            continue;
        }

        let len = pending.len() as u64;
        let text = String::from_utf8_lossy(trim_line(&pending)).into_owned();
        let line = RawLine {
            text,
            offset: position,
            len,
        };
        if tx.send(LineEvent::Line(line)).await.is_err() {
            // Receiver dropped
            return Ok(());
        }
        position += len;
        pending.clear();
    }
}
