//! Receiving end of a running line source.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::LineEvent;

/// Receiver for one source plus the task producing into it.
///
/// Dropping the stream aborts the producer, so every exit path of the event
/// loop also stops the background tail.
pub struct LineStream {
    rx: mpsc::Receiver<LineEvent>,
    handle: Option<JoinHandle<()>>,
}

impl LineStream {
    pub fn new(rx: mpsc::Receiver<LineEvent>, handle: JoinHandle<()>) -> Self {
        Self {
            rx,
            handle: Some(handle),
        }
    }

    /// A stream fed directly through a channel, with no producer task
    #[cfg(test)]
    pub fn from_receiver(rx: mpsc::Receiver<LineEvent>) -> Self {
        Self { rx, handle: None }
    }

    /// Next event; `None` once the producer is gone and the channel drained
    pub async fn recv(&mut self) -> Option<LineEvent> {
        self.rx.recv().await
    }

    /// Stop the producer and close the channel
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.rx.close();
    }
}

impl Drop for LineStream {
    fn drop(&mut self) {
        // Abort the spawned task so the file handle is released
        self.shutdown();
    }
}
