use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, Stdout};
use tokio::sync::Mutex;

use crate::error::PublishError;
use crate::publisher::writer::DestinationWriter;

/// Dry-run writer: one line per message, `destination<TAB>key<TAB>value`.
///
/// Lines from concurrent sends never interleave; each send holds the stdout lock for one
/// whole line.
pub struct StdoutWriter {
    destination: String,
    out: Mutex<Stdout>,
    closed: AtomicBool,
}

impl StdoutWriter {
    /// Creates a writer that prefixes its lines with `destination`.
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            out: Mutex::new(tokio::io::stdout()),
            closed: AtomicBool::new(false),
        }
    }

    fn line(&self, key: &[u8], value: &[u8]) -> Vec<u8> {
        let mut line = Vec::with_capacity(self.destination.len() + key.len() + value.len() + 3);
        line.extend_from_slice(self.destination.as_bytes());
        line.push(b'\t');
        line.extend_from_slice(key);
        line.push(b'\t');
        line.extend_from_slice(value);
        line.push(b'\n');
        line
    }
}

#[async_trait]
impl DestinationWriter for StdoutWriter {
    async fn send(&self, key: &[u8], value: Vec<u8>) -> Result<(), PublishError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PublishError::Closed {
                destination: self.destination.clone(),
            });
        }
        let line = self.line(key, &value);
        let mut out = self.out.lock().await;
        out.write_all(&line)
            .await
            .map_err(|e| PublishError::transport(&self.destination, e))
    }

    async fn close(&self) -> Result<(), PublishError> {
        self.closed.store(true, Ordering::SeqCst);
        self.out
            .lock()
            .await
            .flush()
            .await
            .map_err(|e| PublishError::transport(&self.destination, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_is_tab_separated() {
        let w = StdoutWriter::new("clicks");
        assert_eq!(w.line(b"click-1", b"{}"), b"clicks\tclick-1\t{}\n".to_vec());
    }

    #[tokio::test]
    async fn send_after_close_is_rejected() {
        let w = StdoutWriter::new("clicks");
        w.close().await.unwrap();
        let err = w.send(b"k", b"{}".to_vec()).await.unwrap_err();
        assert!(matches!(err, PublishError::Closed { .. }));
    }
}
