//! # In-process destination writer.
//!
//! [`MemoryWriter`] records every message it accepts. Clones share the same record log, so a
//! test can keep one handle while the publisher owns another. Failure injection covers the
//! publisher contract: failing sends, failing close, and slow sends for cancellation.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::PublishError;
use crate::publisher::writer::DestinationWriter;

/// One accepted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Identity key bytes.
    pub key: Vec<u8>,
    /// Encoded body.
    pub value: Vec<u8>,
}

#[derive(Debug, Default)]
struct State {
    records: Mutex<Vec<Record>>,
    attempts: AtomicUsize,
    closed: AtomicBool,
}

/// Recording writer with failure injection.
#[derive(Debug, Clone)]
pub struct MemoryWriter {
    name: Arc<str>,
    state: Arc<State>,
    latency: Option<Duration>,
    fail_sends: Option<Arc<str>>,
    fail_close: Option<Arc<str>>,
}

impl Default for MemoryWriter {
    fn default() -> Self {
        Self::named("memory")
    }
}

impl MemoryWriter {
    /// Creates an empty, healthy writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer whose errors mention `name`.
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            state: Arc::default(),
            latency: None,
            fail_sends: None,
            fail_close: None,
        }
    }

    /// Every send waits `latency` before completing.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Every send fails with a transport error carrying `reason`.
    pub fn failing_sends(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.fail_sends = Some(reason.into());
        self
    }

    /// `close` fails with a transport error carrying `reason` (the writer still closes).
    pub fn failing_close(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.fail_close = Some(reason.into());
        self
    }

    /// Snapshot of accepted messages, in acceptance order.
    pub fn records(&self) -> Vec<Record> {
        self.state
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of `send` calls that reached this writer, successful or not.
    pub fn send_attempts(&self) -> usize {
        self.state.attempts.load(Ordering::SeqCst)
    }

    /// True once `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DestinationWriter for MemoryWriter {
    async fn send(&self, key: &[u8], value: Vec<u8>) -> Result<(), PublishError> {
        self.state.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.is_closed() {
            return Err(PublishError::Closed {
                destination: self.name.to_string(),
            });
        }
        if let Some(reason) = &self.fail_sends {
            return Err(PublishError::transport(self.name.as_ref(), reason));
        }
        self.state
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Record {
                key: key.to_vec(),
                value,
            });
        Ok(())
    }

    async fn close(&self) -> Result<(), PublishError> {
        self.state.closed.store(true, Ordering::SeqCst);
        match &self.fail_close {
            Some(reason) => Err(PublishError::transport(self.name.as_ref(), reason)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_records() {
        let a = MemoryWriter::new();
        let b = a.clone();
        a.send(b"k", b"v".to_vec()).await.unwrap();
        assert_eq!(
            b.records(),
            vec![Record {
                key: b"k".to_vec(),
                value: b"v".to_vec()
            }]
        );
    }

    #[tokio::test]
    async fn failing_sends_record_nothing() {
        let w = MemoryWriter::named("impressions").failing_sends("leader not available");
        let err = w.send(b"k", b"v".to_vec()).await.unwrap_err();
        assert!(err.to_string().contains("leader not available"));
        assert_eq!(w.send_attempts(), 1);
        assert!(w.records().is_empty());
    }
}
