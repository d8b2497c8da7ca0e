//! # Notice bus for broadcasting runtime notices.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking publishing from many sources (generator loop, click tasks, subscriber workers).
//!
//! ## Architecture
//! ```text
//! Publishers (many):                  Listener (one):
//!   Generator  ──┐
//!   Click task ──┼──────► Bus ───────► notice listener ────► SubscriberSet
//!   Click task ──┤  (broadcast chan)    (in Generator)
//!   Sub worker ──┘
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks.
//! - **Bounded capacity**: one ring buffer holds recent notices for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: notices are lost if nobody is subscribed at send time.

use tokio::sync::broadcast;

use super::notice::Notice;

/// Broadcast channel for runtime notices.
///
/// Cheap to clone; every clone publishes into the same channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Notice>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Notice>(capacity);
        Self { tx }
    }

    /// Publishes a notice to all active receivers.
    ///
    /// If there are no receivers the notice is dropped; this still returns immediately.
    pub fn publish(&self, notice: Notice) {
        let _ = self.tx.send(notice);
    }

    /// Creates a receiver that observes notices sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::NoticeKind;

    #[tokio::test]
    async fn receivers_only_see_later_notices() {
        let bus = Bus::new(0);
        bus.publish(Notice::new(NoticeKind::GeneratorStarted));

        let mut rx = bus.subscribe();
        bus.publish(Notice::new(NoticeKind::ShutdownRequested));

        let got = rx.recv().await.unwrap();
        assert_eq!(got.kind, NoticeKind::ShutdownRequested);
        assert!(rx.try_recv().is_err());
    }
}
