//! # Non-blocking notice fan-out to multiple subscribers.
//!
//! ## Architecture
//! ```text
//! emit(notice)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► subscriber1.on_notice()
//!     │    (bounded)         └──────► panic → SubscriberPanicked
//!     ├──► [queue 2] ──► worker 2 ──► subscriber2.on_notice()
//!     │    (bounded)
//!     └──► [queue N] ──► worker N ──► subscriberN.on_notice()
//! ```
//!
//! ## Rules
//! - **Non-blocking**: `emit()` returns immediately (uses `try_send`)
//! - **Overflow**: notice dropped for that subscriber only, `SubscriberOverflow` published
//! - **Isolation**: a slow or panicking subscriber doesn't affect others
//! - **Per-subscriber FIFO**: each subscriber sees notices in order
//!
//! **Warning**: workers wrap handlers in `AssertUnwindSafe`; a subscriber that panics while
//! holding a lock can leave its own state inconsistent.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::lifecycle::{Bus, Notice, NoticeKind};
use crate::subscribers::Subscribe;

struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Notice>>,
}

/// Fan-out coordinator for notice subscribers.
///
/// Every subscriber gets its own bounded queue and worker task.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker task per subscriber.
    ///
    /// Must be called inside a tokio runtime. Minimum queue capacity is 1.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let cap = sub.queue_capacity().max(1);
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Notice>>(cap);
            let bus_for_worker = bus.clone();

            let handle = tokio::spawn(async move {
                while let Some(notice) = rx.recv().await {
                    let fut = sub.on_notice(notice.as_ref());

                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await
                    {
                        let any = &*panic_err;
                        let info = if let Some(msg) = any.downcast_ref::<&'static str>() {
                            (*msg).to_string()
                        } else if let Some(msg) = any.downcast_ref::<String>() {
                            msg.clone()
                        } else {
                            "unknown panic".to_string()
                        };
                        bus_for_worker.publish(Notice::subscriber_panicked(sub.name(), info));
                    }
                }
            });
            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }
        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Number of subscribers in the set.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// True when no subscriber is registered.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Emits a notice to all subscribers without awaiting them.
    ///
    /// A full or closed queue drops the notice for that subscriber and publishes
    /// `SubscriberOverflow`, unless the notice is itself an overflow report.
    pub fn emit(&self, notice: Notice) {
        let is_overflow = matches!(notice.kind, NoticeKind::SubscriberOverflow);
        let notice = Arc::new(notice);

        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(&notice)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    if !is_overflow {
                        self.bus
                            .publish(Notice::subscriber_overflow(channel.name, "full"));
                    }
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    if !is_overflow {
                        self.bus
                            .publish(Notice::subscriber_overflow(channel.name, "closed"));
                    }
                }
            }
        }
    }

    /// Gracefully shuts down all subscriber workers.
    ///
    /// Drops the queue senders, then awaits every worker so queued notices are handled.
    pub async fn shutdown(self) {
        drop(self.channels);

        for h in self.workers {
            let _ = h.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<NoticeKind>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_notice(&self, notice: &Notice) {
            self.seen.lock().unwrap().push(notice.kind);
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct Exploder;

    #[async_trait]
    impl Subscribe for Exploder {
        async fn on_notice(&self, _notice: &Notice) {
            panic!("boom");
        }

        fn name(&self) -> &'static str {
            "exploder"
        }
    }

    #[tokio::test]
    async fn delivers_in_order_and_flushes_on_shutdown() {
        let bus = Bus::new(16);
        let rec = Arc::new(Recorder::default());
        let subs: Vec<Arc<dyn Subscribe>> = vec![rec.clone()];
        let set = SubscriberSet::new(subs, bus);

        set.emit(Notice::new(NoticeKind::GeneratorStarted));
        set.emit(Notice::new(NoticeKind::ImpressionWritten));
        set.emit(Notice::new(NoticeKind::Drained));
        set.shutdown().await;

        assert_eq!(
            *rec.seen.lock().unwrap(),
            vec![
                NoticeKind::GeneratorStarted,
                NoticeKind::ImpressionWritten,
                NoticeKind::Drained
            ]
        );
    }

    #[tokio::test]
    async fn panicking_subscriber_is_reported_and_isolated() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let rec = Arc::new(Recorder::default());
        let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Exploder), rec.clone()];
        let set = SubscriberSet::new(subs, bus);

        set.emit(Notice::new(NoticeKind::ClickWritten));
        set.shutdown().await;

        let reported = rx.recv().await.unwrap();
        assert_eq!(reported.kind, NoticeKind::SubscriberPanicked);
        assert_eq!(reported.key.as_deref(), Some("exploder"));
        assert_eq!(*rec.seen.lock().unwrap(), vec![NoticeKind::ClickWritten]);
    }
}
