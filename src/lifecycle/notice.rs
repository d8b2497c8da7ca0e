//! # Runtime notices emitted by the generator and click tasks.
//!
//! [`NoticeKind`] classifies notices across four groups:
//! - **Generation**: impression written/failed, click scheduled
//! - **Clicks**: delayed click written, failed or cancelled by shutdown
//! - **Shutdown**: shutdown requested, drained, grace exceeded, publisher closed/close failed
//! - **Subscribers**: overflow and panic reports from the fan-out workers
//!
//! [`Notice`] carries the metadata: timestamp, event key, destination, delay, reason.
//!
//! ## Ordering guarantees
//! Every notice gets a globally unique, monotonically increasing `seq`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use adsynth::{Notice, NoticeKind};
//!
//! let n = Notice::new(NoticeKind::ClickScheduled)
//!     .with_key("impr-abc")
//!     .with_delay(Duration::from_millis(1500));
//!
//! assert_eq!(n.kind, NoticeKind::ClickScheduled);
//! assert_eq!(n.key.as_deref(), Some("impr-abc"));
//! assert_eq!(n.delay_ms, Some(1500));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for notice ordering.
static NOTICE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    // === Subscriber notices ===
    /// Subscriber panicked while handling a notice.
    ///
    /// Sets: `key` (subscriber name), `reason` (panic message).
    SubscriberPanicked,

    /// Subscriber dropped a notice (queue full or worker closed).
    ///
    /// Sets: `key` (subscriber name), `reason` ("full" / "closed").
    SubscriberOverflow,

    // === Generation notices ===
    /// Generator entered the running state.
    ///
    /// Sets: `reason` (rate/probability summary).
    GeneratorStarted,

    /// Impression delivered to the publisher.
    ///
    /// Sets: `key` (impression id), `destination`.
    ImpressionWritten,

    /// Impression write failed (non-fatal).
    ///
    /// Sets: `key`, `destination`, `reason`.
    ImpressionFailed,

    /// A delayed click was registered for an impression.
    ///
    /// Sets: `key` (impression id), `delay_ms`.
    ClickScheduled,

    // === Click notices ===
    /// Delayed click delivered to the publisher.
    ///
    /// Sets: `key` (click id), `destination`, `delay_ms`.
    ClickWritten,

    /// Delayed click write failed (non-fatal).
    ///
    /// Sets: `key` (click id), `destination`, `reason`.
    ClickFailed,

    /// Shutdown was observed before the click delay elapsed; no click was written.
    ///
    /// Sets: `key` (impression id), `delay_ms`.
    ClickCanceled,

    // === Shutdown notices ===
    /// Shutdown observed; generator is draining.
    ///
    /// Sets: `in_flight` (registered click tasks at that instant).
    ShutdownRequested,

    /// Every registered click task finished.
    Drained,

    /// Drain grace period ran out with tasks outstanding.
    ///
    /// Sets: `in_flight`, `delay_ms` (the grace).
    GraceExceeded,

    /// Publisher released all destinations cleanly.
    PublisherClosed,

    /// A destination failed to close.
    ///
    /// Sets: `destination`, `reason`.
    CloseFailed,
}

/// Runtime notice with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`NoticeKind`]
#[derive(Clone, Debug)]
pub struct Notice {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Notice classification.
    pub kind: NoticeKind,

    /// Identity of the event (or subscriber) the notice is about.
    pub key: Option<Arc<str>>,
    /// Destination the event was routed to.
    pub destination: Option<Arc<str>>,
    /// Click delay or grace period in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Number of click tasks in flight.
    pub in_flight: Option<u64>,
}

impl Notice {
    /// Creates a notice of the given kind with current timestamp and next sequence number.
    pub fn new(kind: NoticeKind) -> Self {
        Self {
            seq: NOTICE_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            key: None,
            destination: None,
            delay_ms: None,
            reason: None,
            in_flight: None,
        }
    }

    /// Attaches the event (or subscriber) key.
    #[inline]
    pub fn with_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attaches the destination.
    #[inline]
    pub fn with_destination(mut self, destination: impl Into<Arc<str>>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// Attaches a delay (stored as milliseconds, saturating at `u32::MAX`).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the in-flight task count.
    #[inline]
    pub fn with_in_flight(mut self, n: usize) -> Self {
        self.in_flight = Some(n as u64);
        self
    }

    /// Creates a subscriber overflow notice.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Notice::new(NoticeKind::SubscriberOverflow)
            .with_key(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic notice.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Notice::new(NoticeKind::SubscriberPanicked)
            .with_key(subscriber)
            .with_reason(info)
    }
}
